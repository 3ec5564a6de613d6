pub mod prompts;
pub mod service;
pub mod text;

pub use service::ResumeExtractionService;
pub use text::{PdfTextExtractor, TextError, TextExtractor};
