pub mod prompts;
pub mod service;

pub use service::{QuestionGenerationService, QuestionSet};
