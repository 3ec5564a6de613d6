//! PDF text extraction: the only stage that touches raw bytes.
//!
//! Failures here are never retried: a file that cannot be read now will not be
//! readable on the next attempt either.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AnalysisError;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ENCRYPT_MARKER: &[u8] = b"/Encrypt";

#[derive(Debug, Error, PartialEq)]
pub enum TextError {
    /// Malformed, encrypted or text-less PDF.
    #[error("{0}")]
    Unreadable(String),

    /// Input the core refuses to look at: empty or over the size ceiling.
    #[error("{0}")]
    Rejected(String),
}

impl From<TextError> for AnalysisError {
    fn from(e: TextError) -> Self {
        match e {
            TextError::Unreadable(msg) => AnalysisError::UnreadablePdf(msg),
            TextError::Rejected(msg) => AnalysisError::RejectedInput(msg),
        }
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, pdf: Bytes) -> Result<String, TextError>;
}

/// `pdf-extract` backed extractor. Parsing runs on the blocking pool.
pub struct PdfTextExtractor {
    max_bytes: usize,
}

impl PdfTextExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Cheap checks that reject a file before any parsing happens.
    fn precheck(&self, pdf: &[u8]) -> Result<(), TextError> {
        if pdf.is_empty() {
            return Err(TextError::Rejected("PDF is empty".to_string()));
        }
        if pdf.len() > self.max_bytes {
            return Err(TextError::Rejected(format!(
                "PDF is {} bytes, limit is {}",
                pdf.len(),
                self.max_bytes
            )));
        }
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(TextError::Unreadable(
                "file does not start with a PDF header".to_string(),
            ));
        }
        if contains(pdf, ENCRYPT_MARKER) {
            return Err(TextError::Unreadable("PDF is encrypted".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, pdf: Bytes) -> Result<String, TextError> {
        self.precheck(&pdf)?;

        let size = pdf.len();
        // pdf-extract can panic on malformed input; a panic surfaces as a JoinError.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
            .await
            .map_err(|e| TextError::Unreadable(format!("PDF parser aborted: {e}")))?
            .map_err(|e| TextError::Unreadable(format!("PDF extraction error: {e}")))?;

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(TextError::Unreadable(
                "no text could be extracted from the PDF".to_string(),
            ));
        }

        debug!(bytes = size, chars = text.len(), "extracted text from PDF");
        Ok(text)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Trims every line and collapses runs of blank lines to one.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run {
                out.push('\n');
            }
        }
        blank_run = false;
        out.push_str(line.trim_start());
    }
    out
}
