pub mod pdf;

use serde::Serialize;
use thiserror::Error;

/// Extraction errors, surfaced to the UI as status messages
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("not a PDF file: {0}")]
    NotAPdf(String),

    #[error("failed to load PDF: {0}")]
    Load(String),

    #[error("document is encrypted")]
    Encrypted,

    #[error("no extractable text in the document")]
    NoText,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Text pulled out of a PDF, ready for the editor pane
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub page_count: usize,
    pub text: String,
}

impl ExtractedDocument {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
