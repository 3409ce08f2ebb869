pub mod pdf;

use std::path::Path;

use crate::error::ExtractError;

pub use pdf::PdfTextSource;

/// Default character budget for extracted document text.
pub const DEFAULT_MAX_CHARS: usize = 8000;

/// Document formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Turns an uploaded artifact into plain text.
///
/// Implementations are read-only with respect to the artifact.
pub trait TextSource: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Truncates `text` to at most `max_chars` characters.
///
/// Counts Unicode scalar values, so a multi-byte character is never split,
/// though a word or grapheme cluster may be.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
