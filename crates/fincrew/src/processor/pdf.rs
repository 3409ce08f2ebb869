use std::path::Path;

use crate::error::ExtractError;
use crate::processor::{truncate_chars, DocumentFormat, TextSource, DEFAULT_MAX_CHARS};

/// Extracts embedded text from PDF files using lopdf.
pub struct PdfTextSource {
    max_chars: usize,
}

impl PdfTextSource {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for PdfTextSource {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl TextSource for PdfTextSource {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Pdf) => {}
            None => {
                let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                return Err(ExtractError::UnsupportedFormat(extension.to_string()));
            }
        }

        let pdf_bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractError::NotFound(path.to_path_buf()),
            _ => ExtractError::ExtractionFailed(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )),
        })?;

        let doc = lopdf::Document::load_mem(&pdf_bytes)
            .map_err(|e| ExtractError::ExtractionFailed(format!("Failed to load PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(ExtractError::ExtractionFailed(
                "PDF is encrypted".to_string(),
            ));
        }

        let text = extract_text_from_pdf(&doc);
        let total_chars = text.chars().count();
        if total_chars > self.max_chars {
            log::debug!(
                "Truncating extracted text from {} to {} characters",
                total_chars,
                self.max_chars
            );
        }

        Ok(truncate_chars(&text, self.max_chars).to_string())
    }
}

/// Concatenates the text of every page, one trailing newline per page.
/// Pages whose content cannot be decoded contribute nothing.
fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                log::warn!("Skipping page {}: {}", page_num, e);
            }
        }
    }

    text
}
