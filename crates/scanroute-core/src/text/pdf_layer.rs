//! Embedded PDF text layer extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A loaded PDF whose text layer can be read.
pub struct PdfTextLayer {
    raw_data: Vec<u8>,
    page_count: u32,
}

impl PdfTextLayer {
    /// Load a PDF from bytes, decrypting empty-password documents.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|_| PdfError::Parse("document is encrypted".to_string()))?;
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len() as u32;
        debug!("Loaded PDF with {} pages", page_count);

        Ok(Self {
            raw_data,
            page_count,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Text of every page.
    pub fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Text layer if it has at least `min_chars` non-whitespace characters.
    pub fn substantial_text(&self, min_chars: usize) -> Option<String> {
        let text = self.extract_text().ok()?;
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        (visible >= min_chars.max(1)).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            PdfTextLayer::load(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_image_only_pdf_has_no_substantial_text() {
        let image = image::DynamicImage::new_rgb8(8, 8);
        let bytes = crate::routing::image_to_pdf_bytes(&image, 72).unwrap();

        let layer = PdfTextLayer::load(&bytes).unwrap();
        assert_eq!(layer.page_count(), 1);
        assert_eq!(layer.substantial_text(10), None);
    }
}
