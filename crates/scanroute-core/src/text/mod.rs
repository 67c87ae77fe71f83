//! Text extraction collaborators.

mod pdf_layer;
#[cfg(feature = "native")]
mod tesseract;

pub use pdf_layer::PdfTextLayer;
#[cfg(feature = "native")]
pub use tesseract::{check_tools, TesseractExtractor, ToolStatus};

use std::path::Path;

/// Produces raw text for a document.
///
/// Implementations must not fail: on any internal error they log and return
/// an empty string, which routes the document to the failed folder.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> String;
}

impl<F> TextExtractor for F
where
    F: Fn(&Path) -> String + Send + Sync,
{
    fn extract(&self, path: &Path) -> String {
        self(path)
    }
}
