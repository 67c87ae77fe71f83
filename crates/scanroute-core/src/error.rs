//! Error types for the scanroute-core library.

use thiserror::Error;

/// Main error type for the scanroute library.
#[derive(Error, Debug)]
pub enum ScanrouteError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR tool invocation error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanrouteError {
    /// Whether the error may clear up if the same file is tried again shortly.
    ///
    /// Only I/O errors qualify (a file vanishing or locked mid-batch). An
    /// undecodable image stays undecodable.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanrouteError::Io(_))
    }
}

/// Errors related to PDF reading and writing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the embedded text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to write a PDF document.
    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// Errors related to the external OCR tools.
#[derive(Error, Debug)]
pub enum OcrError {
    /// A required tool could not be located.
    #[error("tool not found: {0}")]
    ToolMissing(String),

    /// A tool ran but exited unsuccessfully.
    #[error("{tool} failed: {stderr}")]
    Command { tool: String, stderr: String },

    /// Rasterising a PDF page failed.
    #[error("failed to render page: {0}")]
    Render(String),
}

/// Errors raised while loading configuration. These are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment override holds a value of the wrong shape.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Result type for the scanroute library.
pub type Result<T> = std::result::Result<T, ScanrouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_io_errors_are_transient() {
        let io = ScanrouteError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.is_transient());

        let decode = ScanrouteError::from(image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            ),
        ));
        assert!(!decode.is_transient());

        let ocr = ScanrouteError::from(OcrError::ToolMissing("tesseract".into()));
        assert!(!ocr.is_transient());
    }
}
