//! OCR through the `tesseract` and `pdftoppm` command-line tools.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use super::pdf_layer::PdfTextLayer;
use super::TextExtractor;
use crate::error::{OcrError, Result};
use crate::models::config::OcrConfig;
use crate::routing::is_image;

/// Locate a tool: the configured path if it exists, else a `PATH` lookup.
fn locate_tool(configured: &Path, name: &str) -> Option<PathBuf> {
    if configured.is_file() {
        return Some(configured.to_path_buf());
    }
    let fallback = configured
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    which::which(fallback).ok()
}

/// Availability of the external tools.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub tesseract: Option<PathBuf>,
    pub pdftoppm: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_ready(&self) -> bool {
        self.tesseract.is_some() && self.pdftoppm.is_some()
    }
}

/// Check which OCR tools resolve under `config`.
pub fn check_tools(config: &OcrConfig) -> ToolStatus {
    ToolStatus {
        tesseract: locate_tool(&config.tesseract_cmd, "tesseract"),
        pdftoppm: locate_tool(&config.poppler_path.join("pdftoppm"), "pdftoppm"),
    }
}

/// Text extractor backed by tesseract, with a PDF text-layer shortcut.
pub struct TesseractExtractor {
    config: OcrConfig,
}

impl TesseractExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    fn try_extract(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if is_image(&filename) {
            self.ocr_image(path)
        } else {
            self.ocr_pdf(path)
        }
    }

    fn tesseract(&self) -> Result<PathBuf> {
        locate_tool(&self.config.tesseract_cmd, "tesseract").ok_or_else(|| {
            OcrError::ToolMissing(self.config.tesseract_cmd.display().to_string()).into()
        })
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String> {
        let output = Command::new(self.tesseract()?)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .output()?;

        if !output.status.success() {
            return Err(OcrError::Command {
                tool: "tesseract".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// The PDF's own text, if it parses and holds enough of it.
    fn embedded_text(&self, path: &Path) -> Option<String> {
        let data = std::fs::read(path).ok()?;
        match PdfTextLayer::load(&data) {
            Ok(layer) => layer.substantial_text(self.config.min_text_length),
            Err(e) => {
                debug!("No usable text layer in {}, rendering: {}", path.display(), e);
                None
            }
        }
    }

    fn ocr_pdf(&self, path: &Path) -> Result<String> {
        if self.config.prefer_embedded_text {
            if let Some(text) = self.embedded_text(path) {
                debug!("Using embedded text layer of {}", path.display());
                return Ok(text);
            }
        }

        let pdftoppm = locate_tool(&self.config.poppler_path.join("pdftoppm"), "pdftoppm")
            .ok_or_else(|| OcrError::ToolMissing("pdftoppm".to_string()))?;
        let render_dir = tempfile::tempdir()?;
        let prefix = render_dir.path().join("page");

        let mut cmd = Command::new(pdftoppm);
        cmd.arg("-r").arg(self.config.dpi.to_string()).arg("-png");
        if self.config.max_pages > 0 {
            cmd.arg("-f").arg("1").arg("-l").arg(self.config.max_pages.to_string());
        }
        let output = cmd.arg(path).arg(&prefix).output()?;
        if !output.status.success() {
            return Err(OcrError::Render(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
            .into());
        }

        // pdftoppm pads page numbers to equal width, so name order is page order
        let mut pages: Vec<PathBuf> = std::fs::read_dir(render_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == "png"))
            .collect();
        pages.sort();

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            texts.push(self.ocr_image(page)?);
        }
        Ok(texts.join("\n"))
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, path: &Path) -> String {
        let start = Instant::now();
        match self.try_extract(path) {
            Ok(text) => {
                debug!(
                    "Extracted {} chars from {} in {}ms",
                    text.len(),
                    path.display(),
                    start.elapsed().as_millis()
                );
                text
            }
            Err(e) => {
                warn!("Text extraction failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}
