//! Core library for routing scanned documents.
//!
//! This crate provides:
//! - Text extraction collaborators (tesseract, PDF text layer)
//! - Label-driven name and account field extraction
//! - Classification into fully / partially indexed or failed
//! - Collision-safe naming and the move/convert step
//! - The batch pipeline tying these together

pub mod error;
pub mod fields;
pub mod models;
pub mod pipeline;
pub mod routing;
pub mod text;

pub use error::{ConfigError, OcrError, PdfError, Result, ScanrouteError};
pub use fields::{FieldExtractor, FieldParser};
pub use models::config::{Profile, ScanrouteConfig};
pub use models::document::{
    Classification, Destination, DocumentFields, FieldMatch, LabelKind, LabelSpec, RoutingDecision,
    RoutingOutcome,
};
pub use pipeline::{scan_candidates, BatchReport, FileReport, Pipeline, Preview};
pub use routing::{Executor, OutputDirs, Placement, RetryPolicy, Router};
pub use text::TextExtractor;
#[cfg(feature = "native")]
pub use text::{check_tools, TesseractExtractor, ToolStatus};
