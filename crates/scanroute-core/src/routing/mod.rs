//! Routing: classification, destination naming, and the move/convert step.

mod convert;
mod decision;
mod executor;
mod namer;

pub use convert::{convert_image_to_pdf, image_to_pdf_bytes};
pub use decision::{decide, is_image, is_supported, sanitize, IMAGE_EXTENSIONS, SUPPORTED_EXTENSIONS};
pub use executor::{move_with_retry, Executor, MoveReport, Placement, RetryPolicy};
pub use namer::{resolve, split_filename};

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::fields::FieldParser;
use crate::models::config::PathsConfig;
use crate::models::document::{Destination, DocumentFields, RoutingOutcome};

/// The three output folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub fully_indexed: PathBuf,
    pub partially_indexed: PathBuf,
    pub failed: PathBuf,
}

impl OutputDirs {
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self {
            fully_indexed: paths.fully_indexed_dir.clone(),
            partially_indexed: paths.partial_indexed_dir.clone(),
            failed: paths.failed_dir.clone(),
        }
    }

    pub fn dir_for(&self, destination: Destination) -> &Path {
        match destination {
            Destination::FullyIndexed => &self.fully_indexed,
            Destination::PartiallyIndexed => &self.partially_indexed,
            Destination::Failed => &self.failed,
        }
    }
}

/// Turns extracted text into a [`RoutingOutcome`] with a free filename.
pub struct Router {
    parser: FieldParser,
    dirs: OutputDirs,
}

impl Router {
    pub fn new(dirs: OutputDirs) -> Self {
        Self {
            parser: FieldParser::new(),
            dirs,
        }
    }

    pub fn dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    pub fn parser(&self) -> &FieldParser {
        &self.parser
    }

    /// Parse `text` and plan where `source` goes.
    pub fn route(&self, source: &Path, text: &str, image: Option<&DynamicImage>) -> RoutingOutcome {
        let fields = self.parser.parse(text, image);
        self.plan(source, &fields)
    }

    /// Plan where `source` goes given already-parsed fields.
    ///
    /// The desired name is resolved against the destination folder here,
    /// immediately before the executor writes.
    pub fn plan(&self, source: &Path, fields: &DocumentFields) -> RoutingOutcome {
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let decision = decide(&filename, fields);
        let destination_dir = self.dirs.dir_for(decision.destination).to_path_buf();
        let final_filename = resolve(&destination_dir, &decision.desired_filename);

        RoutingOutcome {
            source: source.to_path_buf(),
            classification: decision.classification,
            destination: decision.destination,
            destination_dir,
            final_filename,
            convert_to_pdf: decision.convert_to_pdf,
        }
    }
}
