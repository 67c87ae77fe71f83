//! Classification and output naming. Consults no filesystem state.

use std::path::Path;

use crate::fields::rules::patterns::UNSAFE_FILENAME_CHARS;
use crate::models::document::{Classification, DocumentFields, RoutingDecision};

use super::namer::split_filename;

/// Extensions converted to PDF when routed to an indexed folder.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions accepted into the scan folder.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Whether `filename` names an image that must be converted.
pub fn is_image(filename: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension_of(filename).as_str())
}

/// Whether `filename` has a recognised document extension.
pub fn is_supported(filename: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(filename).as_str())
}

/// Remove `\ / : * ? " < > |` from `s`.
pub fn sanitize(s: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(s, "").into_owned()
}

/// Decide class, folder and desired filename for a source file.
///
/// Failed documents keep their original name. Indexed documents are renamed
/// from their fields; images get a `.pdf` extension, other files keep theirs.
pub fn decide(filename: &str, fields: &DocumentFields) -> RoutingDecision {
    let classification = Classification::from_fields(fields);
    let destination = classification.destination();
    let image = is_image(filename);

    let (_, original_ext) = split_filename(filename);
    let ext = if image { ".pdf" } else { original_ext };

    let desired_filename = match &classification {
        Classification::Fully { name, account } => {
            format!("{}_{}{}", sanitize(name), sanitize(account), ext)
        }
        Classification::Partial { value, .. } => format!("{}{}", sanitize(value), ext),
        Classification::Failed => filename.to_string(),
    };

    RoutingDecision {
        convert_to_pdf: image && classification != Classification::Failed,
        classification,
        destination,
        desired_filename,
    }
}
