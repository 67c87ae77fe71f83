//! Document routing data model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Semantic group a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Caption preceding a person or institution name.
    Name,
    /// Caption preceding an account or identity number.
    Account,
}

/// A recognised field caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LabelSpec {
    /// Caption as printed on forms.
    pub text: &'static str,
    /// Which field the caption introduces.
    pub kind: LabelKind,
}

impl LabelSpec {
    pub const fn name(text: &'static str) -> Self {
        Self {
            text,
            kind: LabelKind::Name,
        }
    }

    pub const fn account(text: &'static str) -> Self {
        Self {
            text,
            kind: LabelKind::Account,
        }
    }
}

/// An accepted field value and the label it followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    /// Extracted value, tokens joined by single spaces.
    pub value: String,
    /// Label whose occurrence produced the value.
    pub label: LabelSpec,
}

/// Name and account matches found in one document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentFields {
    pub name: Option<FieldMatch>,
    pub account: Option<FieldMatch>,
}

impl DocumentFields {
    /// Whether neither field was found.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.account.is_none()
    }
}

/// Which field a partial classification was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialSource {
    Name,
    Account,
}

/// Outcome class of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// Both a name and an account number were extracted.
    Fully { name: String, account: String },
    /// Exactly one field was extracted.
    Partial { value: String, source: PartialSource },
    /// Nothing usable was extracted.
    Failed,
}

impl Classification {
    /// Classify from extracted fields.
    pub fn from_fields(fields: &DocumentFields) -> Self {
        match (&fields.name, &fields.account) {
            (Some(name), Some(account)) => Classification::Fully {
                name: name.value.clone(),
                account: account.value.clone(),
            },
            (Some(name), None) => Classification::Partial {
                value: name.value.clone(),
                source: PartialSource::Name,
            },
            (None, Some(account)) => Classification::Partial {
                value: account.value.clone(),
                source: PartialSource::Account,
            },
            (None, None) => Classification::Failed,
        }
    }

    /// Destination folder for this class.
    pub fn destination(&self) -> Destination {
        match self {
            Classification::Fully { .. } => Destination::FullyIndexed,
            Classification::Partial { .. } => Destination::PartiallyIndexed,
            Classification::Failed => Destination::Failed,
        }
    }
}

/// Logical output folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    FullyIndexed,
    PartiallyIndexed,
    Failed,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::FullyIndexed => "fully_indexed",
            Destination::PartiallyIndexed => "partially_indexed",
            Destination::Failed => "failed",
        }
    }
}

/// Pure routing decision: no filesystem state consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub classification: Classification,
    pub destination: Destination,
    /// Filename before collision resolution.
    pub desired_filename: String,
    /// The source is an image that must be written out as a PDF.
    pub convert_to_pdf: bool,
}

/// A decision bound to a source file and a free name in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingOutcome {
    pub source: PathBuf,
    pub classification: Classification,
    pub destination: Destination,
    pub destination_dir: PathBuf,
    pub final_filename: String,
    pub convert_to_pdf: bool,
}

impl RoutingOutcome {
    /// Full path the document will be written to.
    pub fn destination_path(&self) -> PathBuf {
        self.destination_dir.join(&self.final_filename)
    }
}
