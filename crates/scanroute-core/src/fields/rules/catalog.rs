//! Recognised field labels and the blacklist of values that can never be
//! accepted as a field.

use std::collections::HashSet;

use lazy_static::lazy_static;

use super::normalize::normalize;
use crate::models::document::{LabelKind, LabelSpec};

/// Every recognised label. Order matters: earlier labels win.
pub static LABELS: &[LabelSpec] = &[
    LabelSpec::name("Name of Account Holder"),
    LabelSpec::name("Account Holder Name"),
    LabelSpec::name("Full Names"),
    LabelSpec::name("Full Name"),
    LabelSpec::name("Print Name"),
    LabelSpec::name("Surname"),
    LabelSpec::name("First Names"),
    LabelSpec::name("Institution Name"),
    LabelSpec::name("Client Name"),
    LabelSpec::name("Investor Name"),
    LabelSpec::account("Account Number"),
    LabelSpec::account("Account No"),
    LabelSpec::account("CSD Account Number"),
    LabelSpec::account("CSD Number"),
    LabelSpec::account("Investor Number"),
    LabelSpec::account("ID Number"),
    LabelSpec::account("Identity Number"),
];

/// Generic and structural words that are never a field value.
static NOISE_WORDS: &[&str] = &[
    // folder states
    "failed", "partial", "partially", "indexed", "fully", "fullyindexed",
    "partiallyindexed", "incoming", "incomingscan", "scan", "debug", "logs",
    // stopwords
    "a", "an", "the", "of", "and", "or", "for", "to", "in", "on", "by", "at", "is",
    // file types
    "pdf", "png", "jpg", "jpeg", "image", "file", "document",
    // form boilerplate
    "name", "names", "number", "no", "account", "holder", "id", "identity",
    "signature", "signed", "date", "form", "page", "please", "print", "here",
    "details", "client", "investor", "institution", "surname",
];

lazy_static! {
    /// Normalized labels of both groups plus the normalized noise words.
    pub static ref BLACKLIST: HashSet<String> = LABELS
        .iter()
        .map(|label| normalize(label.text))
        .chain(NOISE_WORDS.iter().map(|word| normalize(word)))
        .collect();
}

/// Labels of one group, in catalog order.
pub fn labels_of(kind: LabelKind) -> impl Iterator<Item = &'static LabelSpec> {
    LABELS.iter().filter(move |label| label.kind == kind)
}

/// Whether `candidate` normalizes to a blacklisted token.
pub fn is_blacklisted(candidate: &str) -> bool {
    BLACKLIST.contains(&normalize(candidate))
}
