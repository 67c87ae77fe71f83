//! Name field extraction: the words following a name label.

use super::catalog::{labels_of, BLACKLIST};
use super::normalize::normalize;
use super::patterns::NAME_LABEL;
use super::{is_acceptable_value, FieldExtractor};
use crate::models::document::{FieldMatch, LabelKind, LabelSpec};

/// Name field extractor.
#[derive(Debug, Default)]
pub struct NameExtractor;

impl NameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Map the matched label text back to its catalog entry.
    fn resolve_label(matched: &str) -> Option<&'static LabelSpec> {
        let key = normalize(matched);
        labels_of(LabelKind::Name).find(|label| normalize(label.text) == key)
    }
}

/// Leading words of `text` up to the first blacklisted token.
///
/// Punctuation-only tokens carry no information and are skipped.
fn value_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for token in text.split_whitespace() {
        let key = normalize(token);
        if key.is_empty() {
            continue;
        }
        if BLACKLIST.contains(&key) {
            break;
        }
        words.push(token);
    }
    words
}

impl FieldExtractor for NameExtractor {
    fn extract(&self, text: &str) -> Option<FieldMatch> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<FieldMatch> {
        let lines: Vec<&str> = text.lines().collect();
        let mut results = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(m) = NAME_LABEL.find(line) else {
                continue;
            };
            let Some(label) = Self::resolve_label(m.as_str()) else {
                continue;
            };

            let mut words = value_words(&line[m.end()..]);
            // Value printed under the label rather than beside it
            if words.is_empty() {
                if let Some(next) = lines.get(i + 1) {
                    words = value_words(next);
                }
            }

            let value = words.join(" ");
            if is_acceptable_value(&value) {
                results.push(FieldMatch {
                    value,
                    label: *label,
                });
            }
        }

        results
    }
}

/// Extract the first accepted name from text.
pub fn extract_name(text: &str) -> Option<FieldMatch> {
    NameExtractor::new().extract(text)
}
