//! Regex patterns built from the label catalog.

use lazy_static::lazy_static;
use regex::Regex;

use super::catalog::labels_of;
use crate::models::document::{LabelKind, LabelSpec};

/// Regex source for one label: words escaped, any whitespace run between them.
pub fn label_regex_source(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

lazy_static! {
    // Any name label, optionally followed by a colon
    pub static ref NAME_LABEL: Regex = {
        let alternation = labels_of(LabelKind::Name)
            .map(|label| label_regex_source(label.text))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\s*:?", alternation)).unwrap()
    };

    // One pattern per account label, capturing the alphanumeric/hyphen run after it
    pub static ref ACCOUNT_PATTERNS: Vec<(&'static LabelSpec, Regex)> = labels_of(LabelKind::Account)
        .map(|label| {
            let pattern = format!(
                r"(?i)\b{}\s*:?\s*([A-Za-z0-9-]+)",
                label_regex_source(label.text)
            );
            (label, Regex::new(&pattern).unwrap())
        })
        .collect();

    // Characters never allowed in an output filename
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r#"[\\/:*?"<>|]"#).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_label_flexible_spacing_and_case() {
        assert!(NAME_LABEL.is_match("PRINT   NAME: J Smith"));
        assert!(NAME_LABEL.is_match("surname John"));
        assert!(!NAME_LABEL.is_match("Account Number: 123"));
    }

    #[test]
    fn test_account_pattern_captures_run() {
        let (label, re) = &ACCOUNT_PATTERNS[0];
        assert_eq!(label.text, "Account Number");
        let caps = re.captures("account number:  12-3456 789").unwrap();
        assert_eq!(&caps[1], "12-3456");
    }
}
