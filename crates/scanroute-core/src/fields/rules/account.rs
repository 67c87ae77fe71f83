//! Account number extraction and validation.

use super::patterns::ACCOUNT_PATTERNS;
use super::{is_acceptable_value, FieldExtractor};
use crate::models::document::FieldMatch;

/// Minimum digit count for a plausible account number.
pub const MIN_ACCOUNT_DIGITS: usize = 10;

/// Account field extractor.
pub struct AccountExtractor {
    validate: bool,
}

impl AccountExtractor {
    /// Create a new account extractor.
    pub fn new() -> Self {
        Self { validate: true }
    }

    /// Set whether candidates must pass the digit-count check.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Accepted matches for each label, in catalog order, grouped per label.
    fn matches_per_label<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Vec<FieldMatch>> + 'a {
        ACCOUNT_PATTERNS.iter().map(move |(label, re)| {
            text.lines()
                .filter_map(|line| re.captures(line))
                .map(|caps| caps[1].to_string())
                .filter(|value| is_acceptable_value(value))
                .filter(|value| !self.validate || is_valid_account(value))
                .map(|value| FieldMatch {
                    value,
                    label: **label,
                })
                .collect()
        })
    }
}

impl Default for AccountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AccountExtractor {
    fn extract(&self, text: &str) -> Option<FieldMatch> {
        // The first label with any accepted match decides
        self.matches_per_label(text)
            .find(|matches| !matches.is_empty())
            .and_then(|matches| matches.into_iter().next())
    }

    fn extract_all(&self, text: &str) -> Vec<FieldMatch> {
        self.matches_per_label(text).flatten().collect()
    }
}

/// Extract the first accepted account number from text.
pub fn extract_account(text: &str) -> Option<FieldMatch> {
    AccountExtractor::new().extract(text)
}

/// Whether `value` holds at least ten digits once everything else is stripped.
pub fn is_valid_account(value: &str) -> bool {
    value.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_ACCOUNT_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_valid_account_boundary() {
        assert!(is_valid_account("1234567890"));
        assert!(!is_valid_account("123456789"));
        assert!(is_valid_account("1234567890123"));
        assert!(is_valid_account("12-3456-7890"));
        assert!(!is_valid_account("AB"));
        assert!(!is_valid_account(""));
    }

    #[test]
    fn test_extract_account_labeled() {
        let m = extract_account("Surname: John Smith\nAccount Number: 1234567890123").unwrap();
        assert_eq!(m.value, "1234567890123");
        assert_eq!(m.label.text, "Account Number");
    }

    #[test]
    fn test_rejects_letters_only() {
        assert_eq!(extract_account("Surname: John\nAccount Number: AB"), None);
    }

    #[test]
    fn test_hyphenated_value_kept_verbatim() {
        let m = extract_account("CSD Number 0012-3456-7890").unwrap();
        assert_eq!(m.value, "0012-3456-7890");
        assert_eq!(m.label.text, "CSD Number");
    }

    #[test]
    fn test_later_line_for_same_label() {
        let text = "Account Number: 12345\nAccount Number: 9876543210";
        assert_eq!(extract_account(text).unwrap().value, "9876543210");
    }

    #[test]
    fn test_first_successful_label_wins() {
        // "ID Number" comes after "Account Number" in the catalog
        let text = "ID Number: 8001015009087\nAccount Number: 1111111111";
        let m = extract_account(text).unwrap();
        assert_eq!(m.label.text, "Account Number");
        assert_eq!(m.value, "1111111111");
    }

    #[test]
    fn test_without_validation() {
        let extractor = AccountExtractor::new().with_validation(false);
        let m = extractor.extract("Account No: ABC123").unwrap();
        assert_eq!(m.value, "ABC123");
    }
}
