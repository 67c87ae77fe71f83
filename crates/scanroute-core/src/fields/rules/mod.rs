//! Rule-based field extractors.

pub mod account;
pub mod catalog;
pub mod name;
pub mod normalize;
pub mod patterns;

pub use account::{extract_account, is_valid_account, AccountExtractor, MIN_ACCOUNT_DIGITS};
pub use catalog::{is_blacklisted, labels_of, BLACKLIST, LABELS};
pub use name::{extract_name, NameExtractor};
pub use normalize::normalize;

use crate::models::document::FieldMatch;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// Extract the first accepted value from text.
    fn extract(&self, text: &str) -> Option<FieldMatch>;

    /// Extract every accepted value, in the order they would be considered.
    fn extract_all(&self, text: &str) -> Vec<FieldMatch>;
}

/// Shared acceptance test for a candidate value.
///
/// Rejects empty values, values that normalize to a blacklisted token, and
/// values with two or fewer alphanumeric characters.
pub fn is_acceptable_value(value: &str) -> bool {
    let key = normalize(value);
    !value.is_empty() && key.len() > 2 && !BLACKLIST.contains(&key)
}
