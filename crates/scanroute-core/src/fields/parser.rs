//! Document field parser running the name and account passes.

use image::DynamicImage;
use tracing::debug;

use super::rules::{AccountExtractor, FieldExtractor, NameExtractor};
use crate::models::document::DocumentFields;

/// Runs the name pass and the account pass over the same text.
pub struct FieldParser {
    name: NameExtractor,
    account: AccountExtractor,
}

impl FieldParser {
    /// Create a parser with account validation enabled.
    pub fn new() -> Self {
        Self {
            name: NameExtractor::new(),
            account: AccountExtractor::new(),
        }
    }

    /// Set account digit-count validation.
    pub fn with_account_validation(mut self, validate: bool) -> Self {
        self.account = AccountExtractor::new().with_validation(validate);
        self
    }

    /// Parse name and account fields from extracted text.
    ///
    /// `image` is the decoded page when the source was an image. It is
    /// accepted for layout-aware disambiguation but does not influence the
    /// result today.
    pub fn parse(&self, text: &str, image: Option<&DynamicImage>) -> DocumentFields {
        let _ = image;

        let fields = DocumentFields {
            name: self.name.extract(text),
            account: self.account.extract(text),
        };

        debug!(
            name = fields.name.as_ref().map(|m| m.value.as_str()),
            account = fields.account.as_ref().map(|m| m.value.as_str()),
            "Parsed document fields"
        );

        fields
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_both_fields() {
        let text = r#"
            CLIENT INSTRUCTION FORM

            Surname: John Smith
            Account Number: 1234567890123
            Signature: ________
        "#;

        let fields = FieldParser::new().parse(text, None);
        assert_eq!(fields.name.unwrap().value, "John Smith");
        assert_eq!(fields.account.unwrap().value, "1234567890123");
    }

    #[test]
    fn test_image_handle_does_not_change_result() {
        let text = "Surname: John\nAccount Number: AB";
        let image = DynamicImage::new_rgb8(4, 4);
        let parser = FieldParser::new();

        assert_eq!(parser.parse(text, Some(&image)), parser.parse(text, None));
    }

    #[test]
    fn test_text_without_labels_is_empty() {
        let fields = FieldParser::new().parse("Lorem ipsum dolor sit amet\n1234567890123", None);
        assert!(fields.is_empty());
    }
}
