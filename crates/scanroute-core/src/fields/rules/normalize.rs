//! Canonical form for comparing labels and candidate values.

/// Lowercase `s` and drop every character that is not an ASCII letter or digit.
///
/// Total and idempotent, so `normalize("Account-Number")` and
/// `normalize("account number")` both yield `"accountnumber"`.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_punctuation() {
        assert_eq!(normalize("Account-Number"), "accountnumber");
        assert_eq!(normalize("account number"), "accountnumber");
        assert_eq!(normalize("  ID No.: "), "idno");
    }

    #[test]
    fn test_normalize_drops_non_ascii() {
        assert_eq!(normalize("Zoë O'Brien"), "zobrien");
        assert_eq!(normalize("—"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["Print name:", "CSD Number", "J. Smith-Jones", "", "1234 5678"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }
}
