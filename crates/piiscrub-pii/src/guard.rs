//! Idempotence guard
//!
//! A field whose whole value already has the shape of an action's output is
//! treated as sanitized and never scanned again, so masks do not compound.

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::action::REDACTED;
use crate::recognizer::PiiType;

static SANITIZED_SHAPES: Lazy<RegexSet> = Lazy::new(|| {
    let prefixes: Vec<&str> = PiiType::ALL.iter().map(|t| t.token_prefix()).collect();
    RegexSet::new([
        format!(r"^{}$", regex::escape(REDACTED)),
        // tokens
        format!(r"^(?:{})_[a-z2-7]{{12}}$", prefixes.join("|")),
        // ssn
        r"^\*\*\*-\*\*-\d{4}$".to_string(),
        // card
        r"^\*{4} \*{4} \*{4} \d{0,4}$".to_string(),
        // phone
        r"^(?:\+\d{1,3} )?\*\*\*-\*\*\*-\d{0,4}$".to_string(),
        // email
        r"^[^\s@]?\*\*\*@\S+$".to_string(),
        // name
        r"^\S\*\*\*(?: \S\*\*\*)*$".to_string(),
        // address
        r"^### \*\*\* \S+$".to_string(),
    ])
    .expect("valid sanitized shape patterns")
});

/// True when the entire (trimmed) value already looks like sanitizer output
pub fn looks_sanitized(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && SANITIZED_SHAPES.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_literal() {
        assert!(looks_sanitized("[REDACTED]"));
        assert!(looks_sanitized("  [REDACTED] "));
        assert!(!looks_sanitized("[REDACTED] and more"));
    }

    #[test]
    fn test_tokens() {
        assert!(looks_sanitized("EMAIL_abcdefghij23"));
        assert!(looks_sanitized("PERSON_mfrggzdfmztw"));
        assert!(looks_sanitized("ADDRESS_aaaaaaaaaaaa"));
        // base32 has no 0, 1, 8 or 9
        assert!(!looks_sanitized("EMAIL_abcdefghij01"));
        assert!(!looks_sanitized("EMAIL_abc"));
        assert!(!looks_sanitized("TOKEN_abcdefghijkl"));
    }

    #[test]
    fn test_masks() {
        assert!(looks_sanitized("***-**-6789"));
        assert!(looks_sanitized("**** **** **** 1111"));
        assert!(looks_sanitized("***-***-7890"));
        assert!(looks_sanitized("+1 ***-***-2671"));
        assert!(looks_sanitized("a***@example.com"));
        assert!(looks_sanitized("J*** D***"));
        assert!(looks_sanitized("### *** Street"));
    }

    #[test]
    fn test_plain_values_are_not_sanitized() {
        assert!(!looks_sanitized(""));
        assert!(!looks_sanitized("alice@example.com"));
        assert!(!looks_sanitized("123-45-6789"));
        assert!(!looks_sanitized("John Doe"));
        assert!(!looks_sanitized("Card **** **** **** 1111"));
        assert!(!looks_sanitized("221B Baker Street"));
    }
}
