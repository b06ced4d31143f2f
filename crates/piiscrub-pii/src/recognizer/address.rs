//! Street address recognizer
//!
//! An address is a house number (digits with an optional letter, e.g. `221B`),
//! one or more street name words, and a street suffix from
//! [`ADDRESS_SUFFIXES`]. The match ends at the first suffix word.

use crate::recognizer::{FieldContext, Match, Matches, PiiType, Recognizer};
use once_cell::sync::Lazy;
use regex::Regex;

/// Street suffixes recognized case-insensitively
pub const ADDRESS_SUFFIXES: &[&str] = &[
    "Street", "St", "Road", "Rd", "Avenue", "Ave", "Boulevard", "Blvd", "Lane", "Ln", "Drive",
    "Dr", "Court", "Ct", "Way", "Highway", "Hwy", "Terrace", "Ter", "Place", "Pl", "Parkway",
    "Pkwy", "Circle", "Cir", "Trail", "Trl", "Crescent", "Cres", "Close", "Cl",
];

static SUFFIX_ALTERNATION: Lazy<String> = Lazy::new(|| {
    let mut suffixes: Vec<&str> = ADDRESS_SUFFIXES.to_vec();
    suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
    suffixes.join("|")
});

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b\d{{1,6}}[a-z]?\s+(?:[a-z0-9][a-z0-9.'\-]*\s+){{1,6}}?(?:{})\b",
        SUFFIX_ALTERNATION.as_str()
    ))
    .expect("valid address regex")
});

static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:{})$", SUFFIX_ALTERNATION.as_str())).expect("valid suffix regex")
});

// A word the address pattern would accept as its suffix
static SUFFIX_LEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:{})\b", SUFFIX_ALTERNATION.as_str()))
        .expect("valid suffix lead regex")
});

/// True if `word` is one of the curated street suffixes
pub fn is_street_suffix(word: &str) -> bool {
    SUFFIX_RE.is_match(word.trim_end_matches('.'))
}

/// True if an address match could end inside `word`, e.g. `St.` or `Dr-x`
pub(crate) fn ends_address(word: &str) -> bool {
    SUFFIX_LEAD_RE.is_match(word)
}

/// Street addresses with a recognized suffix
pub struct AddressRecognizer;

impl Recognizer for AddressRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::Address
    }

    fn candidates<'t>(&self, text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(
            ADDRESS_RE
                .find_iter(text)
                .map(move |m| Match::new(PiiType::Address, text, m.start(), m.end(), true)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> Vec<String> {
        AddressRecognizer
            .recognize(text, &FieldContext::new("address"))
            .map(|m| m.raw_value)
            .collect()
    }

    #[test]
    fn test_house_number_with_letter() {
        let text = "221B Baker Street";
        let matches: Vec<Match> = AddressRecognizer
            .recognize(text, &FieldContext::new("note"))
            .collect();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 0);
        assert_eq!(matches[0].end, text.len());
    }

    #[test]
    fn test_address_inside_sentence() {
        assert_eq!(
            found("Ship to 221B Baker Street, London NW1 6XE."),
            vec!["221B Baker Street"]
        );
        assert_eq!(
            found("742 Evergreen Terrace, Springfield, IL 62704"),
            vec!["742 Evergreen Terrace"]
        );
    }

    #[test]
    fn test_abbreviated_and_lowercase_suffix() {
        assert_eq!(
            found("1600 Pennsylvania Ave NW, Washington"),
            vec!["1600 Pennsylvania Ave"]
        );
        assert_eq!(found("12 main st"), vec!["12 main st"]);
    }

    #[test]
    fn test_suffix_word_inside_street_name() {
        assert_eq!(found("10 Court Street"), vec!["10 Court Street"]);
    }

    #[test]
    fn test_requires_suffix() {
        assert!(found("42 Wallaby").is_empty());
        assert!(found("Baker Street").is_empty());
        assert!(found("7 Streetwise people").is_empty());
    }

    #[test]
    fn test_masked_address_not_detected() {
        assert!(found("### *** Street").is_empty());
    }

    #[test]
    fn test_is_street_suffix() {
        assert!(is_street_suffix("Street"));
        assert!(is_street_suffix("blvd"));
        assert!(is_street_suffix("St."));
        assert!(!is_street_suffix("Baker"));
    }

    #[test]
    fn test_ends_address() {
        assert!(ends_address("Rd"));
        assert!(ends_address("st."));
        assert!(ends_address("Dr-x"));
        assert!(!ends_address("Stop"));
        assert!(!ends_address("Oka"));
        assert!(!ends_address("221B"));
    }
}
