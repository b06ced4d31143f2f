//! Person name recognizer
//!
//! Names are only looked for where the column says so: a `name` column hint or
//! a person-like column name. There the whole value must be two or more
//! capitalized words. Free-text scanning is opt-in.

use crate::recognizer::{FieldContext, Match, Matches, PiiType, Recognizer};
use once_cell::sync::Lazy;
use regex::Regex;

static WHOLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{Lu}[\p{L}'\-]+(?:\s+\p{Lu}[\p{L}'\-]+)+$").expect("valid name regex")
});

static FREE_TEXT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+){1,3}\b").expect("valid free text name regex")
});

const PERSON_COLUMNS: &[&str] = &[
    "name", "fullname", "firstname", "lastname", "surname", "forename", "givenname",
    "familyname", "person",
];

const PERSON_QUALIFIERS: &[&str] = &[
    "full", "first", "last", "middle", "given", "family", "maiden", "legal", "preferred",
    "person", "customer", "contact", "patient", "employee", "client", "user", "guest",
    "member", "owner", "holder", "cardholder", "account", "billing", "shipping",
];

/// Whether a column name reads like it holds a person's name
///
/// `name`, `full_name`, `First Name` and `customerName` qualify; `file_name`,
/// `username` and `company_name` do not.
pub fn is_person_column(column: &str) -> bool {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in column.trim().chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    match words.as_slice() {
        [] => false,
        [single] => PERSON_COLUMNS.contains(&single.as_str()),
        [.., qualifier, last] if last == "name" => PERSON_QUALIFIERS.contains(&qualifier.as_str()),
        [.., last] => PERSON_COLUMNS.contains(&last.as_str()),
    }
}

/// Names in name-like columns, and optionally in free text
pub struct NameRecognizer;

impl NameRecognizer {
    fn column_holds_names(ctx: &FieldContext<'_>) -> bool {
        match ctx.hint {
            Some(hint) => hint == PiiType::Name,
            None => is_person_column(ctx.column),
        }
    }
}

impl Recognizer for NameRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::Name
    }

    fn candidates<'t>(&self, text: &'t str, ctx: &FieldContext<'_>) -> Matches<'t> {
        if Self::column_holds_names(ctx) {
            let trimmed = text.trim();
            if !WHOLE_NAME_RE.is_match(trimmed) {
                return Box::new(std::iter::empty());
            }
            let start = text.len() - text.trim_start().len();
            let end = start + trimmed.len();
            return Box::new(std::iter::once(Match::new(
                PiiType::Name,
                text,
                start,
                end,
                true,
            )));
        }

        if ctx.detect_names_in_free_text {
            return Box::new(
                FREE_TEXT_NAME_RE
                    .find_iter(text)
                    .map(move |m| Match::new(PiiType::Name, text, m.start(), m.end(), true)),
            );
        }

        Box::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str, ctx: FieldContext<'_>) -> Vec<String> {
        NameRecognizer.recognize(text, &ctx).map(|m| m.raw_value).collect()
    }

    #[test]
    fn test_person_columns() {
        for column in [
            "name",
            "full_name",
            "fullName",
            "First Name",
            "customer_name",
            "last-name",
            "surname",
            "customer_full_name",
        ] {
            assert!(is_person_column(column), "{} should be a person column", column);
        }
    }

    #[test]
    fn test_non_person_columns() {
        for column in [
            "file_name",
            "username",
            "company_name",
            "product name",
            "note",
            "contact",
            "",
        ] {
            assert!(!is_person_column(column), "{} should not be a person column", column);
        }
    }

    #[test]
    fn test_hinted_column_matches_whole_value() {
        let ctx = FieldContext::new("who").with_hint(Some(PiiType::Name));
        let matches: Vec<Match> = NameRecognizer.recognize("  John Doe ", &ctx).collect();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].raw_value, "John Doe");
        assert_eq!(matches[0].start, 2);
        assert_eq!(matches[0].end, 10);
    }

    #[test]
    fn test_single_word_is_not_a_name() {
        assert!(found("Madonna", FieldContext::new("name")).is_empty());
    }

    #[test]
    fn test_lowercase_or_mixed_values_are_not_names() {
        assert!(found("john doe", FieldContext::new("name")).is_empty());
        assert!(found("John Doe, CEO", FieldContext::new("name")).is_empty());
        assert!(found("J*** D***", FieldContext::new("name")).is_empty());
    }

    #[test]
    fn test_apostrophes_and_hyphens() {
        assert_eq!(
            found("Mary-Jane O'Brien", FieldContext::new("full_name")),
            vec!["Mary-Jane O'Brien"]
        );
    }

    #[test]
    fn test_other_hint_disables_name_column() {
        let ctx = FieldContext::new("name").with_hint(Some(PiiType::Email));
        assert!(found("John Doe", ctx).is_empty());
    }

    #[test]
    fn test_free_text_off_by_default() {
        assert!(found("Contact John Doe for details.", FieldContext::new("note")).is_empty());
    }

    #[test]
    fn test_free_text_when_enabled() {
        let ctx = FieldContext::new("note").with_free_text_names(true);
        assert_eq!(found("Please ask John Doe today.", ctx), vec!["John Doe"]);
    }
}
