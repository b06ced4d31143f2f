//! Regex recognizers for email, phone, SSN and payment card numbers

use crate::recognizer::{FieldContext, Match, Matches, PiiType, Recognizer, isolated};
use crate::validators::{is_valid_luhn, is_valid_ssn};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

// +1 (555) 123-4567, 555.123.4567, 555-1234, +44 20 7946 0958
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:(?:\(\d{2,4}\)|\d{2,4})[-.\s]?)?\d{3,4}[-.\s]?\d{4}")
        .expect("valid phone regex")
});

// Three or more runs of four digits read as a card, not a phone
static CARD_GROUPING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\d{4}[-\s]?){3,}").expect("valid card grouping regex"));

static SSN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}-\d{2}-\d{4}").expect("valid ssn regex"));

// Digit runs joined by single spaces or dashes
static DIGIT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[ -]\d+)*").expect("valid digit run regex"));

static DIGIT_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;
const CARD_MIN_DIGITS: usize = 13;
const CARD_MAX_DIGITS: usize = 19;

/// Email addresses (`local@domain.tld`)
pub struct EmailRecognizer;

impl Recognizer for EmailRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::Email
    }

    fn candidates<'t>(&self, text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(
            EMAIL_RE
                .find_iter(text)
                .map(move |m| Match::new(PiiType::Email, text, m.start(), m.end(), true)),
        )
    }
}

/// Phone numbers with optional country code and common separators
pub struct PhoneRecognizer;

impl PhoneRecognizer {
    fn validate(phone: &str) -> bool {
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
            return false;
        }
        !CARD_GROUPING_RE.is_match(phone)
    }
}

/// True when a single space or dash ties the span to another digit group,
/// as in the `10001 4111` prefix of `10001 4111 1111 1111 1111`
fn joins_digit_run(text: &str, start: usize, end: usize) -> bool {
    let tied = |sep: Option<char>, digit: Option<char>| {
        matches!(sep, Some(' ' | '-')) && digit.is_some_and(|c| c.is_ascii_digit())
    };
    let mut after = text[end..].chars();
    let mut before = text[..start].chars().rev();
    tied(after.next(), after.next()) || tied(before.next(), before.next())
}

impl Recognizer for PhoneRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::Phone
    }

    fn candidates<'t>(&self, text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(
            PHONE_RE
                .find_iter(text)
                .filter(move |m| {
                    isolated(text, m.start(), m.end()) && !joins_digit_run(text, m.start(), m.end())
                })
                .map(move |m| {
                    let valid = Self::validate(m.as_str());
                    Match::new(PiiType::Phone, text, m.start(), m.end(), valid)
                }),
        )
    }
}

/// Dashed Social Security Numbers, checked with [`is_valid_ssn`]
pub struct SsnRecognizer;

impl Recognizer for SsnRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::Ssn
    }

    fn candidates<'t>(&self, text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(
            SSN_RE
                .find_iter(text)
                .filter(move |m| isolated(text, m.start(), m.end()))
                .map(move |m| {
                    Match::new(PiiType::Ssn, text, m.start(), m.end(), is_valid_ssn(m.as_str()))
                }),
        )
    }
}

/// Payment card numbers, checked with [`is_valid_luhn`]
///
/// A run of digit groups such as `Order 10001 4111 1111 1111 1111` is searched
/// for windows of whole groups laid out the way cards are printed: one
/// unbroken group, groups of four (the last may be shorter), or 4-6-5 and
/// 4-6-4. The earliest such window that passes Luhn wins, longest first. A run
/// with no card-shaped hit falls back to the whole run when it holds 13 to 19
/// digits.
pub struct CreditCardRecognizer;

/// Group sizes of a window that reads as a printed card number
fn card_shaped(sizes: &[usize]) -> bool {
    match sizes {
        [] => false,
        [_] => true,
        [4, 6, 4] | [4, 6, 5] => true,
        [init @ .., last] => init.len() >= 3 && init.iter().all(|&n| n == 4) && *last <= 4,
    }
}

impl CreditCardRecognizer {
    fn scan_run(text: &str, run_start: usize, run_end: usize) -> Vec<Match> {
        let run = &text[run_start..run_end];
        let groups: Vec<(usize, usize)> = DIGIT_GROUP_RE
            .find_iter(run)
            .map(|g| (run_start + g.start(), run_start + g.end()))
            .collect();
        let sizes: Vec<usize> = groups.iter().map(|(start, end)| end - start).collect();

        let mut found = Vec::new();
        let mut first_miss = None;
        let mut first = 0;
        while first < groups.len() {
            let mut hit = None;
            let mut digits = 0;
            let mut windows = Vec::new();
            for last in first..groups.len() {
                digits += sizes[last];
                if digits > CARD_MAX_DIGITS {
                    break;
                }
                if digits >= CARD_MIN_DIGITS && card_shaped(&sizes[first..=last]) {
                    windows.push(last);
                }
            }
            // Longest window first
            for &last in windows.iter().rev() {
                let (start, end) = (groups[first].0, groups[last].1);
                if !isolated(text, start, end) {
                    continue;
                }
                if is_valid_luhn(&text[start..end]) {
                    hit = Some((start, end, last));
                    break;
                }
                if first_miss.is_none() {
                    first_miss = Some((start, end));
                }
            }
            match hit {
                Some((start, end, last)) => {
                    found.push(Match::new(PiiType::CreditCard, text, start, end, true));
                    first = last + 1;
                }
                None => first += 1,
            }
        }
        if !found.is_empty() {
            return found;
        }

        let digits: usize = sizes.iter().sum();
        if (CARD_MIN_DIGITS..=CARD_MAX_DIGITS).contains(&digits) && isolated(text, run_start, run_end)
        {
            let valid = is_valid_luhn(run);
            if valid || first_miss.is_none() {
                return vec![Match::new(PiiType::CreditCard, text, run_start, run_end, valid)];
            }
        }

        first_miss
            .map(|(start, end)| Match::new(PiiType::CreditCard, text, start, end, false))
            .into_iter()
            .collect()
    }
}

impl Recognizer for CreditCardRecognizer {
    fn pii_type(&self) -> PiiType {
        PiiType::CreditCard
    }

    fn candidates<'t>(&self, text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(
            DIGIT_RUN_RE
                .find_iter(text)
                .flat_map(move |run| Self::scan_run(text, run.start(), run.end())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FieldContext<'static> {
        FieldContext::new("note")
    }

    fn found(recognizer: &dyn Recognizer, text: &str) -> Vec<String> {
        recognizer
            .recognize(text, &ctx())
            .map(|m| m.raw_value)
            .collect()
    }

    #[test]
    fn test_email_detection() {
        let text = "Contact me at john.doe@example.com for more info.";
        let matches: Vec<Match> = EmailRecognizer.recognize(text, &ctx()).collect();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pii_type, PiiType::Email);
        assert_eq!(matches[0].raw_value, "john.doe@example.com");
        assert_eq!(&text[matches[0].start..matches[0].end], "john.doe@example.com");
    }

    #[test]
    fn test_masked_email_is_not_an_email() {
        assert!(found(&EmailRecognizer, "a***@example.com").is_empty());
    }

    #[test]
    fn test_phone_formats() {
        let text = "Call (555) 123-4567 or 555-987-6543 or +1 415-555-2671.";
        assert_eq!(
            found(&PhoneRecognizer, text),
            vec!["(555) 123-4567", "555-987-6543", "+1 415-555-2671"]
        );
    }

    #[test]
    fn test_short_local_phone() {
        assert_eq!(found(&PhoneRecognizer, "ext 555-1234"), vec!["555-1234"]);
    }

    #[test]
    fn test_phone_rejects_card_grouping() {
        assert!(found(&PhoneRecognizer, "4111 1111 1111 1112").is_empty());
    }

    #[test]
    fn test_phone_ignores_digits_inside_tokens() {
        assert!(found(&PhoneRecognizer, "id PHONE_2345672abcde").is_empty());
    }

    #[test]
    fn test_phone_not_carved_from_longer_digit_run() {
        assert!(found(&PhoneRecognizer, "Order 10001 4111 1111 1111 1111").is_empty());
        assert_eq!(found(&PhoneRecognizer, "555-123-4567, 555-987-6543").len(), 2);
    }

    #[test]
    fn test_phone_does_not_match_ssn_shape() {
        assert!(found(&PhoneRecognizer, "123-45-6789").is_empty());
    }

    #[test]
    fn test_ssn_detection() {
        assert_eq!(found(&SsnRecognizer, "My SSN is 123-45-6789"), vec!["123-45-6789"]);
        assert!(found(&SsnRecognizer, "Bad SSN: 000-12-3456").is_empty());
        assert!(found(&SsnRecognizer, "Bad SSN: 666-12-3456").is_empty());
        assert!(found(&SsnRecognizer, "SSN 987-65-4320").is_empty());
    }

    #[test]
    fn test_ssn_candidates_keep_invalid() {
        let candidates: Vec<Match> = SsnRecognizer.candidates("SSN 987-65-4320", &ctx()).collect();
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].valid);
    }

    #[test]
    fn test_ssn_requires_isolation() {
        assert!(found(&SsnRecognizer, "1123-45-6789").is_empty());
        assert!(found(&SsnRecognizer, "123-45-67890").is_empty());
    }

    #[test]
    fn test_credit_card_detection() {
        assert_eq!(
            found(&CreditCardRecognizer, "Card: 4532-0151-1283-0366"),
            vec!["4532-0151-1283-0366"]
        );
        assert_eq!(
            found(&CreditCardRecognizer, "Card 4111 1111 1111 1111"),
            vec!["4111 1111 1111 1111"]
        );
        assert_eq!(
            found(&CreditCardRecognizer, "raw 4111111111111111."),
            vec!["4111111111111111"]
        );
    }

    #[test]
    fn test_credit_card_luhn_failure_is_skipped() {
        assert!(found(&CreditCardRecognizer, "Bad card: 4532-0151-1283-0367").is_empty());

        let candidates: Vec<Match> = CreditCardRecognizer
            .candidates("Bad card: 4532-0151-1283-0367", &ctx())
            .collect();
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].valid);
    }

    #[test]
    fn test_credit_card_window_inside_longer_run() {
        assert_eq!(
            found(&CreditCardRecognizer, "Order 12345 4111 1111 1111 1111"),
            vec!["4111 1111 1111 1111"]
        );
    }

    #[test]
    fn test_credit_card_prefers_card_grouping_over_leading_number() {
        // `10001 4111 1111` also passes Luhn but is not laid out like a card
        assert!(is_valid_luhn("10001 4111 1111"));
        assert_eq!(
            found(&CreditCardRecognizer, "Order 10001 4111 1111 1111 1111"),
            vec!["4111 1111 1111 1111"]
        );
        assert_eq!(
            found(&CreditCardRecognizer, "Ref 42 3782 822463 10005"),
            vec!["3782 822463 10005"]
        );
    }

    #[test]
    fn test_credit_card_whole_run_fallback() {
        assert_eq!(
            found(&CreditCardRecognizer, "id 10001 4111 1111"),
            vec!["10001 4111 1111"]
        );
    }

    #[test]
    fn test_two_cards_in_one_run() {
        assert_eq!(
            found(
                &CreditCardRecognizer,
                "4111 1111 1111 1111 5500 0000 0000 0004"
            ),
            vec!["4111 1111 1111 1111", "5500 0000 0000 0004"]
        );
    }

    #[test]
    fn test_card_shapes() {
        assert!(card_shaped(&[16]));
        assert!(card_shaped(&[4, 4, 4, 4]));
        assert!(card_shaped(&[4, 4, 4, 4, 3]));
        assert!(card_shaped(&[4, 6, 5]));
        assert!(!card_shaped(&[5, 4, 4]));
        assert!(!card_shaped(&[4, 4, 5]));
    }

    #[test]
    fn test_credit_card_masked_output_not_detected() {
        assert!(found(&CreditCardRecognizer, "**** **** **** 1111").is_empty());
    }
}
