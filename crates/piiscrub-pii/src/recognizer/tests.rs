//! Tests for recognizer types and the recognizer set

use super::*;

#[test]
fn test_pii_type_serialization() {
    for pii_type in PiiType::ALL {
        let json = serde_json::to_string(&pii_type).unwrap();
        assert_eq!(json, format!("\"{}\"", pii_type.as_str()));
        let deserialized: PiiType = serde_json::from_str(&json).unwrap();
        assert_eq!(pii_type, deserialized);
    }
}

#[test]
fn test_pii_type_hint_aliases() {
    let hint: PiiType = serde_json::from_str("\"full_name\"").unwrap();
    assert_eq!(hint, PiiType::Name);
    let hint: PiiType = serde_json::from_str("\"card\"").unwrap();
    assert_eq!(hint, PiiType::CreditCard);

    assert_eq!("Phone_Number".parse::<PiiType>().unwrap(), PiiType::Phone);
    assert_eq!("street_address".parse::<PiiType>().unwrap(), PiiType::Address);
    assert!("passport".parse::<PiiType>().is_err());
}

#[test]
fn test_token_prefixes() {
    assert_eq!(PiiType::Name.token_prefix(), "PERSON");
    assert_eq!(PiiType::CreditCard.token_prefix(), "CARD");
    assert_eq!(PiiType::Address.token_prefix(), "ADDRESS");
}

#[test]
fn test_priority_order() {
    let mut types = vec![
        PiiType::Phone,
        PiiType::Email,
        PiiType::Ssn,
        PiiType::CreditCard,
        PiiType::Address,
        PiiType::Name,
    ];
    types.sort_by_key(|t| t.priority());
    assert_eq!(types, PiiType::ALL.to_vec());
}

#[test]
fn test_standard_set_covers_every_type() {
    let set = RecognizerSet::standard();
    for pii_type in PiiType::ALL {
        let recognizer = set.get(pii_type).expect("recognizer registered");
        assert_eq!(recognizer.pii_type(), pii_type);
    }
    assert_eq!(set.types().len(), 6);
}

#[test]
fn test_recognize_all_sorted() {
    let set = RecognizerSet::standard();
    let text = "Mail bob@example.com, call 555-123-4567, SSN 123-45-6789, card 4111 1111 1111 1111";
    let matches = set.recognize_all(text, &FieldContext::new("note"));

    let types: Vec<PiiType> = matches.iter().map(|m| m.pii_type).collect();
    assert_eq!(
        types,
        vec![PiiType::Email, PiiType::Phone, PiiType::Ssn, PiiType::CreditCard]
    );
    for pair in matches.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    for m in &matches {
        assert_eq!(&text[m.start..m.end], m.raw_value);
    }
}

#[test]
fn test_scan_candidates_includes_invalid() {
    let set = RecognizerSet::standard();
    let text = "SSN 987-65-4320 card 4111 1111 1111 1112";
    let ctx = FieldContext::new("note");

    assert!(set.recognize_all(text, &ctx).is_empty());

    let candidates = set.scan_candidates(text, &ctx);
    assert!(candidates
        .iter()
        .any(|m| m.pii_type == PiiType::Ssn && !m.valid));
    assert!(candidates
        .iter()
        .any(|m| m.pii_type == PiiType::CreditCard && !m.valid));
}

#[test]
fn test_custom_recognizer_replaces_standard() {
    struct NoEmails;

    impl Recognizer for NoEmails {
        fn pii_type(&self) -> PiiType {
            PiiType::Email
        }

        fn candidates<'t>(&self, _text: &'t str, _ctx: &FieldContext<'_>) -> Matches<'t> {
            Box::new(std::iter::empty())
        }
    }

    let mut set = RecognizerSet::standard();
    set.insert(Box::new(NoEmails));
    let matches = set.recognize_all("bob@example.com", &FieldContext::new("note"));
    assert!(matches.is_empty());
}

#[test]
fn test_isolated() {
    assert!(isolated("a 123 b", 2, 5));
    assert!(isolated("123", 0, 3));
    assert!(!isolated("x123", 1, 4));
    assert!(!isolated("123_", 0, 3));
    assert!(isolated("(123)", 1, 4));
}

#[test]
fn test_match_serialization() {
    let m = Match {
        pii_type: PiiType::CreditCard,
        start: 0,
        end: 19,
        raw_value: "4111-1111-1111-1111".to_string(),
        valid: true,
    };

    let json = serde_json::to_string(&m).unwrap();
    let deserialized: Match = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, m);
    assert_eq!(m.len(), 19);
    assert!(!m.is_empty());
}
