//! PII recognizers
//!
//! Each recognizer finds one kind of PII in a field's text and yields matches
//! lazily, ordered by start offset. The orchestrator looks them up through a
//! [`RecognizerSet`] keyed by [`PiiType`].

mod address;
mod name;
mod patterns;

pub use address::{ADDRESS_SUFFIXES, AddressRecognizer, is_street_suffix};
pub(crate) use address::ends_address;
pub use name::{NameRecognizer, is_person_column};
pub use patterns::{CreditCardRecognizer, EmailRecognizer, PhoneRecognizer, SsnRecognizer};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Types of PII the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// Person name
    #[serde(alias = "full_name", alias = "person")]
    Name,

    /// Email address
    Email,

    /// Phone number
    #[serde(alias = "phone_number")]
    Phone,

    /// U.S. Social Security Number
    Ssn,

    /// Payment card number
    #[serde(alias = "card", alias = "cc")]
    CreditCard,

    /// Street address
    #[serde(alias = "street_address")]
    Address,
}

impl PiiType {
    /// Every supported type, in overlap priority order.
    pub const ALL: [PiiType; 6] = [
        PiiType::Name,
        PiiType::Address,
        PiiType::CreditCard,
        PiiType::Ssn,
        PiiType::Email,
        PiiType::Phone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PiiType::Name => "name",
            PiiType::Email => "email",
            PiiType::Phone => "phone",
            PiiType::Ssn => "ssn",
            PiiType::CreditCard => "credit_card",
            PiiType::Address => "address",
        }
    }

    /// Uppercase tag placed in front of tokens of this type
    pub fn token_prefix(&self) -> &'static str {
        match self {
            PiiType::Name => "PERSON",
            PiiType::Email => "EMAIL",
            PiiType::Phone => "PHONE",
            PiiType::Ssn => "SSN",
            PiiType::CreditCard => "CARD",
            PiiType::Address => "ADDRESS",
        }
    }

    /// Tie-break rank when matches of different types overlap (lower wins)
    pub fn priority(&self) -> usize {
        match self {
            PiiType::Name => 0,
            PiiType::Address => 1,
            PiiType::CreditCard => 2,
            PiiType::Ssn => 3,
            PiiType::Email => 4,
            PiiType::Phone => 5,
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "full_name" | "person" => Ok(PiiType::Name),
            "email" => Ok(PiiType::Email),
            "phone" | "phone_number" => Ok(PiiType::Phone),
            "ssn" => Ok(PiiType::Ssn),
            "credit_card" | "card" | "cc" => Ok(PiiType::CreditCard),
            "address" | "street_address" => Ok(PiiType::Address),
            other => Err(format!("unknown PII type '{}'", other)),
        }
    }
}

/// A recognized span of PII within a field's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Type of PII matched
    pub pii_type: PiiType,

    /// Byte offset where the match starts
    pub start: usize,

    /// Byte offset one past the end of the match
    pub end: usize,

    /// The matched text
    pub raw_value: String,

    /// Validator verdict (always true for types without a validator)
    pub valid: bool,
}

impl Match {
    pub(crate) fn new(pii_type: PiiType, text: &str, start: usize, end: usize, valid: bool) -> Self {
        Self {
            pii_type,
            start,
            end,
            raw_value: text[start..end].to_string(),
            valid,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What a recognizer knows about the field it is scanning
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Column name of the field
    pub column: &'a str,

    /// Type forced on this column by the policy's column hints
    pub hint: Option<PiiType>,

    /// Look for names anywhere, not just in name columns
    pub detect_names_in_free_text: bool,
}

impl<'a> FieldContext<'a> {
    pub fn new(column: &'a str) -> Self {
        Self {
            column,
            hint: None,
            detect_names_in_free_text: false,
        }
    }

    pub fn with_hint(mut self, hint: Option<PiiType>) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_free_text_names(mut self, enabled: bool) -> Self {
        self.detect_names_in_free_text = enabled;
        self
    }
}

/// Lazy, single-pass sequence of matches over one field
pub type Matches<'t> = Box<dyn Iterator<Item = Match> + 't>;

/// Trait for finding one type of PII in text
pub trait Recognizer: Send + Sync {
    /// The type this recognizer finds
    fn pii_type(&self) -> PiiType;

    /// Every pattern hit, with `valid` set by the type's validator
    fn candidates<'t>(&self, text: &'t str, ctx: &FieldContext<'_>) -> Matches<'t>;

    /// Pattern hits that also pass validation
    fn recognize<'t>(&self, text: &'t str, ctx: &FieldContext<'_>) -> Matches<'t> {
        Box::new(self.candidates(text, ctx).filter(|m| m.valid))
    }
}

/// Recognizers keyed by the type they find
pub struct RecognizerSet {
    recognizers: BTreeMap<PiiType, Box<dyn Recognizer>>,
}

impl RecognizerSet {
    /// An empty set
    pub fn new() -> Self {
        Self {
            recognizers: BTreeMap::new(),
        }
    }

    /// One recognizer for every [`PiiType`]
    pub fn standard() -> Self {
        let mut set = Self::new();
        set.insert(Box::new(NameRecognizer));
        set.insert(Box::new(EmailRecognizer));
        set.insert(Box::new(PhoneRecognizer));
        set.insert(Box::new(SsnRecognizer));
        set.insert(Box::new(CreditCardRecognizer));
        set.insert(Box::new(AddressRecognizer));
        set
    }

    /// Register a recognizer, replacing any previous one for the same type
    pub fn insert(&mut self, recognizer: Box<dyn Recognizer>) {
        self.recognizers.insert(recognizer.pii_type(), recognizer);
    }

    pub fn get(&self, pii_type: PiiType) -> Option<&dyn Recognizer> {
        self.recognizers.get(&pii_type).map(|r| r.as_ref())
    }

    pub fn types(&self) -> Vec<PiiType> {
        self.recognizers.keys().copied().collect()
    }

    /// Valid matches of every type, sorted by start offset. Matches of
    /// different types may overlap.
    pub fn recognize_all(&self, text: &str, ctx: &FieldContext<'_>) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .recognizers
            .values()
            .flat_map(|r| r.recognize(text, ctx))
            .collect();
        matches.sort_by_key(|m| m.start);
        matches
    }

    /// Every candidate including those rejected by a validator, sorted by
    /// start offset
    pub fn scan_candidates(&self, text: &str, ctx: &FieldContext<'_>) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .recognizers
            .values()
            .flat_map(|r| r.candidates(text, ctx))
            .collect();
        matches.sort_by_key(|m| m.start);
        matches
    }
}

impl Default for RecognizerSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// True when the span is not glued to a neighbouring letter, digit or underscore
pub(crate) fn isolated(text: &str, start: usize, end: usize) -> bool {
    let word = |c: char| c.is_alphanumeric() || c == '_';
    let before = text[..start].chars().next_back().is_none_or(|c| !word(c));
    let after = text[end..].chars().next().is_none_or(|c| !word(c));
    before && after
}

#[cfg(test)]
mod tests;
