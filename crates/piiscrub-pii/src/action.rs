//! Protection actions
//!
//! Given a matched value and the action chosen for it, produce the replacement
//! text. Only tokenization can fail (it needs a secret).

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::recognizer::{PiiType, ends_address, is_street_suffix};
use crate::tokenizer;

/// Replacement written by [`Action::Redact`]
pub const REDACTED: &str = "[REDACTED]";

/// What to do with a detected value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Type-aware partial reveal (last four digits, email domain, ...)
    Mask,

    /// Deterministic keyed token, e.g. `EMAIL_k3j2...`
    Tokenize,

    /// Fixed `[REDACTED]` literal
    Redact,

    /// Deterministic shuffle of the value's characters (not cryptographic)
    Scramble,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Mask => "mask",
            Action::Tokenize => "tokenize",
            Action::Redact => "redact",
            Action::Scramble => "scramble",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mask" => Ok(Action::Mask),
            "tokenize" => Ok(Action::Tokenize),
            "redact" => Ok(Action::Redact),
            "scramble" => Ok(Action::Scramble),
            other => Err(format!(
                "unknown action '{}', expected mask, tokenize, redact or scramble",
                other
            )),
        }
    }
}

/// Compute the replacement for `raw_value` under `action`
pub fn apply(
    pii_type: PiiType,
    raw_value: &str,
    action: Action,
    secret: Option<&str>,
) -> Result<String> {
    match action {
        Action::Mask => Ok(mask(pii_type, raw_value)),
        Action::Tokenize => tokenizer::token(pii_type, raw_value, secret),
        Action::Redact => Ok(REDACTED.to_string()),
        Action::Scramble => Ok(scramble_as(pii_type, raw_value)),
    }
}

/// Partially reveal a value in a type-specific way
pub fn mask(pii_type: PiiType, raw_value: &str) -> String {
    let raw = raw_value.trim();
    if raw.is_empty() {
        return String::new();
    }

    match pii_type {
        PiiType::Email => match raw.split_once('@') {
            Some((user, domain)) => {
                let first = user.trim().chars().next().unwrap_or('*');
                format!("{}***@{}", first, domain)
            }
            None => "*".repeat(raw.chars().count()),
        },
        PiiType::Phone => {
            let digits = digits_of(raw);
            let last4 = last_n(&digits, 4);
            match country_code(raw) {
                Some(cc) => format!("+{} ***-***-{}", cc, last4),
                None => format!("***-***-{}", last4),
            }
        }
        PiiType::CreditCard => format!("**** **** **** {}", last_n(&digits_of(raw), 4)),
        PiiType::Ssn => format!("***-**-{}", last_n(&digits_of(raw), 4)),
        PiiType::Address => match raw.split_whitespace().next_back() {
            Some(suffix) if is_street_suffix(suffix) => format!("### *** {}", suffix),
            _ => "### ***".to_string(),
        },
        PiiType::Name => raw
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .map(|initial| format!("{}***", initial))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn last_n(digits: &str, n: usize) -> &str {
    &digits[digits.len().saturating_sub(n)..]
}

/// Country code of a `+`-prefixed phone number
///
/// The digits up to the first separator are used when there are at most
/// three; an unseparated international number keeps what precedes a ten digit
/// national number.
fn country_code(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix('+')?;
    let lead: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    match lead.len() {
        0 => None,
        1..=3 => Some(lead),
        n => Some(lead[..(n.saturating_sub(10)).clamp(1, 3)].to_string()),
    }
}

fn char_class(c: char) -> Option<usize> {
    if c.is_uppercase() {
        Some(0)
    } else if c.is_lowercase() {
        Some(1)
    } else if c.is_ascii_digit() {
        Some(2)
    } else {
        None
    }
}

/// Attempts at an address shuffle before the value is left as it is
const ADDRESS_SHUFFLES: usize = 32;

/// Class-preserving shuffles of the unfrozen characters of a value
///
/// The generator is seeded from the sorted characters of each class, so any
/// arrangement of the same characters yields the same sequence of shuffles.
struct Shuffles {
    chars: Vec<char>,
    frozen: Vec<bool>,
    classes: [Vec<char>; 3],
    rng: StdRng,
}

impl Shuffles {
    fn new(value: &str, frozen: Vec<bool>) -> Self {
        let chars: Vec<char> = value.chars().collect();
        let mut classes: [Vec<char>; 3] = Default::default();
        for (&c, &fixed) in chars.iter().zip(&frozen) {
            if let Some(class) = char_class(c).filter(|_| !fixed) {
                classes[class].push(c);
            }
        }

        let mut hasher = Sha256::new();
        for class in classes.iter_mut() {
            class.sort_unstable();
            for c in class.iter() {
                let mut buf = [0u8; 4];
                hasher.update(c.encode_utf8(&mut buf).as_bytes());
            }
            hasher.update([0xff]);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&hasher.finalize());

        Self {
            chars,
            frozen,
            classes,
            rng: StdRng::from_seed(seed),
        }
    }

    fn next_shuffle(&mut self) -> String {
        let mut classes = self.classes.clone();
        for class in classes.iter_mut() {
            class.shuffle(&mut self.rng);
        }

        let mut cursors = [0usize; 3];
        self.chars
            .iter()
            .zip(&self.frozen)
            .map(|(&c, &fixed)| match char_class(c).filter(|_| !fixed) {
                Some(class) => {
                    let out = classes[class][cursors[class]];
                    cursors[class] += 1;
                    out
                }
                None => c,
            })
            .collect()
    }
}

/// Shuffle a value's characters deterministically
///
/// Uppercase letters trade places with uppercase letters, lowercase with
/// lowercase and digits with digits; everything else stays put. The shuffle is
/// seeded from the sorted characters of each class, so the output depends only
/// on which characters the value holds, and scrambling the output again returns
/// it unchanged. Not a cryptographic transform.
pub fn scramble(value: &str) -> String {
    let frozen = vec![false; value.chars().count()];
    Shuffles::new(value, frozen).next_shuffle()
}

/// [`scramble`] adjusted so the output is still recognized as the same span
///
/// - Card numbers keep their grouping and get a fresh Luhn check digit.
/// - Addresses keep every suffix word in place, and no other word may turn
///   into one.
pub fn scramble_as(pii_type: PiiType, value: &str) -> String {
    match pii_type {
        PiiType::CreditCard => scramble_card(value),
        PiiType::Address => scramble_address(value),
        _ => scramble(value),
    }
}

fn scramble_card(value: &str) -> String {
    let Some(check_at) = value.rfind(|c: char| c.is_ascii_digit()) else {
        return scramble(value);
    };
    let payload = scramble(&value[..check_at]);

    let sum: u32 = payload
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| match (i % 2 == 0, d * 2) {
            (true, doubled) if doubled > 9 => doubled - 9,
            (true, doubled) => doubled,
            (false, _) => d,
        })
        .sum();
    let check = (10 - sum % 10) % 10;

    format!("{}{}{}", payload, check, &value[check_at + 1..])
}

/// Which whitespace-separated words of `value` could end an address match
fn suffix_layout(value: &str) -> Vec<bool> {
    value.split_whitespace().map(ends_address).collect()
}

fn scramble_address(value: &str) -> String {
    // Suffix words and whitespace stay where they are
    let mut frozen = Vec::with_capacity(value.len());
    let mut word = String::new();
    for c in value.chars().chain(std::iter::once(' ')) {
        if c.is_whitespace() {
            frozen.extend(std::iter::repeat_n(ends_address(&word), word.chars().count()));
            frozen.push(true);
            word.clear();
        } else {
            word.push(c);
        }
    }
    frozen.pop();

    let layout = suffix_layout(value);
    let mut shuffles = Shuffles::new(value, frozen);
    (0..ADDRESS_SHUFFLES)
        .map(|_| shuffles.next_shuffle())
        .find(|candidate| suffix_layout(candidate) == layout)
        .unwrap_or_else(|| value.to_string())
}
