//! piiscrub PII detection and transformation engine
//!
//! This crate scans JSON table rows for personal data and rewrites it:
//! - Name, email, phone, SSN, credit card and street address recognizers
//! - Luhn and SSN validators
//! - Policy-driven actions (mask, tokenize, redact, scramble)
//! - Deterministic HMAC tokens and a per-row audit trail

pub mod action;
pub mod error;
pub mod guard;
pub mod policy;
pub mod recognizer;
pub mod sanitizer;
pub mod tokenizer;
pub mod validators;

pub use action::{Action, apply};
pub use error::{Error, Result};
pub use policy::{Policy, Resolution};
pub use recognizer::{FieldContext, Match, PiiType, Recognizer, RecognizerSet};
pub use sanitizer::{AuditEvent, Row, SanitizeOutput, Sanitizer, sanitize};
pub use tokenizer::token;
pub use validators::{is_valid_luhn, is_valid_ssn};
