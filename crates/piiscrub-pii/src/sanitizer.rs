//! Row sanitizer
//!
//! Walks every string field of every row, runs the recognizers, resolves one
//! action per surviving match, splices the replacements in and records an
//! audit event for each one.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Reverse;
use tracing::{debug, info};

use crate::action::{self, Action};
use crate::error::{Error, Result};
use crate::guard::looks_sanitized;
use crate::policy::{Policy, Resolution};
use crate::recognizer::{FieldContext, Match, PiiType, RecognizerSet};

/// A table row: column name to JSON value, in column order
pub type Row = serde_json::Map<String, Value>;

static STANDARD_RECOGNIZERS: Lazy<RecognizerSet> = Lazy::new(RecognizerSet::standard);

/// One applied transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Column the value was found in
    pub column: String,

    /// Type of PII replaced
    #[serde(rename = "type")]
    pub pii_type: PiiType,

    /// Action applied
    pub action: Action,

    /// Short excerpt of the original value
    pub original_preview: String,

    /// Short excerpt of the replacement
    pub replacement_preview: String,
}

/// Result of a sanitize call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizeOutput {
    /// Sanitized rows, one per input row
    pub data: Vec<Value>,

    /// Audit events per input row, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Vec<Vec<AuditEvent>>>,
}

/// Sanitize rows under a policy
///
/// Entries that are not JSON objects are passed through unchanged with an
/// empty audit list. Fails with [`Error::Configuration`] before touching any
/// row when the policy can tokenize and `secret` is missing or empty.
pub fn sanitize(
    rows: &[Value],
    policy: &Policy,
    secret: Option<&str>,
    return_audit: bool,
) -> Result<SanitizeOutput> {
    Engine {
        recognizers: &STANDARD_RECOGNIZERS,
        policy,
        secret,
    }
    .run(rows, return_audit)
}

/// A configured sanitizer holding a base policy and the tokenization secret
pub struct Sanitizer {
    policy: Policy,
    secret: Option<String>,
    recognizers: RecognizerSet,
}

impl Sanitizer {
    pub fn new(policy: Policy, secret: Option<String>) -> Self {
        Self {
            policy,
            secret: secret.filter(|s| !s.is_empty()),
            recognizers: RecognizerSet::standard(),
        }
    }

    /// Use a custom recognizer set
    pub fn with_recognizers(mut self, recognizers: RecognizerSet) -> Self {
        self.recognizers = recognizers;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Sanitize rows, optionally forcing one action on every type
    pub fn sanitize(
        &self,
        rows: &[Value],
        method: Option<Action>,
        return_audit: bool,
    ) -> Result<SanitizeOutput> {
        let policy = match method {
            Some(_) => Cow::Owned(self.policy.with_override(method)),
            None => Cow::Borrowed(&self.policy),
        };

        self.engine(&policy).run(rows, return_audit)
    }

    /// Sanitize a single row under the base policy
    pub fn sanitize_row(&self, row: &Row) -> Result<(Row, Vec<AuditEvent>)> {
        let engine = self.engine(&self.policy);
        engine.check_secret()?;
        engine.row(row)
    }

    fn engine<'a>(&'a self, policy: &'a Policy) -> Engine<'a> {
        Engine {
            recognizers: &self.recognizers,
            policy,
            secret: self.secret.as_deref(),
        }
    }
}

struct Engine<'a> {
    recognizers: &'a RecognizerSet,
    policy: &'a Policy,
    secret: Option<&'a str>,
}

impl Engine<'_> {
    fn check_secret(&self) -> Result<()> {
        if self.policy.may_tokenize() && self.secret.is_none_or(str::is_empty) {
            return Err(Error::missing_secret());
        }
        Ok(())
    }

    fn run(&self, rows: &[Value], return_audit: bool) -> Result<SanitizeOutput> {
        self.check_secret()?;

        let mut data = Vec::with_capacity(rows.len());
        let mut audit = Vec::with_capacity(rows.len());

        for value in rows {
            match value.as_object() {
                Some(row) => {
                    let (sanitized, events) = self.row(row)?;
                    data.push(Value::Object(sanitized));
                    audit.push(events);
                }
                None => {
                    debug!("Skipping non-object row");
                    data.push(value.clone());
                    audit.push(Vec::new());
                }
            }
        }

        let events: usize = audit.iter().map(Vec::len).sum();
        info!(rows = data.len(), events, "Sanitized batch");

        Ok(SanitizeOutput {
            data,
            audit: return_audit.then_some(audit),
        })
    }

    fn row(&self, row: &Row) -> Result<(Row, Vec<AuditEvent>)> {
        let mut sanitized = Row::with_capacity(row.len());
        let mut events = Vec::new();

        for (column, value) in row {
            let replaced = match value {
                Value::String(text) => self
                    .field(column, text, &mut events)?
                    .map(Value::String),
                _ => None,
            };
            sanitized.insert(column.clone(), replaced.unwrap_or_else(|| value.clone()));
        }

        Ok((sanitized, events))
    }

    /// Returns the rewritten text, or `None` when the field is left as is
    fn field(
        &self,
        column: &str,
        text: &str,
        events: &mut Vec<AuditEvent>,
    ) -> Result<Option<String>> {
        if text.trim().is_empty() || looks_sanitized(text) {
            return Ok(None);
        }

        let hint = self.policy.hint_for(column);
        let ctx = FieldContext::new(column)
            .with_hint(hint)
            .with_free_text_names(self.policy.detect_names_in_free_text);
        let matches = select_non_overlapping(self.recognizers.recognize_all(text, &ctx), hint);

        let mut replacements = Vec::with_capacity(matches.len());
        for m in matches {
            let action = match self.policy.resolve(&m) {
                Resolution::Allow => continue,
                Resolution::Apply(action) => action,
            };
            let replacement = action::apply(m.pii_type, &m.raw_value, action, self.secret)?;

            debug!(column, pii_type = %m.pii_type, %action, "Replaced match");
            events.push(AuditEvent {
                column: column.to_string(),
                pii_type: m.pii_type,
                action,
                original_preview: preview(&m.raw_value),
                replacement_preview: preview(&replacement),
            });
            replacements.push((m, replacement));
        }

        if replacements.is_empty() {
            return Ok(None);
        }

        // Right to left keeps earlier offsets valid
        let mut out = text.to_string();
        for (m, replacement) in replacements.iter().rev() {
            out.replace_range(m.start..m.end, replacement);
        }
        Ok(Some(out))
    }
}

/// Resolve overlaps between matches of different types
///
/// Earliest start wins; at equal starts the longer match wins, then the
/// column's hinted type, then name > address > credit_card > ssn > email >
/// phone. A match starting inside an already claimed span is dropped.
pub fn select_non_overlapping(mut matches: Vec<Match>, hint: Option<PiiType>) -> Vec<Match> {
    matches.sort_by_key(|m| {
        (
            m.start,
            Reverse(m.len()),
            Some(m.pii_type) != hint,
            m.pii_type.priority(),
        )
    });

    let mut kept: Vec<Match> = Vec::with_capacity(matches.len());
    let mut claimed_end = 0;
    for m in matches {
        if !kept.is_empty() && m.start < claimed_end {
            continue;
        }
        claimed_end = m.end;
        kept.push(m);
    }
    kept
}

/// Short excerpt that never reveals a whole value
///
/// Values of five or more characters keep their first and last two; shorter
/// ones keep at most the first character.
pub fn preview(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => String::new(),
        1..=2 => "…".to_string(),
        3..=4 => format!("{}…", chars[0]),
        n => format!("{}{}…{}{}", chars[0], chars[1], chars[n - 2], chars[n - 1]),
    }
}
