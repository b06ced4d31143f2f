//! Sanitization policy and action resolution

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::action::Action;
use crate::recognizer::{Match, PiiType};

/// Which action applies to which match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Action for types without a per-type entry
    pub default_action: Action,

    /// Per-type actions
    pub per_type_action: HashMap<PiiType, Action>,

    /// Action forced on every type for one request
    pub per_request_override: Option<Action>,

    /// Column name → type of data the column holds
    pub column_hints: HashMap<String, PiiType>,

    /// Exact values that are never transformed
    pub allowlist: BTreeSet<String>,

    /// Exact values that are always redacted
    pub denylist: BTreeSet<String>,

    /// Look for names in every field, not just name columns
    pub detect_names_in_free_text: bool,
}

impl Default for Policy {
    fn default() -> Self {
        let per_type_action = HashMap::from([
            (PiiType::Name, Action::Tokenize),
            (PiiType::Email, Action::Tokenize),
            (PiiType::Phone, Action::Mask),
            (PiiType::Ssn, Action::Redact),
            (PiiType::CreditCard, Action::Mask),
            (PiiType::Address, Action::Mask),
        ]);

        let column_hints = [
            ("name", PiiType::Name),
            ("full_name", PiiType::Name),
            ("email", PiiType::Email),
            ("phone", PiiType::Phone),
            ("ssn", PiiType::Ssn),
            ("address", PiiType::Address),
        ]
        .into_iter()
        .map(|(column, pii_type)| (column.to_string(), pii_type))
        .collect();

        Self {
            default_action: Action::Mask,
            per_type_action,
            per_request_override: None,
            column_hints,
            allowlist: BTreeSet::new(),
            denylist: BTreeSet::new(),
            detect_names_in_free_text: false,
        }
    }
}

/// Outcome of resolving a match against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Leave the value alone and record nothing
    Allow,

    /// Replace the value using this action
    Apply(Action),
}

impl Policy {
    /// A policy with no per-type entries, hints or lists
    pub fn empty(default_action: Action) -> Self {
        Self {
            default_action,
            per_type_action: HashMap::new(),
            per_request_override: None,
            column_hints: HashMap::new(),
            allowlist: BTreeSet::new(),
            denylist: BTreeSet::new(),
            detect_names_in_free_text: false,
        }
    }

    /// Copy of this policy with a per-request override set
    pub fn with_override(&self, action: Option<Action>) -> Self {
        let mut policy = self.clone();
        policy.per_request_override = action;
        policy
    }

    /// Type hint for a column, if any
    pub fn hint_for(&self, column: &str) -> Option<PiiType> {
        self.column_hints.get(column).copied()
    }

    /// Action for a type, ignoring allow and deny lists
    pub fn action_for(&self, pii_type: PiiType) -> Action {
        if let Some(action) = self.per_request_override {
            return action;
        }
        self.per_type_action
            .get(&pii_type)
            .copied()
            .unwrap_or(self.default_action)
    }

    /// Decide what happens to a match
    ///
    /// The allowlist is consulted first, so a value on both lists is left
    /// untouched. A denylisted value is redacted whatever the per-type or
    /// per-request action says.
    pub fn resolve(&self, m: &Match) -> Resolution {
        if self.allowlist.contains(&m.raw_value) {
            return Resolution::Allow;
        }
        if self.denylist.contains(&m.raw_value) {
            return Resolution::Apply(Action::Redact);
        }
        Resolution::Apply(self.action_for(m.pii_type))
    }

    /// Whether any match could end up tokenized under this policy
    pub fn may_tokenize(&self) -> bool {
        match self.per_request_override {
            Some(action) => action == Action::Tokenize,
            None => {
                self.default_action == Action::Tokenize
                    || self.per_type_action.values().any(|a| *a == Action::Tokenize)
            }
        }
    }
}
