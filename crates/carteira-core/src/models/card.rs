//! Card extraction data models.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Number of fields an extraction tries to fill.
pub const FIELD_COUNT: usize = 3;

/// The card field a rule or candidate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Issuing insurance operator.
    Operator,
    /// Member/card number.
    Number,
    /// Plan name.
    Plan,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Operator => write!(f, "operator"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Plan => write!(f, "plan"),
        }
    }
}

/// What happened when a rule was tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Candidate passed every filter and became the field value.
    #[serde(rename = "accepted")]
    Accepted,
    /// Candidate matched but failed a shape/length filter.
    #[serde(rename = "rejected-shape")]
    RejectedShape,
    /// Rule matched, but a higher-priority rule had already filled the field.
    #[serde(rename = "rejected-lowerPriorityAlreadyAccepted")]
    RejectedLowerPriorityAlreadyAccepted,
    /// Rule did not match anything.
    #[serde(rename = "no-match")]
    NoMatch,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Accepted => "accepted",
            Outcome::RejectedShape => "rejected-shape",
            Outcome::RejectedLowerPriorityAlreadyAccepted => "rejected-lowerPriorityAlreadyAccepted",
            Outcome::NoMatch => "no-match",
        };
        f.write_str(label)
    }
}

/// A value produced by one rule, before or after filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    /// Exact substring the rule matched.
    pub raw_match: String,
    /// Value after normalization.
    pub normalized_value: String,
    /// Rule that produced the candidate.
    pub rule_id: String,
    /// Field the candidate is for.
    pub field_kind: FieldKind,
}

/// One diagnostic record of a rule attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub field_kind: FieldKind,
    pub rule_id: String,
    /// Human-readable description of the pattern tried.
    pub attempted_pattern: String,
    pub outcome: Outcome,
    /// Free-text explanation, e.g. "looked like a date".
    pub reason: String,
    /// Matched text, when the rule matched anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_match: Option<String>,
}

impl TraceEntry {
    pub fn new(
        field_kind: FieldKind,
        rule_id: impl Into<String>,
        attempted_pattern: impl Into<String>,
        outcome: Outcome,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field_kind,
            rule_id: rule_id.into(),
            attempted_pattern: attempted_pattern.into(),
            outcome,
            reason: reason.into(),
            raw_match: None,
        }
    }

    pub fn with_raw_match(mut self, raw: impl Into<String>) -> Self {
        self.raw_match = Some(raw.into());
        self
    }
}

/// Fields extracted from one card text, plus the trace of how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractionResult {
    /// Display name of the detected operator.
    pub operator_name: Option<String>,
    /// Card number, digits only.
    pub card_number: Option<String>,
    /// Plan name in its original casing.
    pub plan_name: Option<String>,
    /// Every rule attempt, in evaluation order.
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl ExtractionResult {
    /// Number of fields that were extracted.
    pub fn filled_fields(&self) -> usize {
        [
            self.operator_name.is_some(),
            self.card_number.is_some(),
            self.plan_name.is_some(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }

    /// Share of extracted fields (0.0 - 1.0).
    pub fn completeness(&self) -> f64 {
        self.filled_fields() as f64 / FIELD_COUNT as f64
    }

    /// The accepted trace entry for a field, if any.
    pub fn accepted(&self, kind: FieldKind) -> Option<&TraceEntry> {
        self.trace
            .iter()
            .find(|e| e.field_kind == kind && e.outcome == Outcome::Accepted)
    }

    /// Trace entries for one field.
    pub fn trace_for(&self, kind: FieldKind) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter().filter(move |e| e.field_kind == kind)
    }
}

// `completeness` is derived on the way out so it can never drift from the fields.
impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExtractionResult", 5)?;
        state.serialize_field("operator_name", &self.operator_name)?;
        state.serialize_field("card_number", &self.card_number)?;
        state.serialize_field("plan_name", &self.plan_name)?;
        state.serialize_field("completeness", &self.completeness())?;
        state.serialize_field("trace", &self.trace)?;
        state.end()
    }
}
