//! Rule-based field extractors for insurance card text.

pub mod detector;
pub mod disambiguate;
pub mod normalize;
pub mod number;
pub mod patterns;
pub mod plan;

pub use detector::{detect, Detection, OperatorDetector};
pub use disambiguate::{check_number, check_plan, Rejection};
pub use normalize::{normalize_number, normalize_plan_name, to_detection_form};
pub use number::{extract_number, NumberExtractor};
pub use plan::{extract_plan, PlanExtractor};

use crate::models::card::{ExtractionCandidate, FieldKind, TraceEntry};
use crate::registry::OperatorProfile;

/// Trait for card field extractors.
///
/// Implementations try the profile's rules first, then the generic
/// fallbacks, and stop at the first accepted candidate.
pub trait FieldExtractor {
    /// The field this extractor fills.
    fn field_kind(&self) -> FieldKind;

    /// Extract the field from raw card text.
    fn extract(&self, text: &str, profile: Option<&OperatorProfile>) -> FieldExtraction;
}

/// Outcome of one field extraction: the accepted candidate and the trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldExtraction {
    pub candidate: Option<ExtractionCandidate>,
    pub trace: Vec<TraceEntry>,
}

impl FieldExtraction {
    /// The accepted value, if any.
    pub fn value(&self) -> Option<&str> {
        self.candidate.as_ref().map(|c| c.normalized_value.as_str())
    }

    /// Split into the accepted value and the trace.
    pub fn into_parts(self) -> (Option<String>, Vec<TraceEntry>) {
        (self.candidate.map(|c| c.normalized_value), self.trace)
    }
}

/// Reason recorded for a rule that matched after its field was already filled.
pub(crate) fn shadowed_reason(accepted_rule: &str) -> String {
    format!("also matches, but {accepted_rule} was accepted first")
}
