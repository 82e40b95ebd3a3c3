//! Core library for health-insurance card OCR text.
//!
//! This crate provides:
//! - An ordered registry of insurance operator profiles (Bradesco Saúde,
//!   Unimed, Amil, SulAmérica, Hapvida, NotreDame Intermédica)
//! - Operator detection, card number and plan name extraction with
//!   generic fallbacks for unrecognized cards
//! - A per-rule trace of every extraction and a registry coverage report
//!
//! ```
//! let result = carteira_core::extract("UNIMED\nNÚMERO: 1234.5678.9012.3456\nPLANO: FEDERAL EXECUTIVO");
//! assert_eq!(result.operator_name.as_deref(), Some("Unimed"));
//! assert_eq!(result.card_number.as_deref(), Some("1234567890123456"));
//! ```

pub mod card;
pub mod error;
pub mod models;
pub mod registry;

pub use card::{render_trace, CardExtractor, CardParser, CoverageReport, OperatorCoverage};
pub use error::{CarteiraError, RegistryError, Result};
pub use models::card::{ExtractionCandidate, ExtractionResult, FieldKind, Outcome, TraceEntry};
pub use models::config::CarteiraConfig;
pub use registry::{OperatorProfile, OperatorRegistry, ProfileSpec};

/// Extract card fields with the built-in registry and default settings.
pub fn extract(text: &str) -> ExtractionResult {
    CardParser::new().parse(text)
}

/// Coverage report of the built-in registry.
pub fn coverage_report() -> CoverageReport {
    CoverageReport::from_registry(&OperatorRegistry::builtin())
}
