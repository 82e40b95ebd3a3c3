//! Insurance card field extraction module.

mod parser;
pub mod report;
pub mod rules;

pub use parser::CardParser;
pub use report::{render_trace, CoverageReport, OperatorCoverage};

use crate::models::card::ExtractionResult;

/// Trait for card field extractors hosts program against.
pub trait CardExtractor {
    /// Extract operator, card number and plan name from OCR text.
    fn extract(&self, text: &str) -> ExtractionResult;
}
