//! Data models for card extraction.

pub mod card;
pub mod config;

pub use card::{ExtractionCandidate, ExtractionResult, FieldKind, Outcome, TraceEntry};
pub use config::{CarteiraConfig, ExtractionConfig, OutputConfig};
