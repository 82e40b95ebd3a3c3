//! Error types for the carteira-core library.
//!
//! Extraction itself never fails: unreadable text simply yields empty fields.
//! Errors only arise while building the operator registry or loading
//! configuration, both of which happen once at startup.

use thiserror::Error;

/// Main error type for the carteira library.
#[derive(Error, Debug)]
pub enum CarteiraError {
    /// Operator registry could not be built.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building an operator registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A profile declares no detection patterns and could never be matched.
    #[error("operator {operator:?} declares no detection patterns")]
    NoDetectionPatterns { operator: String },

    /// A profile declares no card number rules.
    #[error("operator {operator:?} declares no number rules")]
    NoNumberRules { operator: String },

    /// Two profiles share the same operator name.
    #[error("operator {operator:?} is registered more than once")]
    DuplicateOperator { operator: String },

    /// A pattern failed to compile.
    #[error("invalid pattern in rule {rule_id}: {reason}")]
    InvalidPattern { rule_id: String, reason: String },

    /// A number rule has an empty or inverted digit range.
    #[error("invalid digit bounds in rule {rule_id}: {min}..={max}")]
    InvalidBounds { rule_id: String, min: usize, max: usize },
}

/// Result type for the carteira library.
pub type Result<T> = std::result::Result<T, CarteiraError>;
