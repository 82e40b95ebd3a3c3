//! Configuration structures for the extraction pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CarteiraError, Result};

/// Main configuration for carteira.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarteiraConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output configuration for hosts that render results.
    pub output: OutputConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Run the cross-provider fallback rules when operator rules find nothing.
    pub generic_fallback: bool,

    /// Record lower-priority rules that also matched after a field was accepted.
    pub trace_shadowed_rules: bool,

    /// Minimum plan name length after normalization.
    pub min_plan_length: usize,

    /// JSON file with additional operator profiles, appended after the built-in ones.
    pub extra_profiles: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            generic_fallback: true,
            trace_shadowed_rules: true,
            min_plan_length: 3,
            extra_profiles: None,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (json, csv, text).
    pub format: String,

    /// Print the rule trace along with the fields.
    pub include_trace: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            include_trace: false,
        }
    }
}

impl CarteiraConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that serde alone cannot reject.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.min_plan_length == 0 {
            return Err(CarteiraError::Config(
                "extraction.min_plan_length must be at least 1".to_string(),
            ));
        }

        match self.output.format.as_str() {
            "json" | "csv" | "text" => Ok(()),
            other => Err(CarteiraError::Config(format!(
                "unknown output.format {other:?} (expected json, csv or text)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CarteiraConfig =
            serde_json::from_str(r#"{"extraction":{"generic_fallback":false}}"#).unwrap();

        assert!(!config.extraction.generic_fallback);
        assert!(config.extraction.trace_shadowed_rules);
        assert_eq!(config.extraction.min_plan_length, 3);
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut config = CarteiraConfig::default();
        config.output.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(CarteiraError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_plan_length() {
        let mut config = CarteiraConfig::default();
        config.extraction.min_plan_length = 0;
        assert!(config.validate().is_err());
    }
}
