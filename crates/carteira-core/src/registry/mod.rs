//! Operator registry: the ordered, immutable table of operator profiles.
//!
//! Profiles are authored as plain data ([`ProfileSpec`]) and compiled once
//! into an [`OperatorRegistry`]. Order matters: detection picks the first
//! profile with any matching pattern, so more specific operators must come
//! before ones whose patterns are generic substrings.

mod builtin;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;

pub use builtin::{builtin_profiles, fallback_number_rules, fallback_plan_rules};

/// How the capture groups of a number rule become a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupJoin {
    /// Concatenate every participating capture group in capture order.
    #[default]
    Concat,
    /// Use the whole match, ignoring groups.
    Whole,
}

/// Which part of a plan rule match becomes the plan name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCapture {
    /// A numbered capture group, typically the text after a label.
    Group(usize),
    /// The matched keyword itself.
    Keyword,
}

/// Authoring form of a number rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRuleSpec {
    pub id: String,
    pub description: String,
    pub pattern: String,
    #[serde(default)]
    pub group_join: GroupJoin,
    pub min_digits: usize,
    pub max_digits: usize,
    /// Flag accepted 8-digit values that also read as a DDMMYYYY date.
    #[serde(default)]
    pub date_like_warning: bool,
}

/// Authoring form of a plan rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRuleSpec {
    pub id: String,
    pub description: String,
    pub pattern: String,
    pub capture: PlanCapture,
}

/// Authoring form of an operator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    /// Display name, e.g. "Bradesco Saúde".
    pub name: String,
    /// Short identifier used as a rule id prefix.
    pub key: String,
    /// Patterns tested against the uppercased, whitespace-collapsed text.
    pub detection_patterns: Vec<String>,
    pub number_rules: Vec<NumberRuleSpec>,
    #[serde(default)]
    pub plan_rules: Vec<PlanRuleSpec>,
}

/// A compiled number rule.
#[derive(Debug, Clone)]
pub struct NumberRule {
    pub id: String,
    pub description: String,
    pub pattern: Regex,
    pub group_join: GroupJoin,
    pub min_digits: usize,
    pub max_digits: usize,
    pub date_like_warning: bool,
}

impl NumberRule {
    fn compile(spec: NumberRuleSpec) -> Result<Self, RegistryError> {
        if spec.min_digits == 0 || spec.min_digits > spec.max_digits {
            return Err(RegistryError::InvalidBounds {
                rule_id: spec.id,
                min: spec.min_digits,
                max: spec.max_digits,
            });
        }

        let pattern = compile_pattern(&spec.id, &spec.pattern)?;

        Ok(Self {
            id: spec.id,
            description: spec.description,
            pattern,
            group_join: spec.group_join,
            min_digits: spec.min_digits,
            max_digits: spec.max_digits,
            date_like_warning: spec.date_like_warning,
        })
    }
}

/// A compiled plan rule.
#[derive(Debug, Clone)]
pub struct PlanRule {
    pub id: String,
    pub description: String,
    pub pattern: Regex,
    pub capture: PlanCapture,
}

impl PlanRule {
    fn compile(spec: PlanRuleSpec) -> Result<Self, RegistryError> {
        let pattern = compile_pattern(&spec.id, &spec.pattern)?;

        if let PlanCapture::Group(group) = spec.capture {
            // captures_len counts the implicit whole-match group
            if group == 0 || group >= pattern.captures_len() {
                return Err(RegistryError::InvalidPattern {
                    rule_id: spec.id,
                    reason: format!("capture group {group} does not exist"),
                });
            }
        }

        Ok(Self {
            id: spec.id,
            description: spec.description,
            pattern,
            capture: spec.capture,
        })
    }
}

/// A compiled operator profile.
#[derive(Debug, Clone)]
pub struct OperatorProfile {
    pub name: String,
    pub key: String,
    pub detection_patterns: Vec<Regex>,
    pub number_rules: Vec<NumberRule>,
    pub plan_rules: Vec<PlanRule>,
}

impl OperatorProfile {
    fn compile(spec: ProfileSpec) -> Result<Self, RegistryError> {
        if spec.detection_patterns.is_empty() {
            return Err(RegistryError::NoDetectionPatterns { operator: spec.name });
        }
        if spec.number_rules.is_empty() {
            return Err(RegistryError::NoNumberRules { operator: spec.name });
        }

        let detect_id = format!("{}.detect", spec.key);
        let detection_patterns = spec
            .detection_patterns
            .iter()
            .map(|p| compile_pattern(&detect_id, p))
            .collect::<Result<Vec<_>, _>>()?;

        let number_rules = spec
            .number_rules
            .into_iter()
            .map(NumberRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let plan_rules = spec
            .plan_rules
            .into_iter()
            .map(PlanRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec.name,
            key: spec.key,
            detection_patterns,
            number_rules,
            plan_rules,
        })
    }

    /// Rule id used in detection trace entries.
    pub fn detection_rule_id(&self) -> String {
        format!("{}.detect", self.key)
    }
}

/// The ordered operator table plus the generic fallback rules.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    profiles: Vec<OperatorProfile>,
    fallback_number_rules: Vec<NumberRule>,
    fallback_plan_rules: Vec<PlanRule>,
}

lazy_static! {
    static ref BUILTIN: Arc<OperatorRegistry> = Arc::new(
        OperatorRegistry::build(builtin_profiles()).expect("built-in operator profiles are valid")
    );
}

impl OperatorRegistry {
    /// Build a registry from profile specs, using the standard fallback rules.
    pub fn build(profiles: Vec<ProfileSpec>) -> Result<Self, RegistryError> {
        Self::build_with_fallbacks(profiles, fallback_number_rules(), fallback_plan_rules())
    }

    /// Build a registry with explicit fallback rules.
    pub fn build_with_fallbacks(
        profiles: Vec<ProfileSpec>,
        number_fallbacks: Vec<NumberRuleSpec>,
        plan_fallbacks: Vec<PlanRuleSpec>,
    ) -> Result<Self, RegistryError> {
        let profiles = profiles
            .into_iter()
            .map(OperatorProfile::compile)
            .collect::<Result<Vec<_>, _>>()?;
        check_unique_names(&profiles)?;

        let fallback_number_rules = number_fallbacks
            .into_iter()
            .map(NumberRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let fallback_plan_rules = plan_fallbacks
            .into_iter()
            .map(PlanRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Built operator registry: {} profiles, {} number fallbacks, {} plan fallbacks",
            profiles.len(),
            fallback_number_rules.len(),
            fallback_plan_rules.len()
        );

        Ok(Self {
            profiles,
            fallback_number_rules,
            fallback_plan_rules,
        })
    }

    /// The process-wide registry of built-in operators.
    pub fn builtin() -> Arc<OperatorRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// A new registry with extra profiles appended after the existing ones.
    pub fn extend(&self, extra: Vec<ProfileSpec>) -> Result<Self, RegistryError> {
        let mut profiles = self.profiles.clone();
        for spec in extra {
            profiles.push(OperatorProfile::compile(spec)?);
        }
        check_unique_names(&profiles)?;

        Ok(Self {
            profiles,
            fallback_number_rules: self.fallback_number_rules.clone(),
            fallback_plan_rules: self.fallback_plan_rules.clone(),
        })
    }

    pub fn profiles(&self) -> &[OperatorProfile] {
        &self.profiles
    }

    pub fn fallback_number_rules(&self) -> &[NumberRule] {
        &self.fallback_number_rules
    }

    pub fn fallback_plan_rules(&self) -> &[PlanRule] {
        &self.fallback_plan_rules
    }

    /// Look up a profile by display name.
    pub fn profile(&self, name: &str) -> Option<&OperatorProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Parse profile specs from JSON (an array of profiles).
pub fn profiles_from_json(json: &str) -> crate::Result<Vec<ProfileSpec>> {
    Ok(serde_json::from_str(json)?)
}

/// Load profile specs from a JSON file.
pub fn load_profiles(path: &Path) -> crate::Result<Vec<ProfileSpec>> {
    let content = std::fs::read_to_string(path)?;
    profiles_from_json(&content)
}

fn compile_pattern(rule_id: &str, pattern: &str) -> Result<Regex, RegistryError> {
    Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern {
        rule_id: rule_id.to_string(),
        reason: e.to_string(),
    })
}

fn check_unique_names(profiles: &[OperatorProfile]) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for profile in profiles {
        if !seen.insert(profile.name.as_str()) {
            return Err(RegistryError::DuplicateOperator {
                operator: profile.name.clone(),
            });
        }
    }
    Ok(())
}
