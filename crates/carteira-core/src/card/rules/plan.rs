//! Plan name extraction.

use tracing::debug;

use super::disambiguate::check_plan;
use super::normalize::{normalize_plan_name, trim_plan_punctuation, truncate_at_label};
use super::{shadowed_reason, FieldExtraction, FieldExtractor};
use crate::models::card::{ExtractionCandidate, FieldKind, Outcome, TraceEntry};
use crate::registry::{OperatorProfile, OperatorRegistry, PlanCapture, PlanRule};

/// Default minimum plan name length.
pub const MIN_PLAN_LENGTH: usize = 3;

/// Plan name extractor.
///
/// Accepted values keep their original casing; they are meant for display.
pub struct PlanExtractor<'r> {
    fallback_rules: &'r [PlanRule],
    generic_fallback: bool,
    trace_shadowed: bool,
    min_length: usize,
}

impl<'r> PlanExtractor<'r> {
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self {
            fallback_rules: registry.fallback_plan_rules(),
            generic_fallback: true,
            trace_shadowed: true,
            min_length: MIN_PLAN_LENGTH,
        }
    }

    pub fn with_generic_fallback(mut self, enabled: bool) -> Self {
        self.generic_fallback = enabled;
        self
    }

    pub fn with_shadow_tracing(mut self, enabled: bool) -> Self {
        self.trace_shadowed = enabled;
        self
    }

    /// Set the minimum accepted plan name length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    fn rules<'a>(&'a self, profile: Option<&'a OperatorProfile>) -> impl Iterator<Item = &'a PlanRule> {
        let fallback: &'a [PlanRule] = if self.generic_fallback {
            self.fallback_rules
        } else {
            &[]
        };

        profile
            .map(|p| p.plan_rules.as_slice())
            .unwrap_or_default()
            .iter()
            .chain(fallback)
    }

    fn try_rule(&self, rule: &PlanRule, text: &str, trace: &mut Vec<TraceEntry>) -> Option<ExtractionCandidate> {
        let mut matched = false;

        for caps in rule.pattern.captures_iter(text) {
            let Some(raw) = plan_text(&caps, rule.capture) else {
                continue;
            };
            matched = true;

            let value = normalize_plan_name(trim_plan_punctuation(raw));
            match check_plan(&value, self.min_length) {
                Ok(()) => {
                    trace.push(
                        entry(rule, Outcome::Accepted, format!("plan name {value:?}")).with_raw_match(raw),
                    );
                    return Some(ExtractionCandidate {
                        raw_match: raw.to_string(),
                        normalized_value: value,
                        rule_id: rule.id.clone(),
                        field_kind: FieldKind::Plan,
                    });
                }
                Err(rejection) => {
                    debug!("Rule {} rejected {:?}: {}", rule.id, raw, rejection);
                    trace.push(entry(rule, Outcome::RejectedShape, rejection.to_string()).with_raw_match(raw));
                }
            }
        }

        if !matched {
            trace.push(entry(rule, Outcome::NoMatch, "pattern did not match"));
        }

        None
    }
}

impl FieldExtractor for PlanExtractor<'_> {
    fn field_kind(&self) -> FieldKind {
        FieldKind::Plan
    }

    fn extract(&self, text: &str, profile: Option<&OperatorProfile>) -> FieldExtraction {
        let mut result = FieldExtraction::default();

        for rule in self.rules(profile) {
            let Some(accepted) = &result.candidate else {
                result.candidate = self.try_rule(rule, text, &mut result.trace);
                continue;
            };
            if !self.trace_shadowed {
                break;
            }

            if let Some(raw) = rule
                .pattern
                .captures(text)
                .and_then(|caps| plan_text(&caps, rule.capture))
            {
                result.trace.push(
                    entry(
                        rule,
                        Outcome::RejectedLowerPriorityAlreadyAccepted,
                        shadowed_reason(&accepted.rule_id),
                    )
                    .with_raw_match(raw),
                );
            }
        }

        if let Some(candidate) = &result.candidate {
            debug!("Plan {:?} accepted by {}", candidate.normalized_value, candidate.rule_id);
        }

        result
    }
}

/// Extract a plan name using the built-in registry's fallback rules.
pub fn extract_plan(text: &str, profile: Option<&OperatorProfile>) -> (Option<String>, Vec<TraceEntry>) {
    let registry = OperatorRegistry::builtin();
    PlanExtractor::new(&registry).extract(text, profile).into_parts()
}

/// The matched plan text, cut at the next field label for label captures.
fn plan_text<'t>(caps: &regex::Captures<'t>, capture: PlanCapture) -> Option<&'t str> {
    match capture {
        PlanCapture::Keyword => caps.get(0).map(|m| m.as_str()),
        PlanCapture::Group(group) => caps.get(group).map(|m| truncate_at_label(m.as_str())),
    }
}

fn entry(rule: &PlanRule, outcome: Outcome, reason: impl Into<String>) -> TraceEntry {
    TraceEntry::new(FieldKind::Plan, rule.id.clone(), rule.description.clone(), outcome, reason)
}
