//! Card number extraction.

use tracing::debug;

use super::disambiguate::check_number;
use super::normalize::{candidate_span, join_groups, normalize_number};
use super::{shadowed_reason, FieldExtraction, FieldExtractor};
use crate::models::card::{ExtractionCandidate, FieldKind, Outcome, TraceEntry};
use crate::registry::{NumberRule, OperatorProfile, OperatorRegistry};

/// Card number extractor.
///
/// Tries the operator's own number rules, then the generic label-anchored
/// rule, then the unlabeled digit-run rule.
pub struct NumberExtractor<'r> {
    fallback_rules: &'r [NumberRule],
    generic_fallback: bool,
    trace_shadowed: bool,
}

impl<'r> NumberExtractor<'r> {
    /// Create an extractor using the registry's fallback rules.
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self {
            fallback_rules: registry.fallback_number_rules(),
            generic_fallback: true,
            trace_shadowed: true,
        }
    }

    /// Set whether the generic fallback rules run.
    pub fn with_generic_fallback(mut self, enabled: bool) -> Self {
        self.generic_fallback = enabled;
        self
    }

    /// Set whether rules shadowed by an accepted one are traced.
    pub fn with_shadow_tracing(mut self, enabled: bool) -> Self {
        self.trace_shadowed = enabled;
        self
    }

    fn rules<'a>(&'a self, profile: Option<&'a OperatorProfile>) -> impl Iterator<Item = &'a NumberRule> {
        let fallback: &'a [NumberRule] = if self.generic_fallback {
            self.fallback_rules
        } else {
            &[]
        };

        profile
            .map(|p| p.number_rules.as_slice())
            .unwrap_or_default()
            .iter()
            .chain(fallback)
    }

    fn try_rule(&self, rule: &NumberRule, text: &str, trace: &mut Vec<TraceEntry>) -> Option<ExtractionCandidate> {
        let mut matched = false;

        for caps in rule.pattern.captures_iter(text) {
            matched = true;
            let span = candidate_span(&caps, rule.group_join);
            let digits = normalize_number(&join_groups(&caps, rule.group_join));

            match check_number(span, &digits, rule) {
                Ok(check) => {
                    trace.push(
                        entry(rule, Outcome::Accepted, check.reason(rule, &digits)).with_raw_match(span),
                    );
                    return Some(ExtractionCandidate {
                        raw_match: span.to_string(),
                        normalized_value: digits,
                        rule_id: rule.id.clone(),
                        field_kind: FieldKind::Number,
                    });
                }
                Err(rejection) => {
                    debug!("Rule {} rejected {:?}: {}", rule.id, span, rejection);
                    trace.push(entry(rule, Outcome::RejectedShape, rejection.to_string()).with_raw_match(span));
                }
            }
        }

        if !matched {
            trace.push(entry(rule, Outcome::NoMatch, "pattern did not match"));
        }

        None
    }
}

impl FieldExtractor for NumberExtractor<'_> {
    fn field_kind(&self) -> FieldKind {
        FieldKind::Number
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

            if let Some(caps) = rule.pattern.captures(text) {
                let span = candidate_span(&caps, rule.group_join);
                result.trace.push(
                    entry(
                        rule,
                        Outcome::RejectedLowerPriorityAlreadyAccepted,
                        shadowed_reason(&accepted.rule_id),
                    )
                    .with_raw_match(span),
                );
            }
        }

        if let Some(candidate) = &result.candidate {
            debug!("Card number {} accepted by {}", candidate.normalized_value, candidate.rule_id);
        }

        result
    }
}

/// Extract a card number using the built-in registry's fallback rules.
pub fn extract_number(text: &str, profile: Option<&OperatorProfile>) -> (Option<String>, Vec<TraceEntry>) {
    let registry = OperatorRegistry::builtin();
    NumberExtractor::new(&registry).extract(text, profile).into_parts()
}

fn entry(rule: &NumberRule, outcome: Outcome, reason: impl Into<String>) -> TraceEntry {
    TraceEntry::new(FieldKind::Number, rule.id.clone(), rule.description.clone(), outcome, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile<'a>(registry: &'a OperatorRegistry, name: &str) -> &'a OperatorProfile {
        registry.profile(name).unwrap()
    }

    #[test]
    fn test_bradesco_labeled_number() {
        let registry = OperatorRegistry::builtin();
        let text = "BRADESCO SAÚDE\nCARTEIRINHA: 123456789-01\nPLANO: NACIONAL PLUS";

        let result = NumberExtractor::new(&registry).extract(text, Some(profile(&registry, "Bradesco Saúde")));
        let candidate = result.candidate.unwrap();

        assert_eq!(candidate.normalized_value, "12345678901");
        assert_eq!(candidate.raw_match, "123456789-01");
        assert_eq!(candidate.rule_id, "bradesco.number.labeled");
    }

    #[test]
    fn test_unimed_grouped_number() {
        let registry = OperatorRegistry::builtin();
        let text = "UNIMED\nNÚMERO: 1234.5678.9012.3456";

        let (number, _) = NumberExtractor::new(&registry)
            .extract(text, Some(profile(&registry, "Unimed")))
            .into_parts();
        assert_eq!(number, Some("1234567890123456".to_string()));
    }

    #[test]
    fn test_generic_label_fallback_without_profile() {
        let (number, trace) = extract_number("CARTEIRINHA: 98765432", None);
        assert_eq!(number, Some("98765432".to_string()));

        let accepted = trace.iter().find(|e| e.outcome == Outcome::Accepted).unwrap();
        assert_eq!(accepted.rule_id, "generic.number.labeled");
    }

    #[test]
    fn test_label_fallback_beats_bare_digits() {
        let text = "11122233 CARTÃO: 12345678 90123456";
        let (number, trace) = extract_number(text, None);

        assert_eq!(number, Some("1234567890123456".to_string()));
        assert!(trace.iter().any(|e| {
            e.rule_id == "generic.number.bare" && e.outcome == Outcome::RejectedLowerPriorityAlreadyAccepted
        }));
    }

    #[test]
    fn test_date_never_becomes_number() {
        let (number, trace) = extract_number("Validade 12/05/2025", None);
        assert_eq!(number, None);

        let rejected = trace
            .iter()
            .find(|e| e.outcome == Outcome::RejectedShape)
            .unwrap();
        assert!(rejected.reason.contains("date"), "{}", rejected.reason);
    }

    #[test]
    fn test_profile_rule_falls_through_to_generic() {
        let registry = OperatorRegistry::builtin();
        // 10 digits fit no Bradesco rule but satisfy the generic label rule
        let text = "BRADESCO SAÚDE CARTÃO: 1234567890";

        let result = NumberExtractor::new(&registry).extract(text, Some(profile(&registry, "Bradesco Saúde")));
        let candidate = result.candidate.unwrap();
        assert_eq!(candidate.rule_id, "generic.number.labeled");
        assert_eq!(candidate.normalized_value, "1234567890");

        let bradesco_rules: Vec<_> = result
            .trace
            .iter()
            .filter(|e| e.rule_id.starts_with("bradesco."))
            .collect();
        assert_eq!(bradesco_rules.len(), 3);
        assert!(bradesco_rules.iter().all(|e| e.outcome != Outcome::Accepted));
    }

    #[test]
    fn test_fallback_can_be_disabled() {
        let registry = OperatorRegistry::builtin();
        let result = NumberExtractor::new(&registry)
            .with_generic_fallback(false)
            .extract("CARTEIRINHA: 98765432", None);

        assert_eq!(result.value(), None);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn test_amil_date_like_number_is_flagged() {
        let registry = OperatorRegistry::builtin();
        let text = "AMIL\nMATRÍCULA: 01021990";

        let result = NumberExtractor::new(&registry).extract(text, Some(profile(&registry, "Amil")));
        assert_eq!(result.value(), Some("01021990"));

        let accepted = result.trace.iter().find(|e| e.outcome == Outcome::Accepted).unwrap();
        assert_eq!(accepted.rule_id, "amil.number.labeled");
        assert!(accepted.reason.contains("01/02/1990"), "{}", accepted.reason);
    }

    #[test]
    fn test_phone_number_is_not_a_card_number() {
        let (number, _) = extract_number("Central de atendimento 4004-2700", None);
        assert_eq!(number, None);
    }
}
