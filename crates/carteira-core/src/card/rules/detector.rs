//! Operator detection.

use tracing::debug;

use super::normalize::to_detection_form;
use super::shadowed_reason;
use crate::models::card::{ExtractionCandidate, FieldKind, Outcome, TraceEntry};
use crate::registry::{OperatorProfile, OperatorRegistry};

/// Result of operator detection.
#[derive(Debug, Clone)]
pub struct Detection<'r> {
    /// Matched profile, `None` when no operator could be identified.
    pub profile: Option<&'r OperatorProfile>,
    /// Candidate that identified the operator.
    pub candidate: Option<ExtractionCandidate>,
    pub trace: Vec<TraceEntry>,
}

/// Resolves card text to at most one operator profile.
pub struct OperatorDetector<'r> {
    registry: &'r OperatorRegistry,
    trace_shadowed: bool,
}

impl<'r> OperatorDetector<'r> {
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self {
            registry,
            trace_shadowed: true,
        }
    }

    /// Record later profiles that would also have matched.
    pub fn with_shadow_tracing(mut self, enabled: bool) -> Self {
        self.trace_shadowed = enabled;
        self
    }

    /// Detect the operator. The first profile in registry order with any
    /// matching pattern wins.
    pub fn detect(&self, text: &str) -> Detection<'r> {
        let form = to_detection_form(text);
        let mut detection = Detection {
            profile: None,
            candidate: None,
            trace: Vec::new(),
        };

        for profile in self.registry.profiles() {
            let found = profile
                .detection_patterns
                .iter()
                .find_map(|p| p.find(&form))
                .map(|m| m.as_str().to_string());

            let entry = |outcome, reason: String| {
                TraceEntry::new(
                    FieldKind::Operator,
                    profile.detection_rule_id(),
                    describe_patterns(profile),
                    outcome,
                    reason,
                )
            };

            match (found, detection.profile) {
                (Some(raw), None) => {
                    debug!("Detected operator {} from {:?}", profile.name, raw);
                    detection.trace.push(
                        entry(Outcome::Accepted, "first matching operator in registry order".to_string())
                            .with_raw_match(raw.clone()),
                    );
                    detection.candidate = Some(ExtractionCandidate {
                        raw_match: raw,
                        normalized_value: profile.name.clone(),
                        rule_id: profile.detection_rule_id(),
                        field_kind: FieldKind::Operator,
                    });
                    detection.profile = Some(profile);
                }
                (Some(raw), Some(winner)) => {
                    if self.trace_shadowed {
                        detection.trace.push(
                            entry(
                                Outcome::RejectedLowerPriorityAlreadyAccepted,
                                shadowed_reason(&winner.detection_rule_id()),
                            )
                            .with_raw_match(raw),
                        );
                    }
                }
                (None, None) => {
                    detection
                        .trace
                        .push(entry(Outcome::NoMatch, "no detection pattern matched".to_string()));
                }
                (None, Some(_)) => {}
            }
        }

        if detection.profile.is_none() {
            debug!("No operator detected");
        }

        detection
    }
}

/// Detect the operator profile for card text.
pub fn detect<'r>(text: &str, registry: &'r OperatorRegistry) -> Option<&'r OperatorProfile> {
    OperatorDetector::new(registry)
        .with_shadow_tracing(false)
        .detect(text)
        .profile
}

fn describe_patterns(profile: &OperatorProfile) -> String {
    let patterns: Vec<&str> = profile.detection_patterns.iter().map(|p| p.as_str()).collect();
    format!("{} name: {}", profile.name, patterns.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_operators() {
        let registry = OperatorRegistry::builtin();

        let cases = [
            ("BRADESCO SAÚDE\nCARTEIRINHA", "Bradesco Saúde"),
            ("Unimed Federação", "Unimed"),
            ("amil assistência médica", "Amil"),
            ("SulAmérica Saúde", "SulAmérica"),
            ("SUL AMERICA SEGUROS", "SulAmérica"),
            ("SULAME\u{0301}RICA SAÚDE", "SulAmérica"),
            ("Hapvida Saúde", "Hapvida"),
            ("GNDI - NotreDame Intermédica", "NotreDame Intermédica"),
        ];

        for (text, expected) in cases {
            let profile = detect(text, &registry).unwrap_or_else(|| panic!("no operator for {text:?}"));
            assert_eq!(profile.name, expected, "text: {text:?}");
        }
    }

    #[test]
    fn test_detect_none() {
        let registry = OperatorRegistry::builtin();
        assert!(detect("CARTEIRINHA: 98765432", &registry).is_none());
        assert!(detect("", &registry).is_none());
        // "AMIL" inside a word is not the operator
        assert!(detect("FAMILIA SILVA", &registry).is_none());
    }

    #[test]
    fn test_first_profile_wins_and_later_ones_are_shadowed() {
        let registry = OperatorRegistry::builtin();
        let detection = OperatorDetector::new(&registry).detect("Bradesco Saúde - rede Unimed");

        assert_eq!(detection.profile.map(|p| p.name.as_str()), Some("Bradesco Saúde"));

        let accepted: Vec<_> = detection
            .trace
            .iter()
            .filter(|e| e.outcome == Outcome::Accepted)
            .collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].rule_id, "bradesco.detect");

        assert!(detection.trace.iter().any(|e| {
            e.rule_id == "unimed.detect" && e.outcome == Outcome::RejectedLowerPriorityAlreadyAccepted
        }));
    }

    #[test]
    fn test_unmatched_profiles_traced_as_no_match() {
        let registry = OperatorRegistry::builtin();
        let detection = OperatorDetector::new(&registry).detect("cartão sem operadora");

        assert!(detection.profile.is_none());
        assert_eq!(detection.trace.len(), registry.profiles().len());
        assert!(detection.trace.iter().all(|e| e.outcome == Outcome::NoMatch));
    }
}
