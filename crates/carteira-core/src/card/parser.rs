//! Card parser: detection followed by number and plan extraction.

use std::sync::Arc;

use tracing::{debug, info};

use super::report::CoverageReport;
use super::rules::{FieldExtractor, NumberExtractor, OperatorDetector, PlanExtractor};
use super::rules::plan::MIN_PLAN_LENGTH;
use super::CardExtractor;
use crate::models::card::ExtractionResult;
use crate::models::config::ExtractionConfig;
use crate::registry::{load_profiles, OperatorRegistry};

/// Extracts operator, card number and plan name from OCR card text.
///
/// Cheap to clone and safe to share across threads; the registry is
/// immutable once built.
#[derive(Debug, Clone)]
pub struct CardParser {
    registry: Arc<OperatorRegistry>,
    generic_fallback: bool,
    trace_shadowed: bool,
    min_plan_length: usize,
}

impl CardParser {
    /// Create a parser over the built-in operator registry.
    pub fn new() -> Self {
        Self::with_registry(OperatorRegistry::builtin())
    }

    /// Create a parser over a custom registry.
    pub fn with_registry(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            registry,
            generic_fallback: true,
            trace_shadowed: true,
            min_plan_length: MIN_PLAN_LENGTH,
        }
    }

    /// Create a parser from configuration, appending any extra profiles it names.
    pub fn from_config(config: &ExtractionConfig) -> crate::Result<Self> {
        let registry = match &config.extra_profiles {
            Some(path) => {
                let extra = load_profiles(path)?;
                info!("Loaded {} extra operator profiles from {}", extra.len(), path.display());
                Arc::new(OperatorRegistry::builtin().extend(extra)?)
            }
            None => OperatorRegistry::builtin(),
        };

        Ok(Self::with_registry(registry)
            .with_generic_fallback(config.generic_fallback)
            .with_shadow_tracing(config.trace_shadowed_rules)
            .with_min_plan_length(config.min_plan_length))
    }

    /// Set whether generic fallback rules run.
    pub fn with_generic_fallback(mut self, enabled: bool) -> Self {
        self.generic_fallback = enabled;
        self
    }

    /// Set whether shadowed rules are recorded in the trace.
    pub fn with_shadow_tracing(mut self, enabled: bool) -> Self {
        self.trace_shadowed = enabled;
        self
    }

    /// Set the minimum plan name length.
    pub fn with_min_plan_length(mut self, min_length: usize) -> Self {
        self.min_plan_length = min_length;
        self
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Describe the operators and rules this parser uses.
    pub fn coverage(&self) -> CoverageReport {
        CoverageReport::from_registry(&self.registry)
    }

    /// Parse card text into an extraction result.
    ///
    /// Never fails: fields that cannot be found are `None`. Blank input
    /// produces an empty trace.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        if text.trim().is_empty() {
            debug!("Empty card text, nothing to extract");
            return ExtractionResult::default();
        }

        info!("Extracting card fields from {} characters of text", text.len());

        let detection = OperatorDetector::new(&self.registry)
            .with_shadow_tracing(self.trace_shadowed)
            .detect(text);
        let profile = detection.profile;

        let number = NumberExtractor::new(&self.registry)
            .with_generic_fallback(self.generic_fallback)
            .with_shadow_tracing(self.trace_shadowed)
            .extract(text, profile);

        let plan = PlanExtractor::new(&self.registry)
            .with_generic_fallback(self.generic_fallback)
            .with_shadow_tracing(self.trace_shadowed)
            .with_min_length(self.min_plan_length)
            .extract(text, profile);

        let (card_number, number_trace) = number.into_parts();
        let (plan_name, plan_trace) = plan.into_parts();

        let mut trace = detection.trace;
        trace.extend(number_trace);
        trace.extend(plan_trace);

        let result = ExtractionResult {
            operator_name: profile.map(|p| p.name.clone()),
            card_number,
            plan_name,
            trace,
        };

        debug!(
            "Extracted {}/3 fields (operator: {:?}) with {} trace entries",
            result.filled_fields(),
            result.operator_name,
            result.trace.len()
        );

        result
    }
}

impl Default for CardParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CardExtractor for CardParser {
    fn extract(&self, text: &str) -> ExtractionResult {
        self.parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::card::{FieldKind, Outcome};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_bradesco_card() {
        let text = "BRADESCO SAÚDE ... CARTEIRINHA: 123456789-01 ... PLANO: NACIONAL PLUS";
        let result = CardParser::new().parse(text);

        assert_eq!(result.operator_name.as_deref(), Some("Bradesco Saúde"));
        assert_eq!(result.card_number.as_deref(), Some("12345678901"));
        assert!(result.plan_name.as_deref().unwrap().contains("NACIONAL"));
        assert_eq!(result.completeness(), 1.0);
    }

    #[test]
    fn test_unimed_card() {
        let text = "UNIMED ... NÚMERO: 1234.5678.9012.3456 ... PLANO: FEDERAL EXECUTIVO";
        let result = CardParser::new().parse(text);

        assert_eq!(result.operator_name.as_deref(), Some("Unimed"));
        assert_eq!(result.card_number.as_deref(), Some("1234567890123456"));
        let plan = result.plan_name.unwrap();
        assert!(plan.contains("FEDERAL") || plan.contains("EXECUTIVO"), "{plan}");
    }

    #[test]
    fn test_unidentified_operator_uses_label_fallback() {
        let result = CardParser::new().parse("CARTÃO: 12345678 90123456");

        assert_eq!(result.operator_name, None);
        assert_eq!(result.card_number.as_deref(), Some("1234567890123456"));
        assert_eq!(
            result.accepted(FieldKind::Number).map(|e| e.rule_id.as_str()),
            Some("generic.number.labeled")
        );
    }

    #[test]
    fn test_validity_date_only() {
        let result = CardParser::new().parse("Válido até 12/2025");

        assert_eq!(result.operator_name, None);
        assert_eq!(result.card_number, None);
        assert_eq!(result.plan_name, None);
        assert_eq!(result.completeness(), 0.0);
    }

    #[test]
    fn test_empty_input() {
        for text in ["", "   \n\t "] {
            let result = CardParser::new().parse(text);
            assert_eq!(result, ExtractionResult::default());
            assert_eq!(result.completeness(), 0.0);
            assert!(result.trace.is_empty());
        }
    }

    #[test]
    fn test_full_date_never_becomes_card_number() {
        let result = CardParser::new().parse("Nascimento 12/05/1980");
        assert_eq!(result.card_number, None);
    }

    #[test]
    fn test_impossible_dates_never_become_card_numbers() {
        for text in ["31.02.2025", "45/13/2025", "29-02-2023", "00/00/0000"] {
            let result = CardParser::new().parse(text);
            assert_eq!(result.card_number, None, "text: {text:?}");

            let rejected = result
                .trace_for(FieldKind::Number)
                .find(|e| e.outcome == Outcome::RejectedShape)
                .unwrap_or_else(|| panic!("no rejection for {text:?}"));
            assert_eq!(rejected.reason, format!("looked like a date ({text})"));
        }
    }

    #[test]
    fn test_sulamerica_card() {
        let text = "SULAMÉRICA SAÚDE\nCARTEIRINHA: 123 45678 9012 3456 7890\nPLANO: PRESTIGE";
        let result = CardParser::new().parse(text);

        assert_eq!(result.operator_name.as_deref(), Some("SulAmérica"));
        assert_eq!(result.card_number.as_deref(), Some("12345678901234567890"));
        assert_eq!(result.plan_name.as_deref(), Some("PRESTIGE"));
        assert_eq!(
            result.accepted(FieldKind::Number).map(|e| e.rule_id.as_str()),
            Some("sulamerica.number.grouped")
        );
    }

    #[test]
    fn test_hapvida_card() {
        let result = CardParser::new().parse("HAPVIDA\n12345.678901.23-4\nNOSSO PLANO");

        assert_eq!(result.operator_name.as_deref(), Some("Hapvida"));
        assert_eq!(result.card_number.as_deref(), Some("12345678901234"));
        assert_eq!(result.plan_name.as_deref(), Some("NOSSO PLANO"));
        assert_eq!(
            result.accepted(FieldKind::Plan).map(|e| e.rule_id.as_str()),
            Some("hapvida.plan.keyword")
        );
    }

    #[test]
    fn test_notredame_card() {
        let text = "NOTREDAME INTERMÉDICA\nCARTÃO: 0123 4567 8901 234\nSMART 200";
        let result = CardParser::new().parse(text);

        assert_eq!(result.operator_name.as_deref(), Some("NotreDame Intermédica"));
        assert_eq!(result.card_number.as_deref(), Some("012345678901234"));
        assert_eq!(result.plan_name.as_deref(), Some("SMART 200"));
        assert_eq!(
            result.accepted(FieldKind::Number).map(|e| e.rule_id.as_str()),
            Some("notredame.number.labeled")
        );
    }

    #[test]
    fn test_operator_name_is_not_a_plan() {
        let result = CardParser::new().parse("CENTRAL NACIONAL UNIMED\n0 123 456789012345 6");

        assert_eq!(result.operator_name.as_deref(), Some("Unimed"));
        assert_eq!(result.card_number.as_deref(), Some("01234567890123456"));
        assert_eq!(result.plan_name, None);
    }

    #[test]
    fn test_decomposed_accents_detect_operator() {
        let result = CardParser::new().parse("SULAME\u{0301}RICA SAU\u{0301}DE\n123 45678 9012 3456 7890");
        assert_eq!(result.operator_name.as_deref(), Some("SulAmérica"));
    }

    #[test]
    fn test_trace_order_and_single_acceptance() {
        let text = "BRADESCO SAÚDE\nCARTEIRINHA: 123456789-01\nPLANO: NACIONAL PLUS\nUNIMED rede";
        let result = CardParser::new().parse(text);

        let kinds: Vec<FieldKind> = result.trace.iter().map(|e| e.field_kind).collect();
        let first_number = kinds.iter().position(|k| *k == FieldKind::Number).unwrap();
        let first_plan = kinds.iter().position(|k| *k == FieldKind::Plan).unwrap();
        assert!(kinds[..first_number].iter().all(|k| *k == FieldKind::Operator));
        assert!(kinds[first_number..first_plan].iter().all(|k| *k == FieldKind::Number));

        for kind in [FieldKind::Operator, FieldKind::Number, FieldKind::Plan] {
            let accepted = result
                .trace_for(kind)
                .filter(|e| e.outcome == Outcome::Accepted)
                .count();
            assert_eq!(accepted, 1, "{kind}");
        }

        // profile rules are tried before any generic rule
        let number_ids: Vec<&str> = result.trace_for(FieldKind::Number).map(|e| e.rule_id.as_str()).collect();
        let last_profile = number_ids.iter().rposition(|id| id.starts_with("bradesco.")).unwrap();
        let first_generic = number_ids.iter().position(|id| id.starts_with("generic.")).unwrap();
        assert!(last_profile < first_generic);
    }

    #[test]
    fn test_shadow_tracing_does_not_change_result() {
        let text = "UNIMED\nNÚMERO: 1234.5678.9012.3456\nPLANO: FEDERAL EXECUTIVO";
        let with = CardParser::new().parse(text);
        let without = CardParser::new().with_shadow_tracing(false).parse(text);

        assert_eq!(with.card_number, without.card_number);
        assert_eq!(with.plan_name, without.plan_name);
        assert!(without
            .trace
            .iter()
            .all(|e| e.outcome != Outcome::RejectedLowerPriorityAlreadyAccepted));
        assert!(with.trace.len() > without.trace.len());
    }

    #[test]
    fn test_from_config_disables_fallback() {
        let config = ExtractionConfig {
            generic_fallback: false,
            ..ExtractionConfig::default()
        };
        let parser = CardParser::from_config(&config).unwrap();

        assert_eq!(parser.parse("CARTEIRINHA: 98765432").card_number, None);
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        let parser = Arc::new(CardParser::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let parser = Arc::clone(&parser);
                std::thread::spawn(move || parser.parse("AMIL\nMATRÍCULA: 87654321\nAmil 400"))
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.card_number.as_deref(), Some("87654321"));
            assert_eq!(result.plan_name.as_deref(), Some("Amil 400"));
        }
    }

    proptest! {
        #[test]
        fn prop_completeness_matches_fields(text in "[A-Za-z0-9ÁÉÍÓÚÃÕÇáéíóúãõç:/.\\- \n]{0,120}") {
            let result = CardParser::new().parse(&text);
            let filled = [
                result.operator_name.is_some(),
                result.card_number.is_some(),
                result.plan_name.is_some(),
            ]
            .iter()
            .filter(|f| **f)
            .count();

            prop_assert!((result.completeness() - filled as f64 / 3.0).abs() < f64::EPSILON);

            let json = serde_json::to_value(&result).unwrap();
            prop_assert!((json["completeness"].as_f64().unwrap() - result.completeness()).abs() < 1e-12);
        }

        #[test]
        fn prop_at_most_one_accepted_per_field(text in "[A-Z0-9:./\\- \n]{0,120}") {
            let result = CardParser::new().parse(&text);
            for kind in [FieldKind::Operator, FieldKind::Number, FieldKind::Plan] {
                let accepted = result.trace_for(kind).filter(|e| e.outcome == Outcome::Accepted).count();
                prop_assert!(accepted <= 1);
            }
        }

        #[test]
        fn prop_date_shape_alone_has_no_card_number(
            day in 0u32..100,
            month in 0u32..100,
            year in 0u32..10000,
            sep1 in "[/.\\-]",
            sep2 in "[/.\\-]",
        ) {
            let text = format!("{day:02}{sep1}{month:02}{sep2}{year:04}");
            prop_assert_eq!(CardParser::new().parse(&text).card_number, None);
        }

        #[test]
        fn prop_card_number_is_digits(text in "[A-Z0-9:./\\- \n]{0,120}") {
            if let Some(number) = CardParser::new().parse(&text).card_number {
                prop_assert!(number.chars().all(|c| c.is_ascii_digit()));
                prop_assert!((8..=20).contains(&number.len()));
            }
        }
    }
}
