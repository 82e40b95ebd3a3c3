//! Registry coverage reporting and trace rendering.
//!
//! Both are presentation helpers: extraction never prints anything itself.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::models::card::TraceEntry;
use crate::registry::OperatorRegistry;

/// Rule counts for one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCoverage {
    pub name: String,
    pub key: String,
    pub detection_patterns: usize,
    pub number_rules: usize,
    pub plan_rules: usize,
}

/// What the registry covers, for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Operators in detection priority order.
    pub operators: Vec<OperatorCoverage>,
    pub fallback_number_rules: usize,
    pub fallback_plan_rules: usize,
}

impl CoverageReport {
    /// Enumerate a registry.
    pub fn from_registry(registry: &OperatorRegistry) -> Self {
        let operators = registry
            .profiles()
            .iter()
            .map(|p| OperatorCoverage {
                name: p.name.clone(),
                key: p.key.clone(),
                detection_patterns: p.detection_patterns.len(),
                number_rules: p.number_rules.len(),
                plan_rules: p.plan_rules.len(),
            })
            .collect();

        Self {
            operators,
            fallback_number_rules: registry.fallback_number_rules().len(),
            fallback_plan_rules: registry.fallback_plan_rules().len(),
        }
    }

    /// Total number of extraction rules, fallbacks included.
    pub fn total_rules(&self) -> usize {
        let operator_rules: usize = self
            .operators
            .iter()
            .map(|o| o.number_rules + o.plan_rules)
            .sum();
        operator_rules + self.fallback_number_rules + self.fallback_plan_rules
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .operators
            .iter()
            .map(|o| o.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("operator".len());

        writeln!(f, "{:<width$}  detect  number  plan", "operator")?;
        for op in &self.operators {
            let pad = width - op.name.chars().count();
            writeln!(
                f,
                "{}{}  {:>6}  {:>6}  {:>4}",
                op.name,
                " ".repeat(pad),
                op.detection_patterns,
                op.number_rules,
                op.plan_rules
            )?;
        }
        writeln!(
            f,
            "generic fallbacks: {} number, {} plan",
            self.fallback_number_rules, self.fallback_plan_rules
        )?;
        write!(
            f,
            "{} operators, {} rules total",
            self.operators.len(),
            self.total_rules()
        )
    }
}

/// Render a trace as one line per rule attempt.
pub fn render_trace(trace: &[TraceEntry]) -> String {
    let mut out = String::new();

    for (i, entry) in trace.iter().enumerate() {
        let _ = write!(
            out,
            "{:>3}. [{}] {} -> {}: {}",
            i + 1,
            entry.field_kind,
            entry.rule_id,
            entry.outcome,
            entry.reason
        );
        if let Some(raw) = &entry.raw_match {
            let _ = write!(out, " ({raw:?})");
        }
        out.push('\n');
    }

    out
}
