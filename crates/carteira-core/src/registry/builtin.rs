//! Built-in operator profiles and the cross-provider fallback rules.
//!
//! Digit bounds below were tuned against sample cards and have no published
//! source of truth. Adjust them here when real cards disagree.

use super::{GroupJoin, NumberRuleSpec, PlanCapture, PlanRuleSpec, ProfileSpec};

/// Labels that introduce a card number on most operators' cards.
const NUMBER_LABELS: &str =
    r"\b(?:CARTEIRINHA|CARTEIRA|CART[ÃA]O|N[ÚU]MERO|MATR[ÍI]CULA|C[ÓO]DIGO|N[º°O]\.?)";

/// Plan label capture, stopping at the end of the line or the next "LABEL:".
const PLAN_LABELED: &str = r"(?i)\b(?:PLANO|PRODUTO)\s*[:\-]\s*([^\n:]{3,60})";

/// Fallback digit bounds for the label-anchored rule.
pub const FALLBACK_LABELED_DIGITS: (usize, usize) = (8, 20);

/// Fallback digit bounds for the unlabeled digit-run rule.
pub const FALLBACK_BARE_DIGITS: (usize, usize) = (8, 16);

fn number(id: &str, description: &str, pattern: String, min: usize, max: usize) -> NumberRuleSpec {
    NumberRuleSpec {
        id: id.to_string(),
        description: description.to_string(),
        pattern,
        group_join: GroupJoin::Concat,
        min_digits: min,
        max_digits: max,
        date_like_warning: false,
    }
}

fn labeled_plan(key: &str) -> PlanRuleSpec {
    PlanRuleSpec {
        id: format!("{key}.plan.labeled"),
        description: "PLANO:/PRODUTO: label followed by the plan name".to_string(),
        pattern: PLAN_LABELED.to_string(),
        capture: PlanCapture::Group(1),
    }
}

fn keyword_plan(key: &str, description: &str, pattern: &str) -> PlanRuleSpec {
    PlanRuleSpec {
        id: format!("{key}.plan.keyword"),
        description: description.to_string(),
        pattern: pattern.to_string(),
        capture: PlanCapture::Keyword,
    }
}

fn profile(
    name: &str,
    key: &str,
    detection: &[&str],
    number_rules: Vec<NumberRuleSpec>,
    plan_rules: Vec<PlanRuleSpec>,
) -> ProfileSpec {
    ProfileSpec {
        name: name.to_string(),
        key: key.to_string(),
        detection_patterns: detection.iter().map(|p| p.to_string()).collect(),
        number_rules,
        plan_rules,
    }
}

/// The built-in operators, in detection priority order.
pub fn builtin_profiles() -> Vec<ProfileSpec> {
    vec![bradesco(), unimed(), amil(), sulamerica(), hapvida(), notredame()]
}

fn bradesco() -> ProfileSpec {
    profile(
        "Bradesco Saúde",
        "bradesco",
        &[r"BRADESCO\s*SA[UÚ]DE", r"\bBRADESCO\b"],
        vec![
            number(
                "bradesco.number.labeled",
                "card label followed by 9 digits, dash, 2 digits",
                format!(r"(?i){NUMBER_LABELS}\s*[:\-]?\s*(\d{{9}})[ .\-]?(\d{{2}})\b"),
                11,
                11,
            ),
            number(
                "bradesco.number.grouped",
                "15 digits grouped 3-3-6-3",
                r"\b(\d{3})[ .](\d{3})[ .](\d{6})[ .](\d{3})\b".to_string(),
                15,
                15,
            ),
            number(
                "bradesco.number.dashed",
                "9 digits, dash, 2 check digits",
                r"\b(\d{9})-(\d{2})\b".to_string(),
                11,
                11,
            ),
        ],
        vec![
            labeled_plan("bradesco"),
            keyword_plan(
                "bradesco",
                "Bradesco product line keyword",
                r"(?i)\b(?:NACIONAL\s+(?:PLUS|FLEX|EFETIVO)|TOP\s+NACIONAL|NACIONAL|EFETIVO|PERFIL)\b",
            ),
        ],
    )
}

fn unimed() -> ProfileSpec {
    profile(
        "Unimed",
        "unimed",
        &[r"\bUNIMED\b", r"CENTRAL\s+NACIONAL\s+UNIMED"],
        vec![
            number(
                "unimed.number.grouped16",
                "16 digits in four groups of 4",
                r"\b(\d{4})[ .](\d{4})[ .](\d{4})[ .](\d{4})\b".to_string(),
                16,
                16,
            ),
            number(
                "unimed.number.grouped17",
                "17 digits grouped 1-3-12-1",
                r"\b(\d)[ .](\d{3})[ .](\d{12})[ .](\d)\b".to_string(),
                17,
                17,
            ),
            number(
                "unimed.number.labeled",
                "card label followed by a 15-17 digit run",
                format!(r"(?i){NUMBER_LABELS}\s*[:\-]?\s*(\d(?:[ .]?\d){{14,16}})\b"),
                15,
                17,
            ),
        ],
        vec![
            labeled_plan("unimed"),
            keyword_plan(
                "unimed",
                "Unimed coverage keyword",
                r"(?i)\b(?:FEDERAL\s+EXECUTIVO|UNIF[ÁA]CIL|UNIPART|UNIPLAN|EXECUTIVO|ESTADUAL|REGIONAL|COMPACTO)\b",
            ),
        ],
    )
}

fn amil() -> ProfileSpec {
    let mut labeled = number(
        "amil.number.labeled",
        "card label followed by 8-9 digits",
        format!(
            r"(?i){NUMBER_LABELS}\s*(?:DO\s+BENEFICI[ÁA]RIO\s*)?[:\-]?\s*(\d{{8,9}})\b"
        ),
        8,
        9,
    );
    labeled.date_like_warning = true;

    let mut bare = number(
        "amil.number.bare",
        "standalone 8-9 digit run",
        r"\b(\d{8,9})\b".to_string(),
        8,
        9,
    );
    bare.date_like_warning = true;

    profile(
        "Amil",
        "amil",
        &[r"\bAMIL\b", r"AMIL\s*ASSIST[ÊE]NCIA"],
        vec![labeled, bare],
        vec![
            labeled_plan("amil"),
            keyword_plan(
                "amil",
                "Amil product name",
                r"(?i)\b(?:AMIL\s+ONE(?:\s+S\d{3,4})?|AMIL\s+F[ÁA]CIL(?:\s+S?\d{2,3})?|AMIL\s+S?\d{3}|BLUE\s+(?:I{1,3}|\d{3}))\b",
            ),
        ],
    )
}

fn sulamerica() -> ProfileSpec {
    profile(
        "SulAmérica",
        "sulamerica",
        &[r"SUL\s*AM[ÉE]RICA"],
        vec![
            number(
                "sulamerica.number.grouped",
                "20 digits grouped 3-5-4-4-4",
                r"\b(\d{3})[ .]?(\d{5})[ .]?(\d{4})[ .]?(\d{4})[ .]?(\d{4})\b".to_string(),
                20,
                20,
            ),
            number(
                "sulamerica.number.labeled",
                "card label followed by a 17-20 digit run",
                format!(r"(?i){NUMBER_LABELS}\s*[:\-]?\s*(\d(?:[ .]?\d){{16,19}})\b"),
                17,
                20,
            ),
        ],
        vec![
            labeled_plan("sulamerica"),
            keyword_plan(
                "sulamerica",
                "SulAmérica product line keyword",
                r"(?i)\b(?:PRESTIGE|ESPECIAL\s*\d{3}|EXECUTIVO|CL[ÁA]SSICO|B[ÁA]SICO|EXATO|DIRETO)\b",
            ),
        ],
    )
}

fn hapvida() -> ProfileSpec {
    profile(
        "Hapvida",
        "hapvida",
        &[r"HAP\s*VIDA"],
        vec![
            number(
                "hapvida.number.dotted",
                "digits grouped 5.6.2-1",
                r"\b(\d{5})\.(\d{6})\.(\d{2})(?:-(\d))?\b".to_string(),
                13,
                14,
            ),
            number(
                "hapvida.number.labeled",
                "card label followed by a 9-14 digit run",
                format!(r"(?i){NUMBER_LABELS}\s*[:\-]?\s*(\d(?:[ .\-]?\d){{8,13}})\b"),
                9,
                14,
            ),
        ],
        vec![
            labeled_plan("hapvida"),
            keyword_plan(
                "hapvida",
                "Hapvida product keyword",
                r"(?i)\b(?:NOSSO\s+PLANO|SMART(?:\s+\d{3})?|PLENO|MIX)\b",
            ),
        ],
    )
}

fn notredame() -> ProfileSpec {
    profile(
        "NotreDame Intermédica",
        "notredame",
        &[r"NOTRE\s*DAME", r"INTERM[ÉE]DICA", r"\bGNDI\b"],
        vec![number(
            "notredame.number.labeled",
            "card label followed by a 10-17 digit run",
            format!(r"(?i){NUMBER_LABELS}\s*[:\-]?\s*(\d(?:[ .\-]?\d){{9,16}})\b"),
            10,
            17,
        )],
        vec![
            labeled_plan("notredame"),
            keyword_plan(
                "notredame",
                "NotreDame Intermédica product tier",
                r"(?i)\b(?:SMART|ADVANCE|PREMIUM|INFINITY)\s+\d{3}\b",
            ),
        ],
    )
}

/// Cross-provider number rules, highest priority first.
pub fn fallback_number_rules() -> Vec<NumberRuleSpec> {
    let (labeled_min, labeled_max) = FALLBACK_LABELED_DIGITS;
    let (bare_min, bare_max) = FALLBACK_BARE_DIGITS;

    vec![
        number(
            "generic.number.labeled",
            "CARTEIRINHA:/CARTÃO:/NÚMERO:/MATRÍCULA: label followed by a digit run",
            format!(
                r"(?i){NUMBER_LABELS}\s*(?:DO\s+BENEFICI[ÁA]RIO\s*)?(?:N[º°O]\.?\s*)?[:\-]?\s*(\d(?:[ ./\-]?\d){{7,24}})"
            ),
            labeled_min,
            labeled_max,
        ),
        NumberRuleSpec {
            group_join: GroupJoin::Whole,
            ..number(
                "generic.number.bare",
                "unlabeled digit run (last resort)",
                r"\b\d(?:[./\-]?\d){7,15}\b".to_string(),
                bare_min,
                bare_max,
            )
        },
    ]
}

/// Cross-provider plan rules, highest priority first.
pub fn fallback_plan_rules() -> Vec<PlanRuleSpec> {
    vec![
        labeled_plan("generic"),
        keyword_plan(
            "generic",
            "common plan category keyword",
            r"(?i)\b(?:EXECUTIVO|GOLD|MASTER|PREMIUM|PLATINUM|DIAMANTE|OURO|PRATA|BRONZE|ESPECIAL|STANDARD|B[ÁA]SICO|SUPERIOR|EMPRESARIAL)\b",
        ),
    ]
}
