//! Pure string normalization for detection, card numbers and plan names.

use regex::Captures;
use unicode_normalization::UnicodeNormalization;

use super::patterns::{NEXT_FIELD_LABEL, WHITESPACE};
use crate::registry::GroupJoin;

/// Compose accents (NFC), uppercase and collapse whitespace, for operator
/// detection only.
pub fn to_detection_form(text: &str) -> String {
    let composed: String = text.nfc().collect();
    collapse_whitespace(&composed.to_uppercase())
}

/// Reduce a number candidate to its digits.
///
/// Idempotent: the output contains only ASCII digits.
pub fn normalize_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Join the capture groups of a number match, in capture order.
///
/// Groups that did not participate are skipped. A pattern without groups
/// contributes its whole match.
pub fn join_groups(caps: &Captures<'_>, join: GroupJoin) -> String {
    let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

    match join {
        GroupJoin::Whole => whole.to_string(),
        GroupJoin::Concat if caps.len() <= 1 => whole.to_string(),
        GroupJoin::Concat => caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .collect(),
    }
}

/// The original text span a number match covers, from its first group to its last.
///
/// Unlike [`join_groups`], separators between groups are kept, which is what
/// the date-shape check needs to see.
pub fn candidate_span<'t>(caps: &Captures<'t>, join: GroupJoin) -> &'t str {
    let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    if join == GroupJoin::Whole {
        return whole;
    }

    let mut groups = caps.iter().skip(1).flatten();
    let Some(first) = groups.next() else {
        return whole;
    };
    let last = groups.last().unwrap_or(first);

    // All groups belong to the same haystack; rebuild the span from offsets.
    let offset = caps.get(0).map(|m| m.start()).unwrap_or(0);
    &whole[first.start() - offset..last.end() - offset]
}

/// Trim and collapse whitespace in a plan name, preserving case.
pub fn normalize_plan_name(raw: &str) -> String {
    collapse_whitespace(raw.trim())
}

/// Cut a captured plan phrase where the next card field label begins.
pub fn truncate_at_label(raw: &str) -> &str {
    match NEXT_FIELD_LABEL.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    }
}

/// Strip trailing separators OCR tends to leave after a plan name.
pub fn trim_plan_punctuation(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '.' | ',' | ';' | '|' | '/'))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
