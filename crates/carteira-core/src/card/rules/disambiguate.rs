//! Exclusion filters a candidate must pass before it is accepted.
//!
//! Number candidates go through, in order: date-shape rejection, non-target
//! shapes (phone, CPF), digit-count bounds, and the non-empty check. Plan
//! candidates only need a minimum length.

use std::fmt;

use chrono::NaiveDate;

use super::patterns::{CPF_SHAPE, DATE_DMY, DATE_MONTH_YEAR, PHONE_SHAPE};
use crate::registry::NumberRule;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Original text is shaped like a day/month/year date. `date` is set
    /// when the shape also parses as a real calendar date.
    DateShape { text: String, date: Option<NaiveDate> },
    /// Original text contains a validity month/year.
    MonthYear { text: String },
    /// Original text has the shape of another card field.
    NonTarget { kind: &'static str },
    /// Too few digits for the rule.
    TooFewDigits { count: usize, min: usize },
    /// Too many digits for the rule.
    TooManyDigits { count: usize, max: usize },
    /// Nothing left after normalization.
    Empty,
    /// Plan name shorter than the configured minimum.
    PlanTooShort { len: usize, min: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DateShape { date: Some(date), .. } => {
                write!(f, "looked like a date ({})", date.format("%d/%m/%Y"))
            }
            Rejection::DateShape { text, date: None } => write!(f, "looked like a date ({text})"),
            Rejection::MonthYear { text } => write!(f, "looked like a validity date ({text})"),
            Rejection::NonTarget { kind } => write!(f, "looked like a {kind}"),
            Rejection::TooFewDigits { count, min } => {
                write!(f, "{count} digits, rule needs at least {min}")
            }
            Rejection::TooManyDigits { count, max } => {
                write!(f, "{count} digits, rule allows at most {max}")
            }
            Rejection::Empty => write!(f, "empty after normalization"),
            Rejection::PlanTooShort { len, min } => {
                write!(f, "{len} characters, plan names need at least {min}")
            }
        }
    }
}

/// A number candidate that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberCheck {
    /// Set when the digits also read as a DDMMYYYY date and the rule asks to flag it.
    pub date_like: Option<NaiveDate>,
}

impl NumberCheck {
    /// Trace reason for an accepted candidate.
    pub fn reason(&self, rule: &NumberRule, digits: &str) -> String {
        let passed = format!(
            "{} digits within {}-{}, no date shape",
            digits.len(),
            rule.min_digits,
            rule.max_digits
        );
        match self.date_like {
            Some(date) => format!(
                "{passed}; digits also read as {}, verify against the card",
                date.format("%d/%m/%Y")
            ),
            None => passed,
        }
    }
}

/// Run the number filters on one candidate.
///
/// `span` is the original text the candidate came from (separators kept),
/// `digits` its normalized form.
pub fn check_number(span: &str, digits: &str, rule: &NumberRule) -> Result<NumberCheck, Rejection> {
    // Any day/month/year shape, calendar-valid or not
    if let Some(m) = DATE_DMY.find(span) {
        return Err(Rejection::DateShape {
            text: m.as_str().to_string(),
            date: find_date(span),
        });
    }

    if let Some(m) = DATE_MONTH_YEAR.find(span) {
        return Err(Rejection::MonthYear {
            text: m.as_str().to_string(),
        });
    }

    let trimmed = span.trim();
    if PHONE_SHAPE.is_match(trimmed) {
        return Err(Rejection::NonTarget { kind: "phone number" });
    }
    if CPF_SHAPE.is_match(trimmed) {
        return Err(Rejection::NonTarget { kind: "CPF" });
    }

    let count = digits.len();
    if count < rule.min_digits {
        return Err(Rejection::TooFewDigits {
            count,
            min: rule.min_digits,
        });
    }
    if count > rule.max_digits {
        return Err(Rejection::TooManyDigits {
            count,
            max: rule.max_digits,
        });
    }

    if digits.is_empty() {
        return Err(Rejection::Empty);
    }

    let date_like = if rule.date_like_warning {
        digits_as_date(digits)
    } else {
        None
    };

    Ok(NumberCheck { date_like })
}

/// Run the plan filter on a normalized plan name.
pub fn check_plan(value: &str, min_len: usize) -> Result<(), Rejection> {
    let len = value.chars().count();
    if len == 0 {
        return Err(Rejection::Empty);
    }
    if len < min_len {
        return Err(Rejection::PlanTooShort { len, min: min_len });
    }
    Ok(())
}

/// First real calendar date written day/month/year in the text.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_DMY.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3])?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Read eight digits as DDMMYYYY, if they form a plausible date.
pub fn digits_as_date(digits: &str) -> Option<NaiveDate> {
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let day: u32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let year: i32 = digits[4..8].parse().ok()?;

    if !(1900..=2099).contains(&year) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() == 2 {
        // Two-digit year: 00-50 is 2000s, 51-99 is 1900s
        Some(if year <= 50 { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{GroupJoin, NumberRule};
    use regex::Regex;

    fn rule(min: usize, max: usize, date_like_warning: bool) -> NumberRule {
        NumberRule {
            id: "test.number".to_string(),
            description: "test".to_string(),
            pattern: Regex::new(r"\d+").unwrap(),
            group_join: GroupJoin::Whole,
            min_digits: min,
            max_digits: max,
            date_like_warning,
        }
    }

    #[test]
    fn test_date_rejected_regardless_of_length() {
        let rule = rule(8, 20, false);
        let err = check_number("12/05/2025", "12052025", &rule).unwrap_err();
        assert_eq!(
            err,
            Rejection::DateShape {
                text: "12/05/2025".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 5, 12)
            }
        );
        assert_eq!(err.to_string(), "looked like a date (12/05/2025)");

        assert!(matches!(
            check_number("01.02.99", "010299", &rule),
            Err(Rejection::DateShape { .. })
        ));
    }

    #[test]
    fn test_impossible_date_is_still_date_shaped() {
        assert_eq!(find_date("45/13/2025"), None);
        assert_eq!(find_date("1234.5678.9012.3456"), None);

        let rule = rule(8, 16, false);
        for (span, digits) in [
            ("31.02.2025", "31022025"),
            ("45/13/2025", "45132025"),
            ("29-02-2023", "29022023"),
            ("00/00/0000", "00000000"),
        ] {
            let err = check_number(span, digits, &rule).unwrap_err();
            assert_eq!(
                err,
                Rejection::DateShape {
                    text: span.to_string(),
                    date: None
                }
            );
            assert_eq!(err.to_string(), format!("looked like a date ({span})"));
        }
    }

    #[test]
    fn test_month_year_rejected() {
        let rule = rule(1, 20, false);
        assert!(matches!(
            check_number("12/2025", "122025", &rule),
            Err(Rejection::MonthYear { .. })
        ));
    }

    #[test]
    fn test_non_target_shapes_rejected() {
        let rule = rule(8, 16, false);
        assert_eq!(
            check_number("4004-2700", "40042700", &rule),
            Err(Rejection::NonTarget { kind: "phone number" })
        );
        assert_eq!(
            check_number("123.456.789-09", "12345678909", &rule),
            Err(Rejection::NonTarget { kind: "CPF" })
        );
    }

    #[test]
    fn test_length_bounds() {
        let rule = rule(15, 16, false);
        assert_eq!(
            check_number("12345678", "12345678", &rule),
            Err(Rejection::TooFewDigits { count: 8, min: 15 })
        );
        assert_eq!(
            check_number("12345678901234567", "12345678901234567", &rule),
            Err(Rejection::TooManyDigits { count: 17, max: 16 })
        );
        assert!(check_number("1234.5678.9012.3456", "1234567890123456", &rule).is_ok());
    }

    #[test]
    fn test_date_like_warning_only_when_flagged() {
        let flagged = rule(8, 9, true);
        let check = check_number("01021990", "01021990", &flagged).unwrap();
        assert_eq!(check.date_like, NaiveDate::from_ymd_opt(1990, 2, 1));
        assert!(check.reason(&flagged, "01021990").contains("01/02/1990"));

        let plain = rule(8, 9, false);
        assert_eq!(check_number("01021990", "01021990", &plain).unwrap().date_like, None);

        assert_eq!(digits_as_date("87654321"), None);
    }

    #[test]
    fn test_check_plan() {
        assert!(check_plan("Gold", 3).is_ok());
        assert_eq!(check_plan("A1", 3), Err(Rejection::PlanTooShort { len: 2, min: 3 }));
        assert_eq!(check_plan("", 3), Err(Rejection::Empty));
    }
}
