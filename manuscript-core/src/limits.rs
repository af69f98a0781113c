//! Free-text limit interpretation.
//!
//! Guideline limits arrive as numbers or prose ("250 words", "4–6 figures",
//! "no more than 3,000"). Everything that needs a numeric ceiling goes
//! through [`parse_numeric_limit`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// A limit as stated by a guideline record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitSpec {
    Number(f64),
    Text(String),
}

impl LimitSpec {
    pub fn numeric(&self) -> Option<u64> {
        parse_numeric_limit(Some(self))
    }

    /// True for empty or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        matches!(self, LimitSpec::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for LimitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitSpec::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            LimitSpec::Number(n) => write!(f, "{n}"),
            LimitSpec::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for LimitSpec {
    fn from(value: u64) -> Self {
        LimitSpec::Number(value as f64)
    }
}

impl From<&str> for LimitSpec {
    fn from(value: &str) -> Self {
        LimitSpec::Text(value.to_string())
    }
}

static RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s*[–-]\s*(\d[\d,]*)").expect("static pattern"));

static UNIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d[\d,]*)\s*(?:word|words|reference|references|figure|figures|table|tables|item|items)",
    )
    .expect("static pattern")
});

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)").expect("static pattern"));

fn to_candidate(digits: &str) -> Option<u64> {
    let cleaned: String = digits.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<u64>().ok().filter(|n| *n > 0)
}

/// Extract the numeric ceiling from a limit specification.
///
/// Numbers pass through (truncated, non-positive → `None`). Text is scanned
/// for ranges, unit-suffixed numbers and bare numbers; the largest candidate
/// wins, so a range resolves to its upper bound.
pub fn parse_numeric_limit(spec: Option<&LimitSpec>) -> Option<u64> {
    match spec? {
        LimitSpec::Number(n) => {
            if n.is_finite() && *n > 0.0 {
                Some(n.trunc() as u64).filter(|v| *v > 0)
            } else {
                None
            }
        }
        LimitSpec::Text(text) => parse_limit_text(text),
    }
}

fn parse_limit_text(text: &str) -> Option<u64> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let ranges = RANGE_REGEX
        .captures_iter(&lowered)
        .flat_map(|cap| [cap.get(1), cap.get(2)])
        .flatten();
    let units = UNIT_REGEX.captures_iter(&lowered).filter_map(|cap| cap.get(1));
    let bare = NUMBER_REGEX.captures_iter(&lowered).filter_map(|cap| cap.get(1));

    ranges
        .chain(units)
        .chain(bare)
        .filter_map(|m| to_candidate(m.as_str()))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> Option<u64> {
        parse_numeric_limit(Some(&LimitSpec::from(s)))
    }

    #[test]
    fn parses_unit_suffixed_limits() {
        assert_eq!(text("250 words"), Some(250));
        assert_eq!(text("Up to 6 figures/tables"), Some(6));
    }

    #[test]
    fn ranges_resolve_to_upper_bound() {
        assert_eq!(text("4-6 figures"), Some(6));
        assert_eq!(text("4–6 figures"), Some(6));
        assert_eq!(text("150 - 250 words"), Some(250));
    }

    #[test]
    fn thousands_separators_are_stripped() {
        assert_eq!(text("no more than 3,000"), Some(3000));
        assert_eq!(text("3,500 words excluding references (max 50)"), Some(3500));
    }

    #[test]
    fn empty_or_digitless_text_has_no_limit() {
        assert_eq!(text(""), None);
        assert_eq!(text("   "), None);
        assert_eq!(text("No limit"), None);
        assert_eq!(text("0 words"), None);
        assert_eq!(parse_numeric_limit(None), None);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(parse_numeric_limit(Some(&LimitSpec::Number(1200.0))), Some(1200));
        assert_eq!(parse_numeric_limit(Some(&LimitSpec::Number(250.7))), Some(250));
        assert_eq!(parse_numeric_limit(Some(&LimitSpec::Number(0.0))), None);
        assert_eq!(parse_numeric_limit(Some(&LimitSpec::Number(-5.0))), None);
    }

    #[test]
    fn deserializes_from_number_or_string() {
        let n: LimitSpec = serde_json::from_str("1200").unwrap();
        assert_eq!(n.numeric(), Some(1200));
        let t: LimitSpec = serde_json::from_str("\"250 words\"").unwrap();
        assert_eq!(t.numeric(), Some(250));
        assert_eq!(n.to_string(), "1200");
    }

    proptest! {
        #[test]
        fn any_number_with_unit_is_recovered(n in 1u64..1_000_000) {
            prop_assert_eq!(text(&format!("{n} words")), Some(n));
        }

        #[test]
        fn range_always_yields_larger_endpoint(a in 1u64..10_000, b in 1u64..10_000) {
            prop_assert_eq!(text(&format!("{a}-{b} items")), Some(a.max(b)));
        }

        #[test]
        fn parsing_is_deterministic(s in "\\PC{0,30}") {
            prop_assert_eq!(text(&s), text(&s));
        }
    }
}
