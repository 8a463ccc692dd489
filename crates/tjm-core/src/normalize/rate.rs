//! Daily-rate parsing.
//!
//! Explicit numeric fields win. When both are absent the title and
//! description are searched with an ordered list of matchers; the first one
//! that yields numbers wins. Whatever comes out is validated by
//! [`RateRange::new`], so an inverted or non-positive range is discarded.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::RateRange;

pub const DEFAULT_CURRENCY: &str = "EUR";

/// `(min, max)` as found in text, before validation.
pub type RateBounds = (Option<f64>, Option<f64>);

/// A matcher scans free text and returns the first rate it recognizes.
pub type RateMatcher = fn(&str) -> Option<RateBounds>;

/// Either plain digits or digits grouped by thousands with a space,
/// no-break space, dot or comma. Word boundaries on both sides reject
/// partial groups such as the tail of a year.
macro_rules! num {
    () => {
        r"\b(\d{1,3}(?:[ \x{A0}\x{202F}.,]\d{3})+|\d+)\b"
    };
}

static DASH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(num!(), r"\s*€?\s*[-–—]\s*", num!(), r"\s*€")).unwrap()
});

static A_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"(?i)", num!(), r"\s*€?\s*à\s*", num!(), r"\s*€")).unwrap()
});

static ENTRE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"(?i)\bentre\s+", num!(), r"\s*€?\s*et\s+", num!(), r"\s*€")).unwrap()
});

static TJM_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\btjm\s*:?\s*",
        num!(),
        r"(?:\s*€?\s*(?:[-–—]|à)\s*",
        num!(),
        r")?"
    ))
    .unwrap()
});

static PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        num!(),
        r"\s*€\s*(?:ht\s*)?(?:/\s*(?:jour|day|j)\b|par\s+jour)"
    ))
    .unwrap()
});

/// Text matchers in priority order.
pub const MATCHERS: &[(&str, RateMatcher)] = &[
    ("dash_range", match_dash_range),
    ("a_range", match_a_range),
    ("entre_range", match_entre_range),
    ("tjm_label", match_tjm_label),
    ("per_day", match_per_day),
];

pub fn match_dash_range(text: &str) -> Option<RateBounds> {
    first_pair(&DASH_RANGE, text)
}

pub fn match_a_range(text: &str) -> Option<RateBounds> {
    first_pair(&A_RANGE, text)
}

pub fn match_entre_range(text: &str) -> Option<RateBounds> {
    first_pair(&ENTRE_RANGE, text)
}

pub fn match_tjm_label(text: &str) -> Option<RateBounds> {
    TJM_LABEL.captures_iter(text).find_map(|caps| {
        let lo = parse_number(caps.get(1)?.as_str())?;
        let hi = match caps.get(2) {
            Some(m) => parse_number(m.as_str())?,
            None => lo,
        };
        Some((Some(lo), Some(hi)))
    })
}

pub fn match_per_day(text: &str) -> Option<RateBounds> {
    PER_DAY.captures_iter(text).find_map(|caps| {
        let value = parse_number(caps.get(1)?.as_str())?;
        Some((Some(value), Some(value)))
    })
}

fn first_pair(re: &Regex, text: &str) -> Option<RateBounds> {
    re.captures_iter(text).find_map(|caps| {
        let lo = parse_number(caps.get(1)?.as_str())?;
        let hi = parse_number(caps.get(2)?.as_str())?;
        Some((Some(lo), Some(hi)))
    })
}

/// Parse a number matched by `num!()`: separators are thousands groupings,
/// so every non-digit is dropped.
fn parse_number(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<f64>().ok()
}

/// Run [`MATCHERS`] in order over `text`.
pub fn extract_rate_from_text(text: &str) -> Option<RateBounds> {
    MATCHERS.iter().find_map(|(_, matcher)| matcher(text))
}

static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$").unwrap());

/// Parse one explicit rate field. Numbers are taken as-is; strings are
/// cleaned of currency symbols and thousands separators. Non-positive or
/// unparseable values yield `None`.
pub fn parse_rate_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            if cleaned.is_empty() {
                None
            } else if THOUSANDS.is_match(&cleaned) {
                cleaned.replace(['.', ','], "").parse().ok()
            } else {
                cleaned.replace(',', ".").parse().ok()
            }
        }
        _ => None,
    }?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}

static BARE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*",
        num!(),
        r"\s*€?\s*(?:[-–—]|à)\s*",
        num!(),
        r"\s*€?\s*$"
    ))
    .unwrap()
});

/// What one explicit rate field holds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExplicitRate {
    Single(f64),
    Range(f64, f64),
}

/// Strings are tried as ranges (`"500-700"`, `"TJM 500 à 600€"`) before
/// being reduced to a single number.
fn parse_explicit(value: &Value) -> Option<ExplicitRate> {
    if let Value::String(s) = value {
        let found = first_pair(&BARE_RANGE, s).or_else(|| extract_rate_from_text(s));
        if let Some((Some(lo), Some(hi))) = found {
            return Some(if lo == hi {
                ExplicitRate::Single(lo)
            } else {
                ExplicitRate::Range(lo, hi)
            });
        }
    }
    parse_rate_value(value).map(ExplicitRate::Single)
}

/// Map a raw currency label to an ISO 4217 code. Euro spellings and the
/// symbol become `EUR`, any three-letter code is upper-cased, and a trailing
/// unit such as `/jour` is ignored. Anything else yields `None`.
pub fn normalize_currency(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    let head = lower
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    match head {
        "€" | "eur" | "euro" | "euros" => Some(DEFAULT_CURRENCY.to_string()),
        "$" => Some("USD".to_string()),
        "£" => Some("GBP".to_string()),
        code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(code.to_ascii_uppercase())
        }
        _ => None,
    }
}

/// Build a validated rate from explicit fields, falling back to `text` only
/// when both explicit fields are absent or unparseable. A range written
/// into one field fills both bounds unless the other field is set.
pub fn parse_rate(
    min: Option<&Value>,
    max: Option<&Value>,
    currency: Option<&str>,
    text: &str,
) -> Option<RateRange> {
    use ExplicitRate::{Range, Single};

    let min = min.and_then(parse_explicit);
    let max = max.and_then(parse_explicit);
    let lo = match (min, max) {
        (Some(Single(v) | Range(v, _)), _) | (None, Some(Range(v, _))) => Some(v),
        _ => None,
    };
    let hi = match (max, min) {
        (Some(Single(v) | Range(_, v)), _) | (None, Some(Range(_, v))) => Some(v),
        _ => None,
    };
    let bounds = match (lo, hi) {
        (None, None) => extract_rate_from_text(text)?,
        found => found,
    };

    let currency = currency
        .and_then(normalize_currency)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    RateRange::new(bounds.0, bounds.1, currency)
}
