//! Numeric Sanitizer
//!
//! Parses values of unknown representation (numbers, noisy strings, ranges,
//! laboratory "not detected" markers) into finite numbers.
//!
//! Accepted string shapes:
//! - plain and signed numbers, scientific notation ("1.2e3")
//! - thousands separators ("1,234.5"), decimal comma ("25,5")
//! - percent signs, currency symbols, unit suffixes ("45 %", "RM 1,200", "26 t/ha")
//! - inclusive ranges ("25.5-27.0", "25.5 – 27.0 t/ha", "10 to 12")
//!
//! Nothing here panics; every failure is a `ParseFailure`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::ParseFailure;

/// Markers laboratories use for values below the detection limit.
/// These are unresolved, never zero.
const NOT_DETECTED_TOKENS: &[&str] = &[
    "n.d.",
    "n.d",
    "nd",
    "bdl",
    "b.d.l.",
    "<dl",
    "<lod",
    "not detected",
    "non detected",
    "below detection",
    "below detection limit",
    "trace",
    "tr",
];

/// Placeholders meaning "no value reported".
const MISSING_TOKENS: &[&str] = &["-", "--", "—", "n/a", "na", "none", "null", "nan", "?"];

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d[\d,]*(?:\.\d+)?)")
        .expect("range pattern is valid")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d[\d,]*(?:\.\d+)?|\.\d+)(?:[eE][-+]?\d+)?")
        .expect("number pattern is valid")
});

/// A sanitized reading: a point or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Numeric {
    Point { value: f64 },
    Range { low: f64, high: f64 },
}

impl Numeric {
    /// Point value; the arithmetic midpoint for ranges.
    pub fn point(&self) -> f64 {
        match *self {
            Numeric::Point { value } => value,
            Numeric::Range { low, high } => (low + high) / 2.0,
        }
    }

    /// (low, high) pair; a point yields (value, value).
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Numeric::Point { value } => (value, value),
            Numeric::Range { low, high } => (low, high),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Numeric::Range { .. })
    }
}

/// Sanitize to a single number (midpoint for ranges).
pub fn sanitize(raw: &Value) -> Result<f64, ParseFailure> {
    parse_numeric(raw).map(|n| n.point())
}

/// Sanitize an optional value; `None` is treated like JSON `null`.
pub fn sanitize_opt(raw: Option<&Value>) -> Result<f64, ParseFailure> {
    match raw {
        Some(v) => sanitize(v),
        None => Err(ParseFailure::Empty),
    }
}

/// Sanitize keeping range endpoints, for ranged series rendering.
pub fn sanitize_range(raw: &Value) -> Result<(f64, f64), ParseFailure> {
    parse_numeric(raw).map(|n| n.bounds())
}

/// Full parse preserving whether the source was a range.
pub fn parse_numeric(raw: &Value) -> Result<Numeric, ParseFailure> {
    match raw {
        Value::Null => Err(ParseFailure::Empty),
        Value::Bool(_) => Err(ParseFailure::UnsupportedType("boolean")),
        Value::Number(n) => {
            let value = n.as_f64().ok_or(ParseFailure::NonFinite)?;
            finite(value).map(|value| Numeric::Point { value })
        }
        Value::String(s) => parse_numeric_str(s),
        Value::Array(_) => Err(ParseFailure::UnsupportedType("array")),
        Value::Object(_) => Err(ParseFailure::UnsupportedType("object")),
    }
}

/// Parse a free-text value.
pub fn parse_numeric_str(text: &str) -> Result<Numeric, ParseFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let lower = trimmed.to_lowercase();
    if MISSING_TOKENS.contains(&lower.as_str()) {
        return Err(ParseFailure::Empty);
    }
    if is_not_detected(&lower) {
        return Err(ParseFailure::NotDetected(trimmed.to_string()));
    }

    if let Some(caps) = RANGE_RE.captures(trimmed) {
        let low = clean_number(&caps[1]).and_then(finite);
        let high = clean_number(&caps[2]).and_then(finite);
        if let (Ok(a), Ok(b)) = (low, high) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            return Ok(Numeric::Range { low, high });
        }
    }

    match NUMBER_RE.find(trimmed) {
        Some(m) => clean_number(m.as_str())
            .and_then(finite)
            .map(|value| Numeric::Point { value }),
        None => Err(ParseFailure::NotNumeric(trimmed.to_string())),
    }
}

fn is_not_detected(lower: &str) -> bool {
    if lower.starts_with('<') {
        return true;
    }
    let stripped = lower.trim_end_matches(|c: char| c == ')' || c.is_whitespace());
    NOT_DETECTED_TOKENS.contains(&stripped)
        || NOT_DETECTED_TOKENS
            .iter()
            .any(|t| t.len() > 3 && stripped.starts_with(t))
}

/// Resolve comma usage: thousands separator or decimal comma.
fn clean_number(token: &str) -> Result<f64, ParseFailure> {
    let normalized = if !token.contains(',') {
        token.to_string()
    } else if token.contains('.') {
        token.replace(',', "")
    } else {
        let digits = token.trim_start_matches(['-', '+']);
        let parts: Vec<&str> = digits.split(',').collect();
        let thousands = parts[0].len() <= 3
            && !parts[0].is_empty()
            && parts[1..].iter().all(|p| p.len() == 3);
        if thousands {
            token.replace(',', "")
        } else if parts.len() == 2 {
            token.replacen(',', ".", 1)
        } else {
            token.replace(',', "")
        }
    };

    normalized
        .parse::<f64>()
        .map_err(|_| ParseFailure::NotNumeric(token.to_string()))
}

fn finite(value: f64) -> Result<f64, ParseFailure> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseFailure::NonFinite)
    }
}
