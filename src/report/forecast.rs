//! Forecast series normalisation
//!
//! Upstream forecasts arrive as a flat list of yearly numbers, or as a
//! `year_N` map whose values may be range strings ("25.5-27.0 t/ha"). Both are
//! normalised to one (low, mid, high) triple per year. Year 0 is always the
//! baseline yield.

use serde::Serialize;
use serde_json::Value;

use crate::analysis::strategies::{extract_value, get_normalized, walk};
use crate::error::SectionError;
use crate::utils::normalization::normalize_key;
use crate::utils::sanitize::{parse_numeric, sanitize, Numeric};

/// Forecast horizon in years.
pub const FORECAST_YEARS: u32 = 5;

/// Where the current yield may be reported, first hit wins.
const BASELINE_PATHS: &[&[&str]] = &[
    &["yield_forecast", "baseline_yield"],
    &["analysis_results", "yield_forecast", "baseline_yield"],
    &["land_yield_data", "current_yield"],
    &["current_yield"],
];

/// Investment scenario of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    High,
    Medium,
    Low,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::High, Scenario::Medium, Scenario::Low];

    pub fn key(&self) -> &'static str {
        match self {
            Scenario::High => "high",
            Scenario::Medium => "medium",
            Scenario::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::High => "High Investment",
            Scenario::Medium => "Medium Investment",
            Scenario::Low => "Low Investment",
        }
    }

    /// Scenario entry in a container keyed `high_investment` or `high`.
    pub fn lookup<'v>(&self, container: &'v Value) -> Option<&'v Value> {
        let map = container.as_object()?;
        get_normalized(map, &format!("{}_investment", self.key()))
            .or_else(|| get_normalized(map, self.key()))
    }
}

/// One forecast year as a (low, mid, high) triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyYield {
    pub year: u32,
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl YearlyYield {
    pub fn point(year: u32, value: f64) -> Self {
        Self {
            year,
            low: value,
            mid: value,
            high: value,
        }
    }

    pub fn from_numeric(year: u32, numeric: Numeric) -> Self {
        let (low, high) = numeric.bounds();
        Self {
            year,
            low,
            mid: numeric.point(),
            high,
        }
    }

    pub fn is_range(&self) -> bool {
        self.low != self.high
    }
}

/// Current yield and where it came from; `source` is `None` for the default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub value: f64,
    pub source: Option<String>,
}

impl Baseline {
    pub fn is_default(&self) -> bool {
        self.source.is_none()
    }
}

/// Observed current yield, or `default` when none is reported.
pub fn resolve_baseline(document: &Value, default: f64) -> Baseline {
    for path in BASELINE_PATHS {
        if let Some(raw) = walk(document, &path[..]) {
            if let Ok(value) = sanitize(raw) {
                if value > 0.0 {
                    return Baseline {
                        value,
                        source: Some(path.join(".")),
                    };
                }
            }
        }
    }
    Baseline {
        value: default,
        source: None,
    }
}

/// Year number from keys like `year_3`, `Year 3`, `year3` or `3`.
fn year_index(key: &str) -> Option<u32> {
    let k = normalize_key(key);
    let digits = k.strip_prefix("year").unwrap_or(&k).trim_start_matches('_');
    digits.parse().ok()
}

fn year_value(raw: &Value) -> Option<Numeric> {
    if let Value::Object(map) = raw {
        let low = get_normalized(map, "low").and_then(|v| sanitize(v).ok());
        let high = get_normalized(map, "high").and_then(|v| sanitize(v).ok());
        if let (Some(low), Some(high)) = (low, high) {
            return Some(Numeric::Range {
                low: low.min(high),
                high: low.max(high),
            });
        }
        return extract_value(raw).ok().map(|(n, _)| n);
    }
    parse_numeric(raw).ok()
}

/// Normalise one scenario's series. Year 0 is replaced by `baseline`.
///
/// A list of `FORECAST_YEARS + 1` entries starts at year 0; shorter lists
/// start at year 1. Unparseable years are left out.
pub fn normalize_series(raw: &Value, baseline: f64) -> Result<Vec<YearlyYield>, SectionError> {
    let mut years: Vec<YearlyYield> = Vec::new();

    match raw {
        Value::Array(items) => {
            let offset = if items.len() as u32 == FORECAST_YEARS + 1 { 0 } else { 1 };
            for (i, item) in items.iter().enumerate() {
                let year = i as u32 + offset;
                match year_value(item) {
                    Some(n) => years.push(YearlyYield::from_numeric(year, n)),
                    None => tracing::debug!("forecast year {} unparseable: {}", year, item),
                }
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let Some(year) = year_index(key) else {
                    continue;
                };
                match year_value(item) {
                    Some(n) => years.push(YearlyYield::from_numeric(year, n)),
                    None => tracing::debug!("forecast {} unparseable: {}", key, item),
                }
            }
        }
        other => {
            return Err(SectionError::MalformedInput(format!(
                "forecast series must be a list or a year map, got {}",
                json_kind(other)
            )))
        }
    }

    years.retain(|y| y.year >= 1 && y.year <= FORECAST_YEARS);
    years.sort_by_key(|y| y.year);
    years.dedup_by_key(|y| y.year);

    if years.is_empty() {
        return Err(SectionError::NoData("forecast series has no usable years".to_string()));
    }

    years.insert(0, YearlyYield::point(0, baseline));
    Ok(years)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
