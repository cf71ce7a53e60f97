//! Reference Standards Table
//!
//! Acceptable ranges (min, max, optimal) per canonical parameter. The table is
//! read-only once built and is shared by every report request.
//!
//! Sources:
//! - built-in oil palm defaults (soil survey ranges, frond-17 leaf ranges)
//! - JSON file from the configuration store:
//!   `{"soil": {"pH": {"min": 4.5, "max": 5.5, "optimal": 5.0}}, "leaf": {...}}`

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::types::{Domain, Parameter};
use crate::utils::normalization::{normalize, NormalizedName};
use crate::utils::sanitize::sanitize;

/// Deficit size (percent of the nearer bound) separating gap buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapThresholds {
    /// Up to this magnitude a gap is Balanced.
    pub balanced_pct: f64,
    /// Up to this magnitude a deficit is Low; beyond it, Critical.
    pub low_pct: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            balanced_pct: 5.0,
            low_pct: 15.0,
        }
    }
}

impl GapThresholds {
    /// pH is logarithmic: a 10% shortfall is already a tenfold acidity change.
    pub fn for_parameter(parameter: Parameter) -> Self {
        match parameter {
            Parameter::SoilPh => Self {
                balanced_pct: 2.0,
                low_pct: 10.0,
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceStandard {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
    pub unit: String,
    pub gap_thresholds: GapThresholds,
}

impl ReferenceStandard {
    pub fn new(parameter: Parameter, min: f64, max: f64, optimal: f64) -> Self {
        Self {
            parameter,
            min,
            max,
            optimal,
            unit: parameter.unit().label().to_string(),
            gap_thresholds: GapThresholds::for_parameter(parameter),
        }
    }

    pub fn with_thresholds(mut self, thresholds: GapThresholds) -> Self {
        self.gap_thresholds = thresholds;
        self
    }

    /// "4.5-5.5" style display of the acceptable range.
    pub fn range_label(&self) -> String {
        format!("{}-{}", fmt_bound(self.min), fmt_bound(self.max))
    }
}

fn fmt_bound(v: f64) -> String {
    let s = format!("{:.3}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Lookup of reference standards by canonical parameter.
#[derive(Debug, Clone, Default)]
pub struct StandardsTable {
    entries: FxHashMap<Parameter, ReferenceStandard>,
}

impl StandardsTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, standard: ReferenceStandard) {
        self.entries.insert(standard.parameter, standard);
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ReferenceStandard> {
        self.entries.get(&parameter)
    }

    /// Unmatched names never have a standard.
    pub fn lookup(&self, name: &NormalizedName) -> Option<&ReferenceStandard> {
        name.parameter().and_then(|p| self.get(p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oil palm reference ranges for mineral soils and frond-17 leaf samples.
    pub fn oil_palm_defaults() -> Self {
        use Parameter::*;
        let rows: [(Parameter, f64, f64, f64); 17] = [
            (SoilPh, 4.5, 5.5, 5.0),
            (SoilNitrogen, 0.10, 0.15, 0.125),
            (SoilOrganicCarbon, 1.5, 2.5, 2.0),
            (SoilTotalP, 150.0, 300.0, 225.0),
            (SoilAvailP, 15.0, 30.0, 22.0),
            (SoilExchK, 0.15, 0.25, 0.20),
            (SoilExchCa, 0.50, 1.00, 0.75),
            (SoilExchMg, 0.25, 0.45, 0.35),
            (SoilCec, 8.0, 15.0, 12.0),
            (LeafN, 2.4, 2.8, 2.6),
            (LeafP, 0.15, 0.18, 0.165),
            (LeafK, 0.9, 1.2, 1.05),
            (LeafMg, 0.25, 0.35, 0.30),
            (LeafCa, 0.5, 0.7, 0.6),
            (LeafB, 15.0, 25.0, 20.0),
            (LeafCu, 5.0, 8.0, 6.5),
            (LeafZn, 12.0, 18.0, 15.0),
        ];

        let mut table = Self::empty();
        for (p, min, max, optimal) in rows {
            table.insert(ReferenceStandard::new(p, min, max, optimal));
        }
        table
    }

    /// Load a standards table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read standards file: {:?}", path))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse standards file: {:?}", path))
    }

    /// Parse the JSON standards format. Invalid entries are skipped with a warning.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: RawTable = serde_json::from_str(contents)
            .with_context(|| "Standards JSON does not match {\"soil\": {..}, \"leaf\": {..}}")?;

        let mut table = Self::empty();
        for (domain, entries) in [(Domain::Soil, raw.soil), (Domain::Leaf, raw.leaf)] {
            for (label, entry) in entries {
                match entry.into_standard(&label, domain) {
                    Ok(standard) => table.insert(standard),
                    Err(e) => tracing::warn!("Skipping {} standard {:?}: {}", domain.key(), label, e),
                }
            }
        }

        if table.is_empty() {
            anyhow::bail!("Standards table contains no usable entries");
        }
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    soil: BTreeMap<String, RawStandard>,
    #[serde(default)]
    leaf: BTreeMap<String, RawStandard>,
}

#[derive(Debug, Deserialize)]
struct RawStandard {
    min: Value,
    max: Value,
    #[serde(default)]
    optimal: Option<Value>,
    #[serde(default)]
    balanced_gap_pct: Option<f64>,
    #[serde(default)]
    low_gap_pct: Option<f64>,
}

impl RawStandard {
    fn into_standard(self, label: &str, domain: Domain) -> Result<ReferenceStandard> {
        let parameter = match normalize(label, domain) {
            NormalizedName::Canonical(p) => p,
            NormalizedName::Unmatched(_) => anyhow::bail!("unknown parameter label"),
        };

        let min = sanitize(&self.min).with_context(|| "invalid min")?;
        let max = sanitize(&self.max).with_context(|| "invalid max")?;
        if min > max {
            anyhow::bail!("min {} exceeds max {}", min, max);
        }
        let optimal = match &self.optimal {
            Some(v) => sanitize(v).with_context(|| "invalid optimal")?,
            None => (min + max) / 2.0,
        };

        let defaults = GapThresholds::for_parameter(parameter);
        let thresholds = GapThresholds {
            balanced_pct: self.balanced_gap_pct.unwrap_or(defaults.balanced_pct),
            low_pct: self.low_gap_pct.unwrap_or(defaults.low_pct),
        };
        if thresholds.balanced_pct < 0.0 || thresholds.low_pct < thresholds.balanced_pct {
            anyhow::bail!("gap thresholds must satisfy 0 <= balanced <= low");
        }

        Ok(ReferenceStandard::new(parameter, min, max, optimal).with_thresholds(thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_parameter() {
        let table = StandardsTable::oil_palm_defaults();
        for domain in Domain::ALL {
            for p in Parameter::all(domain) {
                let s = table.get(*p).unwrap();
                assert!(s.min <= s.optimal && s.optimal <= s.max, "{:?}", p);
            }
        }
        assert_eq!(table.len(), 17);
    }

    #[test]
    fn test_ph_uses_tighter_thresholds() {
        let table = StandardsTable::oil_palm_defaults();
        assert_eq!(table.get(Parameter::SoilPh).unwrap().gap_thresholds.low_pct, 10.0);
        assert_eq!(table.get(Parameter::LeafN).unwrap().gap_thresholds, GapThresholds::default());
    }

    #[test]
    fn test_from_json_with_aliases_and_strings() {
        let json = r#"{
            "soil": {
                "Soil pH": {"min": "4.5", "max": 5.5},
                "Available Phosphorus": {"min": 18, "max": 30, "optimal": 25, "low_gap_pct": 20}
            },
            "leaf": {"K": {"min": 0.9, "max": 1.3}}
        }"#;
        let table = StandardsTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 3);

        let ph = table.get(Parameter::SoilPh).unwrap();
        assert_eq!(ph.optimal, 5.0);
        assert_eq!(ph.range_label(), "4.5-5.5");

        let p = table.get(Parameter::SoilAvailP).unwrap();
        assert_eq!(p.gap_thresholds.low_pct, 20.0);
        assert_eq!(p.gap_thresholds.balanced_pct, 5.0);
        assert_eq!(p.unit, "mg/kg");

        assert!(table.get(Parameter::LeafK).is_some());
        assert!(table.get(Parameter::SoilExchK).is_none());
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let json = r#"{"soil": {
            "pH": {"min": 6, "max": 5},
            "Sulphur": {"min": 1, "max": 2},
            "CEC": {"min": "n.d.", "max": 15},
            "N": {"min": 0.1, "max": 0.15}
        }}"#;
        let table = StandardsTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get(Parameter::SoilNitrogen).is_some());
    }

    #[test]
    fn test_all_invalid_is_error() {
        assert!(StandardsTable::from_json_str(r#"{"soil": {"pH": {"min": 6, "max": 5}}}"#).is_err());
        assert!(StandardsTable::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_lookup_unmatched_name() {
        let table = StandardsTable::oil_palm_defaults();
        assert!(table.lookup(&NormalizedName::Unmatched("S (%)".into())).is_none());
        assert!(table.lookup(&NormalizedName::Canonical(Parameter::LeafB)).is_some());
    }
}
