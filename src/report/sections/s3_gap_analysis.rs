//! Section 4: Nutrient Gap Analysis
//!
//! Gap = percentage deviation from the nearer bound of the reference range:
//! `(value - min) / |min| * 100` below the range, `(value - max) / |max| * 100`
//! above it, 0 inside it. Deficits are bucketed Balanced / Low / Critical by
//! the standard's thresholds. An excess within `balanced_pct` is Balanced and
//! any larger excess is Low, never Critical.
//!
//! Output order: Critical, Low, Balanced; within a bucket by descending
//! magnitude, deficits before excesses, then by name.

use std::cmp::Ordering;

use serde::Serialize;

use crate::analysis::types::{Domain, Parameter};
use crate::error::SectionError;
use crate::report::sections::{fmt_num, SectionContext};
use crate::report::types::{
    ChartBlock, ChartKind, ChartSeries, ContentBlock, ReportSection, SectionId, SeriesPoint, TableBlock,
};
use crate::standards::classify::ClassifiedParameter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GapBucket {
    Critical,
    Low,
    Balanced,
}

impl GapBucket {
    pub fn label(&self) -> &'static str {
        match self {
            GapBucket::Critical => "Critical",
            GapBucket::Low => "Low",
            GapBucket::Balanced => "Balanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GapDirection {
    Deficit,
    Excess,
    Within,
}

impl GapDirection {
    pub fn label(&self) -> &'static str {
        match self {
            GapDirection::Deficit => "Deficit",
            GapDirection::Excess => "Excess",
            GapDirection::Within => "Within range",
        }
    }
}

/// One ranked gap row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRow {
    pub name: String,
    pub parameter: Option<Parameter>,
    pub domain: Domain,
    pub observed: f64,
    /// The bound the gap is measured from.
    pub bound: f64,
    pub gap_pct: f64,
    pub direction: GapDirection,
    pub bucket: GapBucket,
}

impl GapRow {
    pub fn magnitude(&self) -> f64 {
        self.gap_pct.abs()
    }
}

/// Gap of one classified parameter; `None` without a value, a standard, or
/// with a zero reference bound.
pub fn compute_gap(classified: &ClassifiedParameter) -> Option<GapRow> {
    let value = classified.observation.value?;
    let standard = classified.standard.as_ref()?;
    let thresholds = standard.gap_thresholds;

    let (bound, direction) = if value < standard.min {
        (standard.min, GapDirection::Deficit)
    } else if value > standard.max {
        (standard.max, GapDirection::Excess)
    } else if (value - standard.min).abs() <= (standard.max - value).abs() {
        (standard.min, GapDirection::Within)
    } else {
        (standard.max, GapDirection::Within)
    };

    let gap_pct = match direction {
        GapDirection::Within => 0.0,
        _ if bound == 0.0 => return None,
        _ => (value - bound) / bound.abs() * 100.0,
    };

    let magnitude = gap_pct.abs();
    let bucket = match direction {
        GapDirection::Within => GapBucket::Balanced,
        _ if magnitude <= thresholds.balanced_pct => GapBucket::Balanced,
        // Excess caps at Low however far above the range
        GapDirection::Excess => GapBucket::Low,
        _ if magnitude <= thresholds.low_pct => GapBucket::Low,
        _ => GapBucket::Critical,
    };

    Some(GapRow {
        name: classified.name().to_string(),
        parameter: classified.observation.parameter(),
        domain: classified.observation.domain,
        observed: value,
        bound,
        gap_pct,
        direction,
        bucket,
    })
}

fn gap_order(a: &GapRow, b: &GapRow) -> Ordering {
    a.bucket
        .cmp(&b.bucket)
        .then_with(|| b.magnitude().total_cmp(&a.magnitude()))
        .then_with(|| a.direction.cmp(&b.direction))
        .then_with(|| a.name.cmp(&b.name))
}

/// Gap rows for every parameter with a value and a standard, ranked.
pub fn rank_gaps<'a>(classified: impl IntoIterator<Item = &'a ClassifiedParameter>) -> Vec<GapRow> {
    let mut rows: Vec<GapRow> = classified.into_iter().filter_map(compute_gap).collect();
    rows.sort_by(gap_order);
    rows
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let rows = rank_gaps(ctx.all_classified());
    if rows.is_empty() {
        return Err(SectionError::NoData(
            "No parameters with reference standards could be evaluated for nutrient gaps.".to_string(),
        ));
    }

    let count = |bucket: GapBucket| rows.iter().filter(|r| r.bucket == bucket).count();
    let (critical, low, balanced) = (count(GapBucket::Critical), count(GapBucket::Low), count(GapBucket::Balanced));

    let mut section = ReportSection::new(SectionId::GapAnalysis);
    section.narrative(format!(
        "{} parameter(s) evaluated: {} critical, {} low, {} balanced.",
        rows.len(),
        critical,
        low,
        balanced
    ));

    let mut table = TableBlock::new([
        "Parameter", "Domain", "Observed", "Reference Bound", "Gap (%)", "Direction", "Severity",
    ])
    .with_title("Nutrient gaps ranked by severity");
    for r in &rows {
        table.push_row(vec![
            r.name.clone(),
            r.domain.title().to_string(),
            fmt_num(r.observed),
            fmt_num(r.bound),
            format!("{:+.1}", r.gap_pct),
            r.direction.label().to_string(),
            r.bucket.label().to_string(),
        ]);
    }
    section.push(ContentBlock::Table(table));

    if ctx.options.include_charts {
        let charted: Vec<&GapRow> = rows.iter().filter(|r| r.direction != GapDirection::Within).collect();
        if !charted.is_empty() {
            let categories = charted.iter().map(|r| format!("{} ({})", r.name, r.domain.key())).collect();
            let points = charted.iter().map(|r| Some(SeriesPoint::Value(r.gap_pct))).collect();
            section.push(ContentBlock::Chart(
                ChartBlock::new("Deviation from reference range", ChartKind::Bar, categories)
                    .with_series(ChartSeries::new("Gap (%)", points))
                    .with_y_label("%"),
            ));
        }
    }

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::ParameterObservation;
    use crate::standards::classify::classify;
    use crate::standards::table::StandardsTable;
    use crate::utils::normalization::NormalizedName;
    use approx::assert_relative_eq;

    fn classified(p: Parameter, value: f64) -> ClassifiedParameter {
        let observation = ParameterObservation {
            name: NormalizedName::Canonical(p),
            domain: p.domain(),
            value: Some(value),
            range: None,
            unit: p.unit().label().to_string(),
            source_path: None,
            raw_text: None,
            miss: None,
        };
        classify(observation, &StandardsTable::oil_palm_defaults())
    }

    #[test]
    fn test_acidic_ph_is_critical() {
        let row = compute_gap(&classified(Parameter::SoilPh, 4.0)).unwrap();
        assert_relative_eq!(row.gap_pct, -11.111, epsilon = 1e-3);
        assert_eq!(row.direction, GapDirection::Deficit);
        assert_eq!(row.bucket, GapBucket::Critical);
    }

    #[test]
    fn test_within_range_is_balanced() {
        let row = compute_gap(&classified(Parameter::SoilPh, 5.0)).unwrap();
        assert_eq!(row.gap_pct, 0.0);
        assert_eq!(row.bucket, GapBucket::Balanced);
    }

    #[test]
    fn test_deficit_buckets() {
        // Leaf N 2.4-2.8, thresholds 5 / 15
        assert_eq!(compute_gap(&classified(Parameter::LeafN, 2.3)).unwrap().bucket, GapBucket::Balanced);
        assert_eq!(compute_gap(&classified(Parameter::LeafN, 2.1)).unwrap().bucket, GapBucket::Low);
        assert_eq!(compute_gap(&classified(Parameter::LeafN, 1.8)).unwrap().bucket, GapBucket::Critical);
    }

    #[test]
    fn test_excess_never_critical() {
        let row = compute_gap(&classified(Parameter::LeafB, 80.0)).unwrap();
        assert!(row.gap_pct > 100.0);
        assert_eq!(row.direction, GapDirection::Excess);
        assert_eq!(row.bucket, GapBucket::Low);
    }

    #[test]
    fn test_excess_buckets() {
        // Leaf N 2.4-2.8, thresholds 5 / 15
        let slight = compute_gap(&classified(Parameter::LeafN, 2.9)).unwrap();
        assert_eq!(slight.direction, GapDirection::Excess);
        assert_eq!(slight.bucket, GapBucket::Balanced);

        let far = compute_gap(&classified(Parameter::LeafN, 3.5)).unwrap();
        assert_relative_eq!(far.gap_pct, 25.0, epsilon = 1e-9);
        assert_eq!(far.bucket, GapBucket::Low);
    }

    #[test]
    fn test_ranking_order() {
        let params = vec![
            classified(Parameter::LeafK, 1.0),   // within
            classified(Parameter::LeafN, 2.1),   // low deficit 12.5%
            classified(Parameter::LeafB, 28.0),  // low excess 12%
            classified(Parameter::SoilPh, 4.0),  // critical 11.1%
            classified(Parameter::LeafZn, 6.0),  // critical 50%
            classified(Parameter::LeafCu, 4.9),  // balanced deficit 2%
        ];
        let rows = rank_gaps(&params);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Zn (mg/kg)", "pH", "N (%)", "B (mg/kg)", "Cu (mg/kg)", "K (%)"]
        );

        for pair in rows.windows(2) {
            assert!(pair[0].bucket <= pair[1].bucket);
            if pair[0].bucket == pair[1].bucket {
                assert!(pair[0].magnitude() >= pair[1].magnitude());
            }
        }
    }

    #[test]
    fn test_deficit_before_excess_on_equal_magnitude() {
        use crate::standards::table::ReferenceStandard;
        let mut table = StandardsTable::empty();
        table.insert(ReferenceStandard::new(Parameter::LeafZn, 10.0, 20.0, 15.0));
        table.insert(ReferenceStandard::new(Parameter::LeafB, 5.0, 10.0, 7.5));
        let observe = |p: Parameter, v: f64| {
            let mut c = classified(p, v);
            c.standard = table.get(p).cloned();
            c
        };
        // Zn 9 is -10%, B 11 is +10%; both Low
        let params = vec![observe(Parameter::LeafB, 11.0), observe(Parameter::LeafZn, 9.0)];
        let rows = rank_gaps(&params);
        assert_eq!(rows[0].bucket, rows[1].bucket);
        assert_eq!(rows[0].direction, GapDirection::Deficit);
        assert_eq!(rows[1].direction, GapDirection::Excess);
    }

    #[test]
    fn test_unresolved_and_zero_bound_skipped() {
        let mut table = StandardsTable::oil_palm_defaults();
        table.insert(crate::standards::table::ReferenceStandard::new(Parameter::LeafCu, 0.0, 8.0, 4.0));
        let observation = ParameterObservation {
            name: NormalizedName::Canonical(Parameter::LeafCu),
            domain: Domain::Leaf,
            value: Some(-1.0),
            range: None,
            unit: "mg/kg".into(),
            source_path: None,
            raw_text: None,
            miss: None,
        };
        assert!(compute_gap(&classify(observation, &table)).is_none());
    }
}
