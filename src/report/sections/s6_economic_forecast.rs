//! Section 7: Economic Forecast
//!
//! Investment, revenue, ROI and payback per investment scenario. Any figure
//! may be a number or a range string. ROI is clamped to `roi_cap_pct` when the
//! engine is configured with one, and clamped cells are marked.

use serde::Serialize;
use serde_json::Value;

use crate::analysis::strategies::{get_normalized, walk};
use crate::error::SectionError;
use crate::report::forecast::Scenario;
use crate::report::sections::{first_text, fmt_range, SectionContext};
use crate::report::types::{
    ChartBlock, ChartKind, ChartSeries, ContentBlock, ReportSection, SectionId, SeriesPoint, TableBlock,
};
use crate::utils::sanitize::{parse_numeric, Numeric};

const SCENARIO_PATHS: &[&[&str]] = &[
    &["economic_forecast", "scenarios"],
    &["analysis_results", "economic_forecast", "scenarios"],
    &["economic_forecast"],
    &["analysis_results", "economic_forecast"],
];

const NOTE_PATHS: &[&[&str]] = &[
    &["economic_forecast", "assumptions"],
    &["economic_forecast", "notes"],
    &["analysis_results", "economic_forecast", "assumptions"],
];

const INVESTMENT_KEYS: &[&str] = &["investment_cost", "investment", "total_investment", "cost_per_ha", "total_cost"];
const REVENUE_KEYS: &[&str] = &["revenue", "additional_revenue", "expected_revenue", "revenue_per_ha"];
const ROI_KEYS: &[&str] = &["roi", "roi_percentage", "roi_pct", "roi_range"];
const PAYBACK_KEYS: &[&str] = &["payback_months", "payback_period", "payback"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicScenario {
    pub scenario: Scenario,
    pub investment: Option<Numeric>,
    pub revenue: Option<Numeric>,
    pub roi: Option<Numeric>,
    pub payback_months: Option<Numeric>,
    pub roi_capped: bool,
}

impl EconomicScenario {
    fn is_empty(&self) -> bool {
        self.investment.is_none() && self.revenue.is_none() && self.roi.is_none() && self.payback_months.is_none()
    }
}

fn numeric_at(entry: &Value, keys: &[&str]) -> Option<Numeric> {
    let map = entry.as_object()?;
    keys.iter()
        .filter_map(|k| get_normalized(map, k))
        .find_map(|v| parse_numeric(v).ok())
}

/// Clamp both bounds to `cap`; reports whether anything was clamped.
pub fn cap_roi(roi: Numeric, cap: Option<f64>) -> (Numeric, bool) {
    let Some(cap) = cap else {
        return (roi, false);
    };
    match roi {
        Numeric::Point { value } if value > cap => (Numeric::Point { value: cap }, true),
        Numeric::Range { low, high } if high > cap => {
            let low = low.min(cap);
            if low == cap {
                (Numeric::Point { value: cap }, true)
            } else {
                (Numeric::Range { low, high: cap }, true)
            }
        }
        other => (other, false),
    }
}

pub fn parse_scenario(scenario: Scenario, entry: &Value, roi_cap: Option<f64>) -> EconomicScenario {
    let (roi, roi_capped) = match numeric_at(entry, ROI_KEYS) {
        Some(roi) => {
            let (roi, capped) = cap_roi(roi, roi_cap);
            (Some(roi), capped)
        }
        None => (None, false),
    };
    EconomicScenario {
        scenario,
        investment: numeric_at(entry, INVESTMENT_KEYS),
        revenue: numeric_at(entry, REVENUE_KEYS),
        roi,
        payback_months: numeric_at(entry, PAYBACK_KEYS),
        roi_capped,
    }
}

fn cell(n: &Option<Numeric>) -> String {
    match n {
        Some(n) => {
            let (low, high) = n.bounds();
            fmt_range(low, high)
        }
        None => "-".to_string(),
    }
}

fn series_point(n: &Option<Numeric>) -> Option<SeriesPoint> {
    n.as_ref().map(|n| {
        let (low, high) = n.bounds();
        SeriesPoint::range(low, high)
    })
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let container = SCENARIO_PATHS
        .iter()
        .filter_map(|path| walk(ctx.document, &path[..]))
        .find(|v| Scenario::ALL.iter().any(|s| s.lookup(v).is_some()));

    let Some(container) = container else {
        return Err(SectionError::NoData(
            "No economic forecast is available for this analysis.".to_string(),
        ));
    };

    let scenarios: Vec<EconomicScenario> = Scenario::ALL
        .iter()
        .filter_map(|s| s.lookup(container).map(|entry| parse_scenario(*s, entry, ctx.config.roi_cap_pct)))
        .filter(|e| !e.is_empty())
        .collect();

    if scenarios.is_empty() {
        return Err(SectionError::MalformedInput(
            "economic forecast scenarios carry no numeric figures".to_string(),
        ));
    }

    let mut section = ReportSection::new(SectionId::EconomicForecast);
    let mut table = TableBlock::new([
        "Scenario", "Investment (RM/ha)", "Revenue (RM/ha)", "ROI (%)", "Payback (months)",
    ])
    .with_title("Investment scenarios");
    for e in &scenarios {
        let mut roi = cell(&e.roi);
        if e.roi_capped {
            roi.push('*');
        }
        table.push_row(vec![
            e.scenario.label().to_string(),
            cell(&e.investment),
            cell(&e.revenue),
            roi,
            cell(&e.payback_months),
        ]);
    }
    section.push(ContentBlock::Table(table));

    if let (true, Some(cap)) = (scenarios.iter().any(|e| e.roi_capped), ctx.config.roi_cap_pct) {
        section.narrative(format!("* ROI capped at {}% for reporting.", cap));
    }
    if let Some(notes) = first_text(ctx.document, NOTE_PATHS) {
        section.narrative(notes);
    }

    if ctx.options.include_charts && scenarios.iter().any(|e| e.roi.is_some()) {
        let categories = scenarios.iter().map(|e| e.scenario.label().to_string()).collect();
        let points = scenarios.iter().map(|e| series_point(&e.roi)).collect();
        section.push(ContentBlock::Chart(
            ChartBlock::new("Return on investment by scenario", ChartKind::Bar, categories)
                .with_series(ChartSeries::new("ROI (%)", points))
                .with_y_label("%"),
        ));
    }

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Options};
    use crate::report::sections::test_support::{classify_doc, context};
    use serde_json::json;

    fn run(doc: &Value, config: &EngineConfig) -> Result<ReportSection, SectionError> {
        let (soil, leaf) = classify_doc(doc);
        let options = Options::default();
        build(&context(doc, &soil, &leaf, &options, config))
    }

    fn forecast_doc() -> Value {
        json!({"economic_forecast": {
            "scenarios": {
                "high": {"investment_cost": "RM 2,500", "revenue": "4,000-4,800", "roi": "60-92%", "payback_months": 18},
                "medium": {"investment": 1800, "roi_percentage": "45%"},
                "low": {"notes": "nothing numeric"}
            },
            "assumptions": "FFB price RM 650/t."
        }})
    }

    #[test]
    fn test_scenarios_tabulated() {
        let section = run(&forecast_doc(), &EngineConfig::default()).unwrap();
        let table = section.tables().next().unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["High Investment", "2500", "4000-4800", "60.0-92.0", "18.0"]);
        assert_eq!(table.rows[1][3], "45.0");
        assert!(section.narratives().any(|n| n == "FFB price RM 650/t."));
        assert_eq!(section.charts().count(), 1);
    }

    #[test]
    fn test_roi_cap_marks_cells() {
        let config = EngineConfig {
            roi_cap_pct: Some(80.0),
            ..EngineConfig::default()
        };
        let section = run(&forecast_doc(), &config).unwrap();
        let table = section.tables().next().unwrap();
        assert_eq!(table.rows[0][3], "60.0-80.0*");
        assert_eq!(table.rows[1][3], "45.0");
        assert!(section.narratives().any(|n| n.contains("capped at 80%")));
    }

    #[test]
    fn test_cap_roi() {
        assert_eq!(cap_roi(Numeric::Point { value: 120.0 }, Some(100.0)), (Numeric::Point { value: 100.0 }, true));
        assert_eq!(
            cap_roi(Numeric::Range { low: 110.0, high: 130.0 }, Some(100.0)),
            (Numeric::Point { value: 100.0 }, true)
        );
        assert_eq!(cap_roi(Numeric::Point { value: 120.0 }, None), (Numeric::Point { value: 120.0 }, false));
    }

    #[test]
    fn test_missing_forecast() {
        assert!(matches!(run(&json!({}), &EngineConfig::default()), Err(SectionError::NoData(_))));
        assert!(matches!(
            run(&json!({"economic_forecast": {"high": {"roi": "n/a"}}}), &EngineConfig::default()),
            Err(SectionError::MalformedInput(_))
        ));
    }
}
