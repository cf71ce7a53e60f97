//! Section 8: 5-Year Yield Forecast

use crate::error::SectionError;
use crate::report::forecast::{normalize_series, resolve_baseline, Scenario, YearlyYield, FORECAST_YEARS};
use crate::report::sections::{first_value, fmt_num, fmt_range, SectionContext};
use crate::report::types::{
    ChartBlock, ChartKind, ChartSeries, ContentBlock, ReportSection, SectionId, SeriesPoint, TableBlock,
};

const FORECAST_PATHS: &[&[&str]] = &[
    &["yield_forecast"],
    &["analysis_results", "yield_forecast"],
];

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let Some(forecast) = first_value(ctx.document, FORECAST_PATHS).filter(|v| v.is_object()) else {
        return Err(SectionError::NoData(
            "No yield forecast is available for this analysis.".to_string(),
        ));
    };

    let baseline = resolve_baseline(ctx.document, ctx.config.default_baseline_yield);

    let mut scenarios: Vec<(Scenario, Vec<YearlyYield>)> = Vec::new();
    let mut last_error = None;
    for scenario in Scenario::ALL {
        let Some(raw) = scenario.lookup(forecast) else {
            continue;
        };
        match normalize_series(raw, baseline.value) {
            Ok(years) => scenarios.push((scenario, years)),
            Err(e) => {
                tracing::debug!("{:?} yield scenario skipped: {}", scenario, e);
                last_error = Some(e);
            }
        }
    }

    if scenarios.is_empty() {
        return Err(last_error.unwrap_or_else(|| {
            SectionError::NoData("The yield forecast contains no investment scenarios.".to_string())
        }));
    }

    let mut section = ReportSection::new(SectionId::YieldForecast);
    if baseline.is_default() {
        section.narrative(format!(
            "Current yield was not reported; a baseline of {} t/ha is assumed for year 0.",
            fmt_num(baseline.value)
        ));
    } else {
        section.narrative(format!("Baseline (year 0) yield: {} t/ha.", fmt_num(baseline.value)));
    }

    let mut headers = vec!["Year".to_string()];
    headers.extend(scenarios.iter().map(|(s, _)| format!("{} (t/ha)", s.label())));
    let mut table = TableBlock::new(headers).with_title("Projected yield by investment scenario");

    for year in 0..=FORECAST_YEARS {
        let mut row = vec![format!("Year {}", year)];
        row.extend(scenarios.iter().map(|(_, years)| {
            years
                .iter()
                .find(|y| y.year == year)
                .map(|y| fmt_range(y.low, y.high))
                .unwrap_or_else(|| "-".to_string())
        }));
        table.push_row(row);
    }
    section.push(ContentBlock::Table(table));

    if ctx.options.include_charts {
        let categories = (0..=FORECAST_YEARS).map(|y| format!("Year {}", y)).collect();
        let mut chart = ChartBlock::new("Yield projection", ChartKind::Line, categories).with_y_label("t/ha");
        for (scenario, years) in &scenarios {
            let points = (0..=FORECAST_YEARS)
                .map(|year| {
                    years
                        .iter()
                        .find(|y| y.year == year)
                        .map(|y| SeriesPoint::range(y.low, y.high))
                })
                .collect();
            chart = chart.with_series(ChartSeries::new(scenario.label(), points));
        }
        section.push(ContentBlock::Chart(chart));
    }

    Ok(section)
}
