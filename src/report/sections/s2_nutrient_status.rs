//! Sections 2 and 3: Soil / Leaf Nutrient Status
//!
//! One builder serves both domains: a 7-column parameter table and, when
//! charts are enabled, observed values against their bounds as a percentage
//! of the optimal value so differently scaled nutrients share one axis.

use crate::analysis::types::Domain;
use crate::error::SectionError;
use crate::report::sections::{fmt_num, fmt_observed, SectionContext};
use crate::report::types::{
    ChartBlock, ChartKind, ChartSeries, ContentBlock, ReportSection, SectionId, SeriesPoint, TableBlock,
};
use crate::standards::classify::{ClassifiedParameter, Status};

pub const STATUS_HEADERS: [&str; 7] = [
    "Parameter", "Observed", "Unit", "Minimum", "Maximum", "Optimal", "Status",
];

pub fn build_soil(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    build_nutrient_status(ctx, Domain::Soil)
}

pub fn build_leaf(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    build_nutrient_status(ctx, Domain::Leaf)
}

fn section_id(domain: Domain) -> SectionId {
    match domain {
        Domain::Soil => SectionId::SoilNutrientStatus,
        Domain::Leaf => SectionId::LeafNutrientStatus,
    }
}

pub fn build_nutrient_status(ctx: &SectionContext<'_>, domain: Domain) -> Result<ReportSection, SectionError> {
    let classified = ctx.classified(domain);
    if !classified.iter().any(|c| c.observation.is_resolved()) {
        return Err(SectionError::NoData(format!(
            "No {} data available in this analysis.",
            domain.key()
        )));
    }

    let mut section = ReportSection::new(section_id(domain));
    section.push(ContentBlock::Table(status_table(domain, classified)));

    let deficient: Vec<&str> = names_with(classified, Status::Deficient);
    let excessive: Vec<&str> = names_with(classified, Status::Excessive);
    if deficient.is_empty() && excessive.is_empty() {
        section.narrative(format!(
            "All measured {} parameters are within their reference ranges.",
            domain.key()
        ));
    } else {
        if !deficient.is_empty() {
            section.narrative(format!("Below reference range: {}.", deficient.join(", ")));
        }
        if !excessive.is_empty() {
            section.narrative(format!("Above reference range: {}.", excessive.join(", ")));
        }
    }

    let unresolved = classified.iter().filter(|c| !c.observation.is_resolved()).count();
    if unresolved > 0 {
        section.narrative(format!(
            "{} parameter(s) could not be determined from the analysis data.",
            unresolved
        ));
    }

    if ctx.options.include_charts {
        if let Some(chart) = status_chart(domain, classified) {
            section.push(ContentBlock::Chart(chart));
        }
    }

    Ok(section)
}

fn names_with(classified: &[ClassifiedParameter], status: Status) -> Vec<&str> {
    classified
        .iter()
        .filter(|c| c.status == status)
        .map(|c| c.name())
        .collect()
}

fn status_table(domain: Domain, classified: &[ClassifiedParameter]) -> TableBlock {
    let mut table = TableBlock::new(STATUS_HEADERS).with_title(format!("{} analysis results", domain.title()));

    for c in classified {
        let (min, max, optimal) = match &c.standard {
            Some(s) => (fmt_num(s.min), fmt_num(s.max), fmt_num(s.optimal)),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        table.push_row(vec![
            c.name().to_string(),
            fmt_observed(&c.observation),
            c.observation.unit.clone(),
            min,
            max,
            optimal,
            c.status.label().to_string(),
        ]);
    }
    table
}

fn status_chart(domain: Domain, classified: &[ClassifiedParameter]) -> Option<ChartBlock> {
    let charted: Vec<&ClassifiedParameter> = classified
        .iter()
        .filter(|c| c.observation.is_resolved())
        .filter(|c| c.standard.as_ref().is_some_and(|s| s.optimal != 0.0))
        .collect();
    if charted.is_empty() {
        return None;
    }

    let mut observed = Vec::with_capacity(charted.len());
    let mut minimum = Vec::with_capacity(charted.len());
    let mut maximum = Vec::with_capacity(charted.len());
    for c in &charted {
        let Some(s) = c.standard.as_ref() else {
            continue;
        };
        let pct = |v: f64| v / s.optimal * 100.0;
        let point = match (c.observation.value, c.observation.range) {
            (_, Some((low, high))) => Some(SeriesPoint::range(pct(low), pct(high))),
            (Some(v), None) => Some(SeriesPoint::Value(pct(v))),
            (None, None) => None,
        };
        observed.push(point);
        minimum.push(Some(SeriesPoint::Value(pct(s.min))));
        maximum.push(Some(SeriesPoint::Value(pct(s.max))));
    }

    let categories = charted.iter().map(|c| c.name().to_string()).collect();
    Some(
        ChartBlock::new(format!("{} nutrients relative to optimal", domain.title()), ChartKind::Bar, categories)
            .with_series(ChartSeries::new("Observed", observed))
            .with_series(ChartSeries::new("Minimum", minimum))
            .with_series(ChartSeries::new("Maximum", maximum))
            .with_y_label("% of optimal"),
    )
}
