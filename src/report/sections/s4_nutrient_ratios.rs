//! Section 5: Nutrient Ratio Analysis
//!
//! Ratios are only formed between parameters measured in the same unit.
//! The reference ratio is the quotient of the two optimal values.

use serde::Serialize;

use crate::analysis::types::{Domain, Parameter};
use crate::error::SectionError;
use crate::report::sections::{fmt_num, SectionContext, NOT_DETERMINED};
use crate::report::types::{ContentBlock, ReportSection, SectionId, TableBlock};

#[derive(Debug, Clone, Copy)]
pub struct RatioSpec {
    pub label: &'static str,
    pub numerator: Parameter,
    pub denominator: Parameter,
}

impl RatioSpec {
    pub fn domain(&self) -> Domain {
        self.numerator.domain()
    }

    pub fn units_compatible(&self) -> bool {
        self.numerator.unit() == self.denominator.unit()
    }
}

pub static RATIO_SPECS: &[RatioSpec] = &[
    RatioSpec { label: "N:P", numerator: Parameter::LeafN, denominator: Parameter::LeafP },
    RatioSpec { label: "N:K", numerator: Parameter::LeafN, denominator: Parameter::LeafK },
    RatioSpec { label: "K:Mg", numerator: Parameter::LeafK, denominator: Parameter::LeafMg },
    RatioSpec { label: "Ca:Mg", numerator: Parameter::LeafCa, denominator: Parameter::LeafMg },
    RatioSpec { label: "N:B", numerator: Parameter::LeafN, denominator: Parameter::LeafB },
    RatioSpec { label: "Ca:Mg", numerator: Parameter::SoilExchCa, denominator: Parameter::SoilExchMg },
    RatioSpec { label: "K:Mg", numerator: Parameter::SoilExchK, denominator: Parameter::SoilExchMg },
    RatioSpec { label: "N:P", numerator: Parameter::SoilNitrogen, denominator: Parameter::SoilAvailP },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioRow {
    pub label: &'static str,
    pub domain: Domain,
    pub observed: Option<f64>,
    pub reference: Option<f64>,
    pub deviation_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RatioOutcome {
    Computed(RatioRow),
    Incompatible { label: &'static str, domain: Domain, units: (&'static str, &'static str) },
}

fn quotient(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

pub fn compute_ratio(spec: &RatioSpec, ctx: &SectionContext<'_>) -> RatioOutcome {
    if !spec.units_compatible() {
        return RatioOutcome::Incompatible {
            label: spec.label,
            domain: spec.domain(),
            units: (spec.numerator.unit().label(), spec.denominator.unit().label()),
        };
    }

    let num = ctx.find(spec.numerator);
    let den = ctx.find(spec.denominator);

    let observed = quotient(
        num.and_then(|c| c.observation.value),
        den.and_then(|c| c.observation.value),
    );
    let reference = quotient(
        num.and_then(|c| c.standard.as_ref()).map(|s| s.optimal),
        den.and_then(|c| c.standard.as_ref()).map(|s| s.optimal),
    );
    let deviation_pct = match (observed, reference) {
        (Some(o), Some(r)) if r != 0.0 => Some((o - r) / r * 100.0),
        _ => None,
    };

    RatioOutcome::Computed(RatioRow {
        label: spec.label,
        domain: spec.domain(),
        observed,
        reference,
        deviation_pct,
    })
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for spec in RATIO_SPECS {
        match compute_ratio(spec, ctx) {
            RatioOutcome::Computed(row) => rows.push(row),
            RatioOutcome::Incompatible { label, domain, units } => {
                skipped.push(format!("{} {} ({} vs {})", domain.key(), label, units.0, units.1))
            }
        }
    }

    if rows.iter().all(|r| r.observed.is_none()) {
        return Err(SectionError::NoData(
            "No nutrient ratios could be computed from this analysis.".to_string(),
        ));
    }

    let mut section = ReportSection::new(SectionId::NutrientRatios);
    let mut table = TableBlock::new(["Ratio", "Domain", "Observed", "Reference", "Deviation (%)"])
        .with_title("Nutrient ratios");
    let opt = |v: Option<f64>| v.map(fmt_num).unwrap_or_else(|| NOT_DETERMINED.to_string());
    for r in &rows {
        table.push_row(vec![
            r.label.to_string(),
            r.domain.title().to_string(),
            opt(r.observed),
            r.reference.map(fmt_num).unwrap_or_else(|| "-".to_string()),
            r.deviation_pct.map(|d| format!("{:+.1}", d)).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    section.push(ContentBlock::Table(table));

    if !skipped.is_empty() {
        section.narrative(format!(
            "Not computed because the units are incompatible: {}.",
            skipped.join(", ")
        ));
    }

    Ok(section)
}
