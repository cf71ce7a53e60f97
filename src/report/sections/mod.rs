//! Section builders
//!
//! One builder per section, each `fn(&SectionContext) -> Result<ReportSection, SectionError>`.
//! `build_section` wraps a builder at the section boundary: errors and panics
//! become a fallback section and are logged, never propagated.

pub mod s1_summary;
pub mod s2_nutrient_status;
pub mod s3_gap_analysis;
pub mod s4_nutrient_ratios;
pub mod s5_step_analysis;
pub mod s6_economic_forecast;
pub mod s7_yield_forecast;
pub mod s8_conclusion;
pub mod s9_references;

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::analysis::strategies::walk;
use crate::analysis::types::{Domain, Parameter, ParameterObservation};
use crate::config::{EngineConfig, Options};
use crate::error::SectionError;
use crate::report::types::{ReportSection, SectionId};
use crate::standards::classify::ClassifiedParameter;

pub use s9_references::{ReferenceCatalog, ReferenceEntry, StaticCatalog};

/// Table marker for unresolved values.
pub const NOT_DETERMINED: &str = "Not determined";

/// Everything a builder may read. Built once per request.
pub struct SectionContext<'a> {
    pub document: &'a Value,
    pub soil: &'a [ClassifiedParameter],
    pub leaf: &'a [ClassifiedParameter],
    pub options: &'a Options,
    pub config: &'a EngineConfig,
    pub catalog: Option<&'a dyn ReferenceCatalog>,
}

impl<'a> SectionContext<'a> {
    pub fn classified(&self, domain: Domain) -> &'a [ClassifiedParameter] {
        match domain {
            Domain::Soil => self.soil,
            Domain::Leaf => self.leaf,
        }
    }

    /// Soil then leaf.
    pub fn all_classified(&self) -> impl Iterator<Item = &'a ClassifiedParameter> {
        self.soil.iter().chain(self.leaf.iter())
    }

    pub fn find(&self, parameter: Parameter) -> Option<&'a ClassifiedParameter> {
        self.classified(parameter.domain())
            .iter()
            .find(|c| c.observation.parameter() == Some(parameter))
    }
}

pub type SectionBuilder = fn(&SectionContext<'_>) -> Result<ReportSection, SectionError>;

pub fn builder_for(id: SectionId) -> SectionBuilder {
    match id {
        SectionId::ExecutiveSummary => s1_summary::build,
        SectionId::SoilNutrientStatus => s2_nutrient_status::build_soil,
        SectionId::LeafNutrientStatus => s2_nutrient_status::build_leaf,
        SectionId::GapAnalysis => s3_gap_analysis::build,
        SectionId::NutrientRatios => s4_nutrient_ratios::build,
        SectionId::StepAnalysis => s5_step_analysis::build,
        SectionId::EconomicForecast => s6_economic_forecast::build,
        SectionId::YieldForecast => s7_yield_forecast::build,
        SectionId::Conclusion => s8_conclusion::build,
        SectionId::References => s9_references::build,
    }
}

/// Build one section with its registered builder.
pub fn build_section(id: SectionId, ctx: &SectionContext<'_>) -> ReportSection {
    build_isolated(id, builder_for(id), ctx)
}

/// Run a builder, turning any error or panic into a fallback section.
pub fn build_isolated(id: SectionId, builder: SectionBuilder, ctx: &SectionContext<'_>) -> ReportSection {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| builder(ctx)))
        .unwrap_or_else(|payload| Err(SectionError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(mut section) => {
            section.id = id;
            section
        }
        Err(e) => {
            match &e {
                SectionError::NoData(_) => tracing::info!("{:?} has no data: {}", id, e),
                _ => tracing::warn!("{:?} failed: {}", id, e),
            }
            ReportSection::fallback(id, fallback_message(id, &e))
        }
    }
}

fn fallback_message(id: SectionId, error: &SectionError) -> String {
    match error {
        SectionError::NoData(message) => message.clone(),
        SectionError::MalformedInput(message) => format!(
            "{} could not be generated: the analysis data is malformed ({}).",
            id.title(),
            message
        ),
        SectionError::Panicked(_) => {
            format!("{} could not be generated due to an internal error.", id.title())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Shared formatting and lookup helpers
// ============================================================================

/// Compact number display: more decimals for small magnitudes.
pub fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if a >= 100.0 {
        format!("{:.0}", v)
    } else if a >= 10.0 {
        format!("{:.1}", v)
    } else if a >= 1.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.3}", v)
    }
}

pub fn fmt_range(low: f64, high: f64) -> String {
    if low == high {
        fmt_num(low)
    } else {
        format!("{}-{}", fmt_num(low), fmt_num(high))
    }
}

/// Observed value cell, or the not-determined marker.
pub fn fmt_observed(observation: &ParameterObservation) -> String {
    match (observation.value, observation.range) {
        (Some(v), Some((low, high))) => format!("{} ({})", fmt_num(v), fmt_range(low, high)),
        (Some(v), None) => fmt_num(v),
        (None, _) => NOT_DETERMINED.to_string(),
    }
}

/// Text at the first path holding a non-empty string or list of strings.
pub fn first_text(document: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| walk(document, &path[..]))
        .find_map(text_of)
}

/// A string, or a list of strings joined into paragraphs.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_of).collect();
            (!parts.is_empty()).then(|| parts.join("\n\n"))
        }
        _ => None,
    }
}

/// Display text for an arbitrary table cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.as_f64().map(fmt_num).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

/// First value reachable at any of the paths.
pub fn first_value<'v>(document: &'v Value, paths: &[&[&str]]) -> Option<&'v Value> {
    paths.iter().find_map(|path| walk(document, &path[..]))
}
