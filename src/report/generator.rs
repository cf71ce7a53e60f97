//! Report Engine
//!
//! Main entry point. Runs one request through
//! resolve -> classify -> build sections (isolated) -> layout -> assemble.
//!
//! The engine owns only read-only tables, so one instance can serve many
//! requests concurrently (`generate_batch`).

use std::time::Instant;

use rayon::prelude::*;
use serde_json::Value;

use crate::analysis::resolver::Resolver;
use crate::analysis::types::Domain;
use crate::config::EngineConfig;
use crate::error::ReportError;
use crate::report::assembler::assemble;
use crate::report::layout;
use crate::report::sections::{build_section, ReferenceCatalog, SectionContext};
use crate::report::types::{ReportDocument, ReportRequest, ReportSection, SectionId};
use crate::standards::classify::{classify_all, ClassifiedParameter};
use crate::standards::table::StandardsTable;

pub struct ReportEngine {
    resolver: Resolver,
    standards: StandardsTable,
    config: EngineConfig,
    catalog: Option<Box<dyn ReferenceCatalog>>,
}

impl ReportEngine {
    /// Engine with the default resolver and the built-in oil palm standards.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            resolver: Resolver::new(),
            standards: StandardsTable::oil_palm_defaults(),
            config,
            catalog: None,
        }
    }

    /// Engine whose standards come from `config.standards_path` when set.
    pub fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        let standards = match &config.standards_path {
            Some(path) => StandardsTable::load(path)?,
            None => StandardsTable::oil_palm_defaults(),
        };
        Ok(Self::new(config).with_standards(standards))
    }

    pub fn with_standards(mut self, standards: StandardsTable) -> Self {
        self.standards = standards;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_catalog(mut self, catalog: Box<dyn ReferenceCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn standards(&self) -> &StandardsTable {
        &self.standards
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolved and classified parameters of one domain.
    pub fn classify_domain(&self, document: &Value, domain: Domain) -> Vec<ClassifiedParameter> {
        classify_all(self.resolver.resolve_domain(document, domain), &self.standards)
    }

    /// Build every enabled section, in canonical order, with layout applied.
    pub fn build_sections(&self, request: &ReportRequest) -> Vec<ReportSection> {
        let soil = self.classify_domain(&request.document, Domain::Soil);
        let leaf = self.classify_domain(&request.document, Domain::Leaf);

        let ctx = SectionContext {
            document: &request.document,
            soil: &soil,
            leaf: &leaf,
            options: &request.options,
            config: &self.config,
            catalog: self.catalog.as_deref(),
        };

        let mut sections: Vec<ReportSection> = SectionId::CANONICAL_ORDER
            .into_iter()
            .filter(|id| id.is_enabled(&request.options))
            .map(|id| build_section(id, &ctx))
            .collect();

        layout::apply(&mut sections, self.config.content_width);
        sections
    }

    /// Generate one report. Fails only when no section was built at all.
    pub fn generate(&self, request: &ReportRequest) -> Result<ReportDocument, ReportError> {
        let start = Instant::now();
        tracing::info!("Generating report {:?}", request.metadata.title);

        let sections = self.build_sections(request);
        let built = sections.len();
        let available = sections.iter().filter(|s| s.available).count();

        let result = assemble(sections, request.metadata.clone());
        match &result {
            Ok(_) => tracing::info!(
                "Report assembled: {}/{} sections available in {:?}",
                available,
                built,
                start.elapsed()
            ),
            Err(e) => tracing::warn!("Report generation failed after {:?}: {}", start.elapsed(), e),
        }
        result
    }

    /// Generate independent reports in parallel.
    pub fn generate_batch(&self, requests: &[ReportRequest]) -> Vec<Result<ReportDocument, ReportError>> {
        requests.par_iter().map(|r| self.generate(r)).collect()
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use serde_json::json;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable() {
        assert_send_sync::<ReportEngine>();
    }

    #[test]
    fn test_disabled_sections_omitted() {
        let engine = ReportEngine::default();
        let request = ReportRequest::new(json!({"soil_data": {"pH": 5.0}})).with_options(Options {
            include_summary: false,
            include_charts: false,
            include_forecast: false,
            include_references: false,
        });
        let doc = engine.generate(&request).unwrap();
        assert_eq!(
            doc.section_ids(),
            vec![
                SectionId::SoilNutrientStatus,
                SectionId::LeafNutrientStatus,
                SectionId::GapAnalysis,
                SectionId::NutrientRatios,
                SectionId::StepAnalysis,
                SectionId::Conclusion,
            ]
        );
        assert!(doc.sections.iter().all(|s| s.charts().count() == 0));
    }

    #[test]
    fn test_layout_applied() {
        let engine = ReportEngine::new(EngineConfig {
            content_width: 500.0,
            ..EngineConfig::default()
        });
        let doc = engine
            .generate(&ReportRequest::new(json!({"leaf_data": {"N": 2.0, "P": 0.14}})))
            .unwrap();
        for section in &doc.sections {
            for table in section.tables() {
                let total: f64 = table.column_widths.iter().sum();
                assert!((total - 500.0).abs() < 0.01);
            }
            for chart in section.charts() {
                assert!(chart.scale.is_some());
            }
        }
    }

    #[test]
    fn test_unusable_document_degrades_every_section() {
        let engine = ReportEngine::default();
        let doc = engine
            .generate(&ReportRequest::new(json!({"notes": "lab results pending"})))
            .unwrap();
        assert_eq!(doc.section_ids(), SectionId::CANONICAL_ORDER.to_vec());
        assert_eq!(doc.available_count(), 0);
        let leaf = doc.section(SectionId::LeafNutrientStatus).unwrap();
        assert_eq!(leaf.narratives().next(), Some("No leaf data available in this analysis."));
    }
}
