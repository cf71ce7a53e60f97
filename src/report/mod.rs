//! Report assembly
//!
//! - `types`: sections, content blocks, document, request
//! - `sections`: one isolated builder per section
//! - `forecast`: yield series normalisation
//! - `layout`: column widths and chart scales
//! - `assembler`: canonical ordering and the fatal-failure check
//! - `generator`: `ReportEngine`, the end-to-end pipeline
//! - `formatters`: markdown / JSON / HTML rendering backends

pub mod types;
pub mod forecast;
pub mod layout;
pub mod assembler;
pub mod sections;
pub mod generator;
pub mod formatters;

pub use types::{
    ChartBlock, ChartKind, ChartScale, ChartSeries, ContentBlock, ReportDocument, ReportMetadata,
    ReportRequest, ReportSection, SectionId, SeriesPoint, TableBlock,
};
pub use assembler::assemble;
pub use layout::{compute_chart_scale, compute_column_widths};
pub use sections::{ReferenceCatalog, ReferenceEntry, StaticCatalog};
pub use generator::ReportEngine;
pub use formatters::{backend_for, JsonFormatter, MarkdownFormatter, RenderBackend};
