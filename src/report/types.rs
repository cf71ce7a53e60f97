//! Report content types
//!
//! Everything the section builders produce and the rendering backend consumes.
//! All types are `Serialize` so a document can be handed off as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Options;

// ============================================================================
// Sections
// ============================================================================

/// Report section identifier. Declaration order is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    ExecutiveSummary,
    SoilNutrientStatus,
    LeafNutrientStatus,
    GapAnalysis,
    NutrientRatios,
    StepAnalysis,
    EconomicForecast,
    YieldForecast,
    Conclusion,
    References,
}

impl SectionId {
    pub const CANONICAL_ORDER: [SectionId; 10] = [
        SectionId::ExecutiveSummary,
        SectionId::SoilNutrientStatus,
        SectionId::LeafNutrientStatus,
        SectionId::GapAnalysis,
        SectionId::NutrientRatios,
        SectionId::StepAnalysis,
        SectionId::EconomicForecast,
        SectionId::YieldForecast,
        SectionId::Conclusion,
        SectionId::References,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionId::ExecutiveSummary => "Executive Summary",
            SectionId::SoilNutrientStatus => "Soil Nutrient Status",
            SectionId::LeafNutrientStatus => "Leaf Nutrient Status",
            SectionId::GapAnalysis => "Nutrient Gap Analysis",
            SectionId::NutrientRatios => "Nutrient Ratio Analysis",
            SectionId::StepAnalysis => "Step-by-Step Analysis",
            SectionId::EconomicForecast => "Economic Forecast",
            SectionId::YieldForecast => "5-Year Yield Forecast",
            SectionId::Conclusion => "Conclusion",
            SectionId::References => "References",
        }
    }

    /// Zero-based position in the canonical order.
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Whether the options let this section's builder run.
    pub fn is_enabled(&self, options: &Options) -> bool {
        match self {
            SectionId::ExecutiveSummary => options.include_summary,
            SectionId::EconomicForecast | SectionId::YieldForecast => options.include_forecast,
            SectionId::References => options.include_references,
            _ => true,
        }
    }
}

/// One self-contained unit of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub id: SectionId,
    pub title: String,
    pub blocks: Vec<ContentBlock>,
    /// False when the section only carries a fallback narrative.
    pub available: bool,
}

impl ReportSection {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            blocks: Vec::new(),
            available: true,
        }
    }

    /// Unavailable section holding one short explanatory narrative.
    pub fn fallback(id: SectionId, message: impl Into<String>) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            blocks: vec![ContentBlock::Narrative(message.into())],
            available: false,
        }
    }

    pub fn push(&mut self, block: ContentBlock) {
        self.blocks.push(block);
    }

    pub fn narrative(&mut self, text: impl Into<String>) {
        self.blocks.push(ContentBlock::Narrative(text.into()));
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            ContentBlock::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartBlock> {
        self.blocks.iter().filter_map(|b| match b {
            ContentBlock::Chart(c) => Some(c),
            _ => None,
        })
    }

    pub fn narratives(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            ContentBlock::Narrative(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

// ============================================================================
// Content blocks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ContentBlock {
    Narrative(String),
    Table(TableBlock),
    Chart(ChartBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Filled in by the layout engine; one width per header.
    pub column_widths: Vec<f64>,
}

impl TableBlock {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a row, padded or truncated to the header count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() > self.headers.len() {
            tracing::debug!(
                "dropping {} table cell(s) beyond {} header(s): {:?}",
                row.len() - self.headers.len(),
                self.headers.len(),
                &row[self.headers.len()..]
            );
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
}

/// A chart value: a point, or a range with its midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoint {
    Value(f64),
    Range { low: f64, mid: f64, high: f64 },
}

impl SeriesPoint {
    pub fn range(low: f64, high: f64) -> Self {
        if low == high {
            SeriesPoint::Value(low)
        } else {
            SeriesPoint::Range {
                low,
                mid: (low + high) / 2.0,
                high,
            }
        }
    }

    /// Value for point-series rendering.
    pub fn point(&self) -> f64 {
        match self {
            SeriesPoint::Value(v) => *v,
            SeriesPoint::Range { mid, .. } => *mid,
        }
    }

    /// (low, high) for range rendering; degenerate for points.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            SeriesPoint::Value(v) => (*v, *v),
            SeriesPoint::Range { low, high, .. } => (*low, *high),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// One entry per category; `None` where the value is unresolved.
    pub points: Vec<Option<SeriesPoint>>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, points: Vec<Option<SeriesPoint>>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Y-axis window computed by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartScale {
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBlock {
    pub title: String,
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub y_label: Option<String>,
    pub scale: Option<ChartScale>,
}

impl ChartBlock {
    pub fn new(title: impl Into<String>, kind: ChartKind, categories: Vec<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            categories,
            series: Vec::new(),
            y_label: None,
            scale: None,
        }
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }
}

// ============================================================================
// Document and request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub report_types: Vec<String>,
    pub user_id: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ReportMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            report_types: Vec::new(),
            user_id: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_report_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self::new("Agronomic Analysis Report")
    }
}

/// Final ordered document handed to a rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub metadata: ReportMetadata,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn section(&self, id: SectionId) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    pub fn available_count(&self) -> usize {
        self.sections.iter().filter(|s| s.available).count()
    }
}

/// One report-generation call.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub document: Value,
    pub options: Options,
    pub metadata: ReportMetadata,
}

impl ReportRequest {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            options: Options::default(),
            metadata: ReportMetadata::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
