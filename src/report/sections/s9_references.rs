//! Section 10: References
//!
//! References cited by the upstream analysis, plus entries supplied by a
//! `ReferenceCatalog` (the remote document store of reference materials).
//! Titles are de-duplicated case-insensitively, upstream entries first.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::strategies::get_normalized;
use crate::error::SectionError;
use crate::report::sections::{first_value, text_of, SectionContext};
use crate::report::types::{ContentBlock, ReportSection, SectionId, TableBlock};

const REFERENCE_PATHS: &[&[&str]] = &[
    &["references"],
    &["analysis_results", "references"],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ReferenceEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
            url: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Source of reference materials relevant to an analysis.
pub trait ReferenceCatalog: Send + Sync {
    fn references(&self, document: &Value) -> Vec<ReferenceEntry>;
}

/// A fixed list of references, returned for every analysis.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<ReferenceEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        Self { entries }
    }
}

impl ReferenceCatalog for StaticCatalog {
    fn references(&self, _document: &Value) -> Vec<ReferenceEntry> {
        self.entries.clone()
    }
}

fn field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| get_normalized(map, k))
        .find_map(text_of)
}

/// Entries from the upstream `references` list (strings or objects).
pub fn upstream_references(document: &Value) -> Vec<ReferenceEntry> {
    let Some(Value::Array(items)) = first_value(document, REFERENCE_PATHS) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(_) => text_of(item).map(ReferenceEntry::new),
            Value::Object(map) => field(map, &["title", "name", "citation"]).map(|title| ReferenceEntry {
                title,
                source: field(map, &["source", "author", "authors", "publisher"]),
                url: field(map, &["url", "link"]),
            }),
            _ => None,
        })
        .collect()
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let mut entries = upstream_references(ctx.document);
    if let Some(catalog) = ctx.catalog {
        entries.extend(catalog.references(ctx.document));
    }

    let mut seen = FxHashSet::default();
    entries.retain(|e| {
        let key = e.title.trim().to_lowercase();
        !key.is_empty() && seen.insert(key)
    });

    if entries.is_empty() {
        return Err(SectionError::NoData(
            "No references are available for this analysis.".to_string(),
        ));
    }

    let mut section = ReportSection::new(SectionId::References);
    let mut table = TableBlock::new(["#", "Title", "Source"]);
    for (i, e) in entries.iter().enumerate() {
        let source = match (&e.source, &e.url) {
            (Some(s), Some(u)) => format!("{} ({})", s, u),
            (Some(s), None) => s.clone(),
            (None, Some(u)) => u.clone(),
            (None, None) => "-".to_string(),
        };
        table.push_row(vec![(i + 1).to_string(), e.title.clone(), source]);
    }
    section.push(ContentBlock::Table(table));
    Ok(section)
}
