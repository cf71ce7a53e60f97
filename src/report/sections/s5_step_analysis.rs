//! Section 6: Step-by-Step Analysis
//!
//! Upstream analysis steps, each with a title, summary, detailed analysis,
//! key findings and optional tables of `{title, headers, rows}`.

use serde_json::{Map, Value};

use crate::analysis::strategies::get_normalized;
use crate::error::SectionError;
use crate::report::forecast::json_kind;
use crate::report::sections::{cell_text, first_value, text_of, SectionContext};
use crate::report::types::{ContentBlock, ReportSection, SectionId, TableBlock};

const STEP_PATHS: &[&[&str]] = &[
    &["step_by_step_analysis"],
    &["analysis_results", "step_by_step_analysis"],
];

const TITLE_KEYS: &[&str] = &["title", "step_title", "name"];
const SUMMARY_KEYS: &[&str] = &["summary", "step_summary"];
const DETAIL_KEYS: &[&str] = &["detailed_analysis", "analysis", "details"];
const FINDINGS_KEYS: &[&str] = &["key_findings", "findings"];

fn text_at(step: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| get_normalized(step, k))
        .find_map(text_of)
}

/// Key findings as bullet lines; a list of strings, or of `{finding}` objects.
fn findings(step: &Map<String, Value>) -> Vec<String> {
    let Some(raw) = FINDINGS_KEYS.iter().find_map(|k| get_normalized(step, k)) else {
        return Vec::new();
    };
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => text_at(map, &["finding", "text", "description"]),
                other => text_of(other),
            })
            .collect(),
        other => text_of(other).into_iter().collect(),
    }
}

/// A step table; `None` when headers are missing.
fn step_table(raw: &Value) -> Option<TableBlock> {
    let map = raw.as_object()?;
    let headers: Vec<String> = get_normalized(map, "headers")?
        .as_array()?
        .iter()
        .map(cell_text)
        .collect();
    if headers.is_empty() {
        return None;
    }

    let mut table = TableBlock::new(headers);
    if let Some(title) = get_normalized(map, "title").and_then(text_of) {
        table = table.with_title(title);
    }
    if let Some(Value::Array(rows)) = get_normalized(map, "rows") {
        for row in rows {
            match row {
                Value::Array(cells) => table.push_row(cells.iter().map(cell_text).collect()),
                Value::Object(cells) => {
                    let ordered = table
                        .headers
                        .iter()
                        .map(|h| get_normalized(cells, h).map(cell_text).unwrap_or_default())
                        .collect();
                    table.push_row(ordered);
                }
                other => tracing::debug!("skipping step table row of type {}", json_kind(other)),
            }
        }
    }
    Some(table)
}

fn push_step(section: &mut ReportSection, index: usize, step: &Map<String, Value>) -> bool {
    let title = text_at(step, TITLE_KEYS);
    let summary = text_at(step, SUMMARY_KEYS);
    let detail = text_at(step, DETAIL_KEYS);
    let findings = findings(step);
    let tables: Vec<TableBlock> = get_normalized(step, "tables")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(step_table).collect())
        .unwrap_or_default();

    if summary.is_none() && detail.is_none() && findings.is_empty() && tables.is_empty() {
        return false;
    }

    let number = step
        .get("step_number")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(index + 1);
    section.narrative(format!(
        "Step {}: {}",
        number,
        title.unwrap_or_else(|| "Analysis".to_string())
    ));
    if let Some(summary) = summary {
        section.narrative(summary);
    }
    if let Some(detail) = detail {
        section.narrative(detail);
    }
    if !findings.is_empty() {
        let bullets: Vec<String> = findings.iter().map(|f| format!("- {}", f)).collect();
        section.narrative(format!("Key findings:\n{}", bullets.join("\n")));
    }
    for table in tables {
        section.push(ContentBlock::Table(table));
    }
    true
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let steps = match first_value(ctx.document, STEP_PATHS) {
        None | Some(Value::Null) => {
            return Err(SectionError::NoData(
                "No step-by-step analysis is available for this analysis.".to_string(),
            ))
        }
        Some(Value::Array(steps)) => steps,
        Some(other) => {
            return Err(SectionError::MalformedInput(format!(
                "step_by_step_analysis is {}, expected a list",
                json_kind(other)
            )))
        }
    };

    let mut section = ReportSection::new(SectionId::StepAnalysis);
    let mut rendered = 0;
    for (i, step) in steps.iter().enumerate() {
        match step {
            Value::Object(map) => {
                if push_step(&mut section, i, map) {
                    rendered += 1;
                }
            }
            other => tracing::debug!("skipping step {} of type {}", i + 1, json_kind(other)),
        }
    }

    if rendered == 0 {
        return Err(SectionError::NoData(
            "The step-by-step analysis contains no usable steps.".to_string(),
        ));
    }
    Ok(section)
}
