//! Section 1: Executive Summary
//!
//! Upstream summary text plus a per-domain count of parameter statuses.

use serde::Serialize;

use crate::analysis::types::Domain;
use crate::error::SectionError;
use crate::report::sections::{first_text, SectionContext};
use crate::report::types::{ContentBlock, ReportSection, SectionId, TableBlock};
use crate::standards::classify::{ClassifiedParameter, Status};

const SUMMARY_PATHS: &[&[&str]] = &[
    &["executive_summary"],
    &["summary"],
    &["analysis_results", "executive_summary"],
    &["analysis_results", "summary"],
];

/// Status counts over one set of classified parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub resolved: usize,
    pub deficient: usize,
    pub optimal: usize,
    pub excessive: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn tally(classified: &[ClassifiedParameter]) -> Self {
        let mut counts = Self::default();
        for c in classified {
            counts.total += 1;
            if c.observation.is_resolved() {
                counts.resolved += 1;
            }
            match c.status {
                Status::Deficient => counts.deficient += 1,
                Status::Optimal => counts.optimal += 1,
                Status::Excessive => counts.excessive += 1,
                Status::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn out_of_range(&self) -> usize {
        self.deficient + self.excessive
    }
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let text = first_text(ctx.document, SUMMARY_PATHS);
    let counts: Vec<(Domain, StatusCounts)> = Domain::ALL
        .iter()
        .map(|d| (*d, StatusCounts::tally(ctx.classified(*d))))
        .collect();
    let resolved: usize = counts.iter().map(|(_, c)| c.resolved).sum();

    if text.is_none() && resolved == 0 {
        return Err(SectionError::NoData(
            "No summary is available for this analysis.".to_string(),
        ));
    }

    let mut section = ReportSection::new(SectionId::ExecutiveSummary);
    if let Some(text) = text {
        section.narrative(text);
    }

    if resolved > 0 {
        let out_of_range: usize = counts.iter().map(|(_, c)| c.out_of_range()).sum();
        section.narrative(format!(
            "{} of {} measured parameters fall outside their reference range.",
            out_of_range, resolved
        ));

        let mut table = TableBlock::new([
            "Domain", "Parameters", "Measured", "Deficient", "Optimal", "Excessive", "Unknown",
        ])
        .with_title("Parameter status overview");
        for (domain, c) in &counts {
            table.push_row(vec![
                domain.title().to_string(),
                c.total.to_string(),
                c.resolved.to_string(),
                c.deficient.to_string(),
                c.optimal.to_string(),
                c.excessive.to_string(),
                c.unknown.to_string(),
            ]);
        }
        section.push(ContentBlock::Table(table));
    }

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Options};
    use crate::report::sections::test_support::{classify_doc, context};
    use serde_json::json;

    #[test]
    fn test_summary_with_counts() {
        let doc = json!({
            "executive_summary": "Soil is acidic.",
            "soil_data": {"pH": 4.0, "CEC": 10},
            "leaf_data": {"N": 2.6}
        });
        let (soil, leaf) = classify_doc(&doc);
        let (options, config) = (Options::default(), EngineConfig::default());
        let section = build(&context(&doc, &soil, &leaf, &options, &config)).unwrap();

        let narratives: Vec<&str> = section.narratives().collect();
        assert_eq!(narratives[0], "Soil is acidic.");
        assert!(narratives[1].starts_with("1 of 3"));

        let table = section.tables().next().unwrap();
        assert_eq!(table.rows[0][2], "2");
        assert_eq!(table.rows[0][3], "1");
        assert_eq!(table.rows[1][4], "1");
    }

    #[test]
    fn test_no_text_no_data() {
        let doc = json!({});
        let (soil, leaf) = classify_doc(&doc);
        let (options, config) = (Options::default(), EngineConfig::default());
        assert!(matches!(
            build(&context(&doc, &soil, &leaf, &options, &config)),
            Err(SectionError::NoData(_))
        ));
    }
}
