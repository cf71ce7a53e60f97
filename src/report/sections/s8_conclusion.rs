//! Section 9: Conclusion
//!
//! Upstream conclusion text, the gap tally and one corrective action per
//! critical parameter.

use crate::analysis::types::Parameter;
use crate::error::SectionError;
use crate::report::sections::s3_gap_analysis::{rank_gaps, GapBucket, GapDirection, GapRow};
use crate::report::sections::{first_text, SectionContext};
use crate::report::types::{ReportSection, SectionId};

const CONCLUSION_PATHS: &[&[&str]] = &[
    &["conclusion"],
    &["conclusions"],
    &["analysis_results", "conclusion"],
    &["analysis_results", "conclusions"],
];

/// Standard corrective measure for a deficient parameter.
pub fn corrective_action(parameter: Parameter) -> &'static str {
    use Parameter::*;
    match parameter {
        SoilPh => "apply ground magnesium limestone (GML) to raise soil pH",
        SoilNitrogen | LeafN => "increase nitrogen fertiliser (urea or ammonium sulphate) in split applications",
        SoilOrganicCarbon => "return empty fruit bunches and pruned fronds to build soil organic matter",
        SoilTotalP | SoilAvailP | LeafP => "apply rock phosphate around the palm circle",
        SoilExchK | LeafK => "apply muriate of potash (MOP) in split doses",
        SoilExchCa | LeafCa => "apply GML or gypsum to supply calcium",
        SoilExchMg | LeafMg => "apply kieserite or GML to correct magnesium",
        SoilCec => "improve cation retention with organic amendments and mulching",
        LeafB => "apply borate fertiliser to the frond axils",
        LeafCu => "apply copper sulphate, particularly on peat soils",
        LeafZn => "apply zinc sulphate as a foliar or soil treatment",
    }
}

fn action_line(row: &GapRow) -> String {
    let action = match (row.parameter, row.direction) {
        (Some(p), GapDirection::Deficit) => corrective_action(p).to_string(),
        _ => format!("review the fertiliser programme for {}", row.name),
    };
    format!(
        "- {} ({}, {:+.1}%): {}.",
        row.name,
        row.domain.key(),
        row.gap_pct,
        action
    )
}

pub fn build(ctx: &SectionContext<'_>) -> Result<ReportSection, SectionError> {
    let text = first_text(ctx.document, CONCLUSION_PATHS);
    let gaps = rank_gaps(ctx.all_classified());

    if text.is_none() && gaps.is_empty() {
        return Err(SectionError::NoData(
            "No conclusion could be drawn from this analysis.".to_string(),
        ));
    }

    let mut section = ReportSection::new(SectionId::Conclusion);
    if let Some(text) = text {
        section.narrative(text);
    }

    if !gaps.is_empty() {
        let critical: Vec<&GapRow> = gaps.iter().filter(|r| r.bucket == GapBucket::Critical).collect();
        let low = gaps.iter().filter(|r| r.bucket == GapBucket::Low).count();

        if critical.is_empty() && low == 0 {
            section.narrative("No critical or low nutrient gaps were identified.");
        } else {
            section.narrative(format!(
                "{} critical and {} low nutrient gap(s) require attention.",
                critical.len(),
                low
            ));
        }

        if !critical.is_empty() {
            let lines: Vec<String> = critical.iter().map(|r| action_line(r)).collect();
            section.narrative(format!("Priority corrective actions:\n{}", lines.join("\n")));
        }
    }

    Ok(section)
}
