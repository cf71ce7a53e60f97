//! Document Assembler
//!
//! Orders built sections canonically and wraps them with metadata. No data
//! transformation happens here.

use crate::error::ReportError;
use crate::report::types::{ReportDocument, ReportMetadata, ReportSection};

/// Order sections and wrap them into a document.
///
/// Fails only when there is nothing to render at all. A document made
/// entirely of fallback sections is still a valid, degraded report.
pub fn assemble(
    mut sections: Vec<ReportSection>,
    metadata: ReportMetadata,
) -> Result<ReportDocument, ReportError> {
    if sections.is_empty() {
        return Err(ReportError::FatalAssemblyFailure(
            "no sections were produced".to_string(),
        ));
    }

    // Stable sort keeps the first of any duplicate id ahead of later ones.
    sections.sort_by_key(|s| s.id.position());
    sections.dedup_by_key(|s| s.id);

    Ok(ReportDocument { metadata, sections })
}
