use crate::report::formatters::RenderBackend;
use crate::report::types::ReportDocument;

/// JSON formatter for report documents
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format document as pretty-printed JSON
    pub fn format(document: &ReportDocument) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(document)
    }

    /// Format document as compact JSON (no whitespace)
    pub fn format_compact(document: &ReportDocument) -> Result<String, serde_json::Error> {
        serde_json::to_string(document)
    }
}

impl RenderBackend for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::*;

    #[test]
    fn test_format_json() {
        let mut section = ReportSection::new(SectionId::GapAnalysis);
        section.narrative("1 parameter(s) evaluated");
        let document = ReportDocument {
            metadata: ReportMetadata::new("Estate B").with_user("planter-7"),
            sections: vec![section],
        };

        let json = JsonFormatter::format(&document).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["metadata"]["user_id"], "planter-7");
        assert_eq!(parsed["sections"][0]["id"], "gap_analysis");
        assert_eq!(parsed["sections"][0]["blocks"][0]["type"], "narrative");

        let compact = JsonFormatter::format_compact(&document).unwrap();
        assert!(!compact.contains('\n'));
    }
}
