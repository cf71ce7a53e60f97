use pulldown_cmark::{html, Options, Parser};

use crate::report::formatters::markdown::MarkdownFormatter;
use crate::report::formatters::RenderBackend;
use crate::report::types::ReportDocument;

/// HTML formatter: the markdown rendering converted with pulldown-cmark
pub struct HtmlFormatter;

impl HtmlFormatter {
    /// Format document as standalone HTML with embedded CSS
    pub fn format(document: &ReportDocument) -> String {
        let markdown = MarkdownFormatter::format(document);
        let parser = Parser::new_ext(&markdown, Options::ENABLE_TABLES);

        let mut out = String::with_capacity(markdown.len() * 2);
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"UTF-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape(&document.metadata.title)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; max-width: 900px; margin: 40px auto; padding: 20px; line-height: 1.6; }\n");
        out.push_str("h1 { color: #2c3e50; }\n");
        out.push_str("h2 { color: #34495e; border-bottom: 2px solid #ecf0f1; padding-bottom: 5px; margin-top: 30px; }\n");
        out.push_str("table { width: 100%; border-collapse: collapse; margin: 16px 0; }\n");
        out.push_str("th { background: #34495e; color: white; text-align: left; padding: 8px; }\n");
        out.push_str("td { padding: 8px; border-bottom: 1px solid #ecf0f1; }\n");
        out.push_str("em { color: #6c757d; }\n");
        out.push_str("</style>\n</head>\n<body>\n");
        html::push_html(&mut out, parser);
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl RenderBackend for HtmlFormatter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        Ok(Self::format(document).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::*;

    #[test]
    fn test_format_html() {
        let mut section = ReportSection::new(SectionId::Conclusion);
        let mut table = TableBlock::new(["Parameter", "Gap (%)"]);
        table.push_row(vec!["pH".into(), "-11.1".into()]);
        section.push(ContentBlock::Table(table));
        let document = ReportDocument {
            metadata: ReportMetadata::new("Estate <C>"),
            sections: vec![section],
        };

        let html = HtmlFormatter::format(&document);
        assert!(html.contains("<title>Estate &lt;C&gt;</title>"));
        assert!(html.contains("<h2>1. Conclusion</h2>"));
        assert!(html.contains("<td>pH</td>"));
    }
}
