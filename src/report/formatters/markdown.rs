use crate::report::formatters::RenderBackend;
use crate::report::types::{ChartBlock, ContentBlock, ReportDocument, TableBlock};

/// Markdown formatter for report documents
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format the whole document as markdown
    pub fn format(document: &ReportDocument) -> String {
        let mut md = String::with_capacity(8192);
        let meta = &document.metadata;

        md.push_str(&format!("# {}\n\n", meta.title));
        if !meta.report_types.is_empty() {
            md.push_str(&format!("**Report types:** {}  \n", meta.report_types.join(", ")));
        }
        if let Some(user) = &meta.user_id {
            md.push_str(&format!("**Prepared for:** {}  \n", user));
        }
        md.push_str(&format!(
            "**Generated:** {}\n\n",
            meta.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        for (i, section) in document.sections.iter().enumerate() {
            md.push_str(&format!("## {}. {}\n\n", i + 1, section.title));
            for block in &section.blocks {
                match block {
                    ContentBlock::Narrative(text) => {
                        if section.available {
                            md.push_str(&format!("{}\n\n", text));
                        } else {
                            md.push_str(&format!("*{}*\n\n", text));
                        }
                    }
                    ContentBlock::Table(table) => Self::format_table(&mut md, table),
                    ContentBlock::Chart(chart) => Self::format_chart(&mut md, chart),
                }
            }
        }

        md
    }

    fn format_table(md: &mut String, table: &TableBlock) {
        if let Some(title) = &table.title {
            md.push_str(&format!("**{}**\n\n", title));
        }
        md.push_str(&format!("| {} |\n", escape_row(&table.headers)));
        md.push_str(&format!("|{}\n", "---|".repeat(table.headers.len())));
        for row in &table.rows {
            md.push_str(&format!("| {} |\n", escape_row(row)));
        }
        md.push('\n');
    }

    /// Charts are rasterised downstream; markdown carries the data.
    fn format_chart(md: &mut String, chart: &ChartBlock) {
        md.push_str(&format!("**Chart: {}**", chart.title));
        if let Some(scale) = &chart.scale {
            let unit = chart.y_label.as_deref().unwrap_or("");
            md.push_str(&format!(" (y-axis {:.2} to {:.2} {})", scale.y_min, scale.y_max, unit));
        }
        md.push_str("\n\n");

        let mut headers = vec!["Category".to_string()];
        headers.extend(chart.series.iter().map(|s| s.name.clone()));
        md.push_str(&format!("| {} |\n", escape_row(&headers)));
        md.push_str(&format!("|{}\n", "---|".repeat(headers.len())));

        for (i, category) in chart.categories.iter().enumerate() {
            let mut row = vec![category.clone()];
            for series in &chart.series {
                let cell = match series.points.get(i).copied().flatten() {
                    Some(p) => {
                        let (low, high) = p.bounds();
                        if low == high {
                            format!("{:.2}", p.point())
                        } else {
                            format!("{:.2} ({:.2}-{:.2})", p.point(), low, high)
                        }
                    }
                    None => "-".to_string(),
                };
                row.push(cell);
            }
            md.push_str(&format!("| {} |\n", escape_row(&row)));
        }
        md.push('\n');
    }
}

fn escape_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace('\n', " "))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl RenderBackend for MarkdownFormatter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        Ok(Self::format(document).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::*;

    fn sample() -> ReportDocument {
        let mut status = ReportSection::new(SectionId::SoilNutrientStatus);
        let mut table = TableBlock::new(["Parameter", "Observed"]).with_title("Soil");
        table.push_row(vec!["pH".into(), "4.00".into()]);
        status.push(ContentBlock::Table(table));
        status.push(ContentBlock::Chart(
            ChartBlock::new("Yield", ChartKind::Line, vec!["Year 0".into(), "Year 1".into()]).with_series(
                ChartSeries::new("High", vec![Some(SeriesPoint::Value(22.0)), Some(SeriesPoint::range(25.5, 27.0))]),
            ),
        ));

        ReportDocument {
            metadata: ReportMetadata::new("Estate A").with_report_types(["soil", "leaf"]),
            sections: vec![
                status,
                ReportSection::fallback(SectionId::LeafNutrientStatus, "No leaf data available in this analysis."),
            ],
        }
    }

    #[test]
    fn test_format_markdown() {
        let md = MarkdownFormatter::format(&sample());
        assert!(md.starts_with("# Estate A\n"));
        assert!(md.contains("**Report types:** soil, leaf"));
        assert!(md.contains("## 1. Soil Nutrient Status"));
        assert!(md.contains("| pH | 4.00 |"));
        assert!(md.contains("| Year 1 | 26.25 (25.50-27.00) |"));
        assert!(md.contains("## 2. Leaf Nutrient Status\n\n*No leaf data available in this analysis.*"));
    }

    #[test]
    fn test_pipes_escaped() {
        assert_eq!(escape_row(&["a|b".to_string(), "c".to_string()]), "a\\|b | c");
    }
}
