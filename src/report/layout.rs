//! Layout Engine
//!
//! Table column widths and chart y-axis windows. Widths are in points; the
//! predefined splits were drawn for an A4 page with 2 cm margins and are
//! rescaled to whatever content width the caller supplies.

use crate::report::types::{ChartScale, ChartSeries, ContentBlock, ReportSection};

/// Content width the predefined splits were designed for.
pub const REFERENCE_WIDTH: f64 = 481.89;

/// Fraction of the data span added above and below.
pub const CHART_PADDING: f64 = 0.10;

/// Smallest visible span as a fraction of the window centre.
pub const MIN_SPAN_FRACTION: f64 = 0.20;

/// Absolute floor for the visible span.
pub const MIN_SPAN_ABSOLUTE: f64 = 1.0;

// Label column first; 7 columns is the parameter/gap table layout.
static COLUMN_SPLITS: [&[f64]; 7] = [
    &[481.89],
    &[240.0, 241.89],
    &[180.0, 150.0, 151.89],
    &[150.0, 110.0, 110.0, 111.89],
    &[130.0, 90.0, 90.0, 85.0, 86.89],
    &[120.0, 75.0, 70.0, 70.0, 70.0, 76.89],
    &[110.0, 65.0, 55.0, 60.0, 60.0, 60.0, 71.89],
];

/// Column widths summing to `content_width`.
///
/// 1-7 columns use the predefined splits, more are split evenly. The last
/// column absorbs floating-point rounding.
pub fn compute_column_widths(column_count: usize, content_width: f64) -> Vec<f64> {
    if column_count == 0 {
        return Vec::new();
    }
    if !content_width.is_finite() || content_width <= 0.0 {
        return vec![0.0; column_count];
    }

    let base: Vec<f64> = match column_count {
        1..=7 => COLUMN_SPLITS[column_count - 1].to_vec(),
        n => vec![REFERENCE_WIDTH / n as f64; n],
    };

    let total: f64 = base.iter().sum();
    let scale = content_width / total;
    let mut widths: Vec<f64> = base.iter().map(|w| w * scale).collect();

    let head: f64 = widths[..column_count - 1].iter().sum();
    widths[column_count - 1] = content_width - head;
    widths
}

/// Y-axis window for one or more series, ranges included.
pub fn compute_chart_scale(series: &[ChartSeries]) -> ChartScale {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;

    for point in series.iter().flat_map(|s| s.points.iter().flatten()) {
        let (low, high) = point.bounds();
        for v in [low, high, point.point()] {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }

    if lo > hi {
        return ChartScale { y_min: 0.0, y_max: 1.0 };
    }

    let pad = (hi - lo) * CHART_PADDING;
    let mut y_min = lo - pad;
    let mut y_max = hi + pad;

    let centre = (lo + hi) / 2.0;
    let min_span = (centre.abs() * MIN_SPAN_FRACTION).max(MIN_SPAN_ABSOLUTE);
    if y_max - y_min < min_span {
        y_min = centre - min_span / 2.0;
        y_max = centre + min_span / 2.0;
    }

    // Non-negative data never gets a negative axis.
    if lo >= 0.0 && y_min < 0.0 {
        y_max -= y_min;
        y_min = 0.0;
    }

    ChartScale { y_min, y_max }
}

/// Fill column widths and chart scales on every block.
pub fn apply(sections: &mut [ReportSection], content_width: f64) {
    for section in sections.iter_mut() {
        for block in section.blocks.iter_mut() {
            match block {
                ContentBlock::Table(table) => {
                    table.column_widths = compute_column_widths(table.column_count(), content_width);
                }
                ContentBlock::Chart(chart) => {
                    chart.scale = Some(compute_chart_scale(&chart.series));
                }
                ContentBlock::Narrative(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{SeriesPoint, SectionId, TableBlock};
    use approx::assert_abs_diff_eq;

    fn series(values: &[f64]) -> ChartSeries {
        ChartSeries::new("s", values.iter().map(|v| Some(SeriesPoint::Value(*v))).collect())
    }

    #[test]
    fn test_widths_sum_to_content_width() {
        for width in [481.89, 300.0, 720.5] {
            for n in 1..=10 {
                let widths = compute_column_widths(n, width);
                assert_eq!(widths.len(), n);
                assert_abs_diff_eq!(widths.iter().sum::<f64>(), width, epsilon = 0.01);
                assert!(widths.iter().all(|w| *w > 0.0));
            }
        }
    }

    #[test]
    fn test_predefined_splits_match_reference_width() {
        for split in COLUMN_SPLITS {
            assert_abs_diff_eq!(split.iter().sum::<f64>(), REFERENCE_WIDTH, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_label_column_is_widest_for_parameter_tables() {
        let widths = compute_column_widths(7, REFERENCE_WIDTH);
        assert!(widths[1..].iter().all(|w| *w < widths[0]));
    }

    #[test]
    fn test_many_columns_split_evenly() {
        let widths = compute_column_widths(9, 450.0);
        for w in &widths {
            assert_abs_diff_eq!(*w, 50.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_columns_and_bad_width() {
        assert!(compute_column_widths(0, 481.89).is_empty());
        assert_eq!(compute_column_widths(3, -1.0), vec![0.0; 3]);
    }

    #[test]
    fn test_chart_scale_pads_span() {
        let scale = compute_chart_scale(&[series(&[10.0, 20.0])]);
        assert_abs_diff_eq!(scale.y_min, 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(scale.y_max, 21.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_series_widened_to_minimum_span() {
        let scale = compute_chart_scale(&[series(&[50.0, 50.0, 50.0])]);
        assert_abs_diff_eq!(scale.y_max - scale.y_min, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!((scale.y_max + scale.y_min) / 2.0, 50.0, epsilon = 1e-9);

        let small = compute_chart_scale(&[series(&[0.2])]);
        assert_abs_diff_eq!(small.y_min, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(small.y_max, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ranges_and_gaps_included() {
        let s = ChartSeries::new(
            "yield",
            vec![Some(SeriesPoint::range(25.5, 27.0)), None, Some(SeriesPoint::Value(30.0))],
        );
        let scale = compute_chart_scale(&[s]);
        assert!(scale.y_min <= 25.5 && scale.y_max >= 30.0);
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(compute_chart_scale(&[]), ChartScale { y_min: 0.0, y_max: 1.0 });
        assert_eq!(
            compute_chart_scale(&[ChartSeries::new("x", vec![None])]),
            ChartScale { y_min: 0.0, y_max: 1.0 }
        );
    }

    #[test]
    fn test_negative_data_keeps_negative_axis() {
        let scale = compute_chart_scale(&[series(&[-12.0, -2.0])]);
        assert!(scale.y_min < -12.0);
    }

    #[test]
    fn test_apply_fills_tables() {
        let mut section = ReportSection::new(SectionId::GapAnalysis);
        section.push(ContentBlock::Table(TableBlock::new(["a", "b", "c", "d"])));
        let mut sections = vec![section];
        apply(&mut sections, 400.0);
        let table = sections[0].tables().next().unwrap();
        assert_abs_diff_eq!(table.column_widths.iter().sum::<f64>(), 400.0, epsilon = 0.01);
    }
}
