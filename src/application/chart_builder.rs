// Chart config builder - Normalizes a raw series into renderer-neutral chart data
use crate::domain::chart::{ChartData, ChartError, ChartKind, ColorSpec, Dataset, RawSeries};
use crate::domain::color::Rgba;

pub const PALETTE: [Rgba; 5] = [
    Rgba::new(59, 130, 246, 0.8),
    Rgba::new(16, 185, 129, 0.8),
    Rgba::new(245, 101, 101, 0.8),
    Rgba::new(251, 146, 60, 0.8),
    Rgba::new(139, 92, 246, 0.8),
];

pub const BORDER_WIDTH: f64 = 1.0;

/// Palette color for index `i`, cycling.
pub fn color_for(index: usize) -> Rgba {
    PALETTE[index % PALETTE.len()]
}

pub fn category_colors(count: usize) -> Vec<Rgba> {
    (0..count).map(color_for).collect()
}

/// Builds a single-series chart. Pie and doughnut charts color each category;
/// every other kind uses one color for the series.
pub fn build(raw: &RawSeries, kind: ChartKind, label: &str) -> Result<ChartData, ChartError> {
    let dataset_label = if label.trim().is_empty() {
        raw.y_axis_label.clone().unwrap_or_default()
    } else {
        label.to_string()
    };

    if raw.labels.len() != raw.data.len() {
        return Err(ChartError::LengthMismatch {
            dataset: dataset_label,
            labels: raw.labels.len(),
            data: raw.data.len(),
        });
    }

    let (background, border) = if kind.is_proportional() {
        let colors = category_colors(raw.data.len());
        (
            ColorSpec::per_category(colors.iter().copied()),
            ColorSpec::per_category(colors.iter().map(|c| c.opaque())),
        )
    } else {
        let color = color_for(0);
        (ColorSpec::single(color), ColorSpec::single(color.opaque()))
    };

    let data = ChartData {
        labels: raw.labels.clone(),
        datasets: vec![Dataset {
            label: dataset_label,
            data: raw.data.clone(),
            background_color: Some(background),
            border_color: Some(border),
            border_width: Some(BORDER_WIDTH),
        }],
    };
    data.validate()?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(n: usize) -> RawSeries {
        RawSeries::new(
            (0..n).map(|i| format!("C{}", i)).collect(),
            (0..n).map(|i| i as f64).collect(),
        )
    }

    #[test]
    fn test_palette_cycles() {
        for i in 0..17 {
            assert_eq!(color_for(i), color_for(i % PALETTE.len()));
        }
        assert_eq!(color_for(0).to_string(), "rgba(59, 130, 246, 0.8)");
    }

    #[test]
    fn test_pie_gets_one_color_per_category() {
        let data = build(&raw(7), ChartKind::Pie, "Share").unwrap();
        let dataset = &data.datasets[0];
        match dataset.background_color.as_ref().unwrap() {
            ColorSpec::PerCategory(colors) => assert_eq!(colors.len(), 7),
            other => panic!("expected per-category colors, got {:?}", other),
        }
        let border = dataset.border_color.as_ref().unwrap();
        assert_eq!(border.color_at(5), Some(color_for(0).opaque()));
        assert_eq!(dataset.border_width, Some(1.0));
    }

    #[test]
    fn test_bar_gets_single_series_color() {
        let data = build(&raw(3), ChartKind::Bar, "Revenue").unwrap();
        let dataset = &data.datasets[0];
        assert_eq!(dataset.label, "Revenue");
        assert_eq!(
            dataset.background_color,
            Some(ColorSpec::Single("rgba(59, 130, 246, 0.8)".to_string()))
        );
        assert_eq!(
            dataset.border_color,
            Some(ColorSpec::Single("rgba(59, 130, 246, 1)".to_string()))
        );
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut series = raw(3);
        series.data.pop();
        assert!(matches!(
            build(&series, ChartKind::Line, "x"),
            Err(ChartError::LengthMismatch { labels: 3, data: 2, .. })
        ));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut series = raw(2);
        series.data[1] = f64::NAN;
        assert!(matches!(
            build(&series, ChartKind::Bar, "x"),
            Err(ChartError::NonFiniteValue { index: 1, .. })
        ));
    }
}
