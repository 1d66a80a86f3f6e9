// Cartesian renderers - bar and line charts over a shared value axis
use super::svg::{Paint, SvgDocument, TextAnchor};
use super::{dataset_fill, dataset_paint, dataset_stroke, draw_legend, draw_title, format_value, legend_height};
use crate::application::render_adapter::{ChartRenderer, RenderOptions};
use crate::domain::chart::ChartData;
use crate::domain::color::Rgba;

const GRID_LINES: usize = 5;
const GRID_COLOR: Rgba = Rgba::new(229, 231, 235, 1.0);
const AXIS_COLOR: Rgba = Rgba::new(156, 163, 175, 1.0);
const TICK_FONT: f64 = 11.0;
const AXIS_TITLE_FONT: f64 = 12.0;

/// Maps data values onto the vertical pixel range of the plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f64,
    pub max: f64,
}

impl ValueScale {
    /// Spans every value and always includes zero.
    pub fn from_data(data: &ChartData) -> Self {
        let values = data.datasets.iter().flat_map(|d| d.data.iter().copied());
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if (max - min).abs() < f64::EPSILON {
            Self { min, max: min + 1.0 }
        } else {
            Self { min, max }
        }
    }

    pub fn ticks(&self) -> Vec<f64> {
        let step = (self.max - self.min) / GRID_LINES as f64;
        (0..=GRID_LINES).map(|i| self.min + step * i as f64).collect()
    }

    fn project(&self, value: f64, plot: &PlotArea) -> f64 {
        let ratio = (value - self.min) / (self.max - self.min);
        plot.bottom() - ratio * plot.height
    }
}

/// Pixel rectangle the data is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn band(&self, categories: usize) -> f64 {
        self.width / categories.max(1) as f64
    }
}

/// Draws title, gridlines, ticks, category labels, axis titles and legend,
/// then returns the plot area for the data marks.
fn draw_frame(doc: &mut SvgDocument, data: &ChartData, options: &RenderOptions, scale: &ValueScale) -> PlotArea {
    let title_space = draw_title(doc, options);
    let (x_title, y_title) = match &options.axes {
        Some(axes) => (
            axes.x.display.then_some(axes.x.text.as_str()),
            axes.y.display.then_some(axes.y.text.as_str()),
        ),
        None => (None, None),
    };
    let legend_space = legend_height(options, data.datasets.len());

    let left = 56.0 + if y_title.is_some() { 22.0 } else { 0.0 };
    let top = 16.0 + title_space;
    let bottom_space = 28.0 + if x_title.is_some() { 22.0 } else { 0.0 } + legend_space;
    let plot = PlotArea {
        left,
        top,
        width: (doc.width() - left - 20.0).max(1.0),
        height: (doc.height() - top - bottom_space).max(1.0),
    };

    for tick in scale.ticks() {
        let y = scale.project(tick, &plot);
        doc.line(plot.left, y, plot.right(), y, GRID_COLOR, 1.0);
        doc.text(plot.left - 8.0, y + 4.0, TICK_FONT, TextAnchor::End, &format_value(tick));
    }
    doc.line(plot.left, plot.top, plot.left, plot.bottom(), AXIS_COLOR, 1.0);
    let zero = scale.project(0.0, &plot);
    doc.line(plot.left, zero, plot.right(), zero, AXIS_COLOR, 1.0);

    let band = plot.band(data.labels.len());
    for (i, label) in data.labels.iter().enumerate() {
        let x = plot.left + band * (i as f64 + 0.5);
        doc.text(x, plot.bottom() + 18.0, TICK_FONT, TextAnchor::Middle, label);
    }

    if let Some(text) = x_title {
        doc.text(
            plot.left + plot.width / 2.0,
            plot.bottom() + 42.0,
            AXIS_TITLE_FONT,
            TextAnchor::Middle,
            text,
        );
    }
    if let Some(text) = y_title {
        let x = 18.0;
        let y = plot.top + plot.height / 2.0;
        doc.rotated_text(x, y, AXIS_TITLE_FONT, -90.0, text);
    }

    if legend_space > 0.0 {
        let entries: Vec<(String, Rgba)> = data
            .datasets
            .iter()
            .enumerate()
            .map(|(i, d)| (d.label.clone(), dataset_fill(d, i, 0)))
            .collect();
        draw_legend(doc, &entries);
    }

    plot
}

/// Grouped vertical bars, one group per label.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarRenderer;

impl ChartRenderer for BarRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        let mut doc = SvgDocument::new(options.width, options.height).animated(options.animation);
        let scale = ValueScale::from_data(data);
        let plot = draw_frame(&mut doc, data, options, &scale);

        let band = plot.band(data.labels.len());
        let series = data.datasets.len().max(1) as f64;
        let bar_width = band * 0.8 / series;
        let zero = scale.project(0.0, &plot);

        for (d, dataset) in data.datasets.iter().enumerate() {
            for (i, value) in dataset.data.iter().enumerate() {
                let x = plot.left + band * i as f64 + band * 0.1 + bar_width * d as f64;
                let y = scale.project(*value, &plot);
                doc.data_rect(
                    x,
                    y.min(zero),
                    bar_width,
                    (y - zero).abs(),
                    dataset_paint(dataset, d, i),
                );
            }
        }

        doc.finish()
    }
}

/// One polyline per dataset with a marker at every point.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineRenderer;

impl ChartRenderer for LineRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        let mut doc = SvgDocument::new(options.width, options.height).animated(options.animation);
        let scale = ValueScale::from_data(data);
        let plot = draw_frame(&mut doc, data, options, &scale);
        let band = plot.band(data.labels.len());

        for (d, dataset) in data.datasets.iter().enumerate() {
            let points: Vec<(f64, f64)> = dataset
                .data
                .iter()
                .enumerate()
                .map(|(i, v)| (plot.left + band * (i as f64 + 0.5), scale.project(*v, &plot)))
                .collect();
            let stroke = dataset_stroke(dataset, d, 0);
            let width = dataset.border_width.unwrap_or(1.0).max(2.0);
            doc.polyline(&points, Paint::stroke(stroke, width));
            for (i, (x, y)) in points.iter().enumerate() {
                doc.circle(*x, *y, 3.0, Paint::fill(dataset_fill(dataset, d, i)).with_stroke(stroke, 1.0));
            }
        }

        doc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::Dataset;

    fn data(values: Vec<f64>) -> ChartData {
        ChartData {
            labels: (0..values.len()).map(|i| format!("L{}", i)).collect(),
            datasets: vec![Dataset::plain("Series", values)],
        }
    }

    #[test]
    fn test_scale_includes_zero() {
        let scale = ValueScale::from_data(&data(vec![5.0, 10.0]));
        assert_eq!(scale, ValueScale { min: 0.0, max: 10.0 });

        let scale = ValueScale::from_data(&data(vec![-4.0, -2.0]));
        assert_eq!(scale, ValueScale { min: -4.0, max: 0.0 });
    }

    #[test]
    fn test_flat_scale_is_not_degenerate() {
        let scale = ValueScale::from_data(&data(vec![0.0, 0.0]));
        assert_eq!(scale.max - scale.min, 1.0);
        assert_eq!(scale.ticks().len(), GRID_LINES + 1);
    }

    #[test]
    fn test_bar_chart_draws_one_rect_per_value() {
        let options = RenderOptions::new(400, 300).without_animation();
        let svg = BarRenderer.render(&data(vec![1.0, 2.0, 3.0]), &options);
        // background, 3 bars, 1 legend swatch
        assert_eq!(svg.matches("<rect").count(), 5);
        assert!(svg.contains("L2"));
    }

    #[test]
    fn test_line_chart_draws_markers() {
        let options = RenderOptions::new(400, 300);
        let svg = LineRenderer.render(&data(vec![1.0, 2.0]), &options);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("<polyline"));
    }
}
