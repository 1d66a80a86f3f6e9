// Chart rendering - SVG renderers, rasterizer and off-screen instances
pub mod bar3d;
pub mod cartesian;
pub mod offscreen;
pub mod radial;
pub mod raster;
pub mod svg;

use crate::application::chart_builder::color_for;
use crate::application::render_adapter::RenderOptions;
use crate::domain::chart::Dataset;
use crate::domain::color::Rgba;
use svg::{Paint, SvgDocument, TextAnchor};

const ERROR_RED: Rgba = Rgba::new(239, 68, 68, 1.0);
const TITLE_FONT: f64 = 16.0;
const LEGEND_FONT: f64 = 12.0;
const LEGEND_ROW: f64 = 24.0;

/// An SVG that shows `message` in place of a chart.
pub fn placeholder(width: u32, height: u32, message: &str) -> String {
    let mut doc = SvgDocument::new(width, height);
    doc.colored_text(
        width as f64 / 2.0,
        height as f64 / 2.0,
        14.0,
        ERROR_RED,
        message,
    );
    doc.finish()
}

/// Fill for one category of a dataset, falling back to the palette.
pub(crate) fn dataset_fill(dataset: &Dataset, dataset_index: usize, category: usize) -> Rgba {
    dataset
        .background_color
        .as_ref()
        .and_then(|spec| spec.color_at(category))
        .unwrap_or_else(|| color_for(dataset_index))
}

pub(crate) fn dataset_stroke(dataset: &Dataset, dataset_index: usize, category: usize) -> Rgba {
    dataset
        .border_color
        .as_ref()
        .and_then(|spec| spec.color_at(category))
        .unwrap_or_else(|| dataset_fill(dataset, dataset_index, category).opaque())
}

pub(crate) fn dataset_paint(dataset: &Dataset, dataset_index: usize, category: usize) -> Paint {
    let border = dataset.border_width.unwrap_or(0.0);
    Paint::fill(dataset_fill(dataset, dataset_index, category)).with_stroke(
        dataset_stroke(dataset, dataset_index, category),
        border,
    )
}

/// Draws the title if any and returns the vertical space it took.
pub(crate) fn draw_title(doc: &mut SvgDocument, options: &RenderOptions) -> f64 {
    match options.title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => {
            doc.bold_text(doc.width() / 2.0, 24.0, TITLE_FONT, TextAnchor::Middle, title);
            32.0
        }
        None => 0.0,
    }
}

pub(crate) fn legend_height(options: &RenderOptions, entries: usize) -> f64 {
    if options.show_legend && entries > 0 {
        LEGEND_ROW
    } else {
        0.0
    }
}

/// A single centered row of swatches along the bottom edge.
pub(crate) fn draw_legend(doc: &mut SvgDocument, entries: &[(String, Rgba)]) {
    let entry_width = |label: &str| 14.0 + 6.0 + label.chars().count() as f64 * 6.5 + 16.0;
    let total: f64 = entries.iter().map(|(label, _)| entry_width(label)).sum();
    let mut x = ((doc.width() - total) / 2.0).max(4.0);
    let y = doc.height() - LEGEND_ROW / 2.0;

    for (label, color) in entries {
        doc.rect(x, y - 6.0, 14.0, 12.0, Paint::fill(*color).with_stroke(color.opaque(), 1.0));
        doc.text(x + 20.0, y + 4.0, LEGEND_FONT, TextAnchor::Start, label);
        x += entry_width(label);
    }
}

/// Tick and tooltip formatting: integers without decimals, others to two places.
pub(crate) fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.2}", value)
    }
}
