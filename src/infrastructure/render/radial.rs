// Radial renderers - pie, doughnut and radar charts
use super::svg::{fmt_num, Paint, SvgDocument, TextAnchor};
use super::{dataset_fill, dataset_paint, dataset_stroke, draw_legend, draw_title, format_value, legend_height};
use crate::application::render_adapter::{ChartRenderer, RenderOptions};
use crate::domain::chart::ChartData;
use crate::domain::color::Rgba;
use std::f64::consts::{FRAC_PI_2, TAU};

const DOUGHNUT_CUTOUT: f64 = 0.5;
const GRID_RINGS: usize = 5;
const GRID_COLOR: Rgba = Rgba::new(229, 231, 235, 1.0);
const EMPTY_COLOR: Rgba = Rgba::new(209, 213, 219, 1.0);

#[derive(Debug, Clone, Copy)]
struct Disc {
    cx: f64,
    cy: f64,
    radius: f64,
}

fn layout_disc(doc: &SvgDocument, top: f64, bottom: f64, padding: f64) -> Disc {
    let height = (doc.height() - top - bottom).max(1.0);
    Disc {
        cx: doc.width() / 2.0,
        cy: top + height / 2.0,
        radius: ((doc.width().min(height)) / 2.0 - padding).max(1.0),
    }
}

fn point_on(disc: &Disc, angle: f64, radius: f64) -> (f64, f64) {
    (disc.cx + radius * angle.cos(), disc.cy + radius * angle.sin())
}

/// Proportional slices of the first dataset, one per label.
fn render_proportional(data: &ChartData, options: &RenderOptions, cutout: f64) -> String {
    let mut doc = SvgDocument::new(options.width, options.height).animated(options.animation);
    let title_space = draw_title(&mut doc, options);
    let legend_space = legend_height(options, data.labels.len());
    let disc = layout_disc(&doc, 12.0 + title_space, 12.0 + legend_space, 8.0);

    let Some(dataset) = data.first_dataset() else {
        doc.circle(disc.cx, disc.cy, disc.radius, Paint::stroke(EMPTY_COLOR, 1.0));
        return doc.finish();
    };

    // Negative values have no meaningful share of the whole.
    let values: Vec<f64> = dataset.data.iter().map(|v| v.max(0.0)).collect();
    let total: f64 = values.iter().sum();

    if total <= 0.0 {
        doc.circle(disc.cx, disc.cy, disc.radius, Paint::stroke(EMPTY_COLOR, 1.0));
    } else {
        let mut angle = -FRAC_PI_2;
        for (i, value) in values.iter().enumerate() {
            if *value <= 0.0 {
                continue;
            }
            let sweep = value / total * TAU;
            let paint = dataset_paint(dataset, 0, i);
            if (sweep - TAU).abs() < 1e-9 {
                doc.circle(disc.cx, disc.cy, disc.radius, paint);
            } else {
                let (x0, y0) = point_on(&disc, angle, disc.radius);
                let (x1, y1) = point_on(&disc, angle + sweep, disc.radius);
                let large_arc = if sweep > std::f64::consts::PI { 1 } else { 0 };
                let d = format!(
                    "M {} {} L {} {} A {} {} 0 {} 1 {} {} Z",
                    fmt_num(disc.cx),
                    fmt_num(disc.cy),
                    fmt_num(x0),
                    fmt_num(y0),
                    fmt_num(disc.radius),
                    fmt_num(disc.radius),
                    large_arc,
                    fmt_num(x1),
                    fmt_num(y1)
                );
                doc.path(&d, paint);
            }
            angle += sweep;
        }
    }

    if cutout > 0.0 {
        doc.circle(
            disc.cx,
            disc.cy,
            disc.radius * cutout,
            Paint::fill(Rgba::new(255, 255, 255, 1.0)),
        );
    }

    if legend_space > 0.0 {
        let entries: Vec<(String, Rgba)> = data
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), dataset_fill(dataset, 0, i)))
            .collect();
        draw_legend(&mut doc, &entries);
    }

    doc.finish()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PieRenderer;

impl ChartRenderer for PieRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        render_proportional(data, options, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoughnutRenderer;

impl ChartRenderer for DoughnutRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        render_proportional(data, options, DOUGHNUT_CUTOUT)
    }
}

/// One spoke per label, one filled polygon per dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadarRenderer;

impl ChartRenderer for RadarRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        let mut doc = SvgDocument::new(options.width, options.height).animated(options.animation);
        let title_space = draw_title(&mut doc, options);
        let legend_space = legend_height(options, data.datasets.len());
        let disc = layout_disc(&doc, 12.0 + title_space, 12.0 + legend_space, 36.0);

        let spokes = data.labels.len().max(1);
        let angle_of = |i: usize| -FRAC_PI_2 + TAU * i as f64 / spokes as f64;
        let max = data
            .datasets
            .iter()
            .flat_map(|d| d.data.iter().copied())
            .fold(0.0_f64, f64::max);
        let max = if max <= 0.0 { 1.0 } else { max };

        for ring in 1..=GRID_RINGS {
            let radius = disc.radius * ring as f64 / GRID_RINGS as f64;
            let points: Vec<(f64, f64)> = (0..spokes).map(|i| point_on(&disc, angle_of(i), radius)).collect();
            doc.polygon(&points, Paint::stroke(GRID_COLOR, 1.0));
            let (_, y) = point_on(&disc, -FRAC_PI_2, radius);
            doc.text(disc.cx + 4.0, y + 4.0, 10.0, TextAnchor::Start, &format_value(max * ring as f64 / GRID_RINGS as f64));
        }

        for (i, label) in data.labels.iter().enumerate() {
            let (x, y) = point_on(&disc, angle_of(i), disc.radius);
            doc.line(disc.cx, disc.cy, x, y, GRID_COLOR, 1.0);
            let (lx, ly) = point_on(&disc, angle_of(i), disc.radius + 16.0);
            doc.text(lx, ly + 4.0, 11.0, TextAnchor::Middle, label);
        }

        for (d, dataset) in data.datasets.iter().enumerate() {
            let points: Vec<(f64, f64)> = dataset
                .data
                .iter()
                .enumerate()
                .map(|(i, v)| point_on(&disc, angle_of(i), disc.radius * v.max(0.0) / max))
                .collect();
            let fill = dataset_fill(dataset, d, 0);
            let stroke = dataset_stroke(dataset, d, 0);
            doc.polygon(
                &points,
                Paint::fill(fill.with_alpha(fill.alpha.min(0.4))).with_stroke(stroke, 2.0),
            );
        }

        if legend_space > 0.0 {
            let entries: Vec<(String, Rgba)> = data
                .datasets
                .iter()
                .enumerate()
                .map(|(i, d)| (d.label.clone(), dataset_fill(d, i, 0)))
                .collect();
            draw_legend(&mut doc, &entries);
        }

        doc.finish()
    }
}
