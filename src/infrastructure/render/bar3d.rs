// 3D bar renderer - proportional bar layout under an oblique projection
use super::svg::{Paint, SvgDocument, TextAnchor};
use crate::application::render_adapter::{ChartRenderer, RenderOptions};
use crate::domain::chart::ChartData;
use crate::domain::color::Rgba;
use serde::Serialize;

pub const MAX_BAR_HEIGHT: f64 = 7.0;
pub const BAR_SPACING: f64 = 2.0;
pub const BAR_SIZE: f64 = 1.0;
pub const DEFAULT_TITLE: &str = "3D Chart";

/// Screen offset of one unit of depth, as a fraction of one unit of width.
const DEPTH_SKEW: f64 = 0.35;
const FLOOR_COLOR: Rgba = Rgba::new(243, 244, 246, 1.0);
const EDGE_COLOR: Rgba = Rgba::new(31, 41, 55, 0.35);

/// One bar in scene units. `y` is the bar's vertical center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar3d {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    #[serde(serialize_with = "serialize_color")]
    pub color: Rgba,
}

fn serialize_color<S: serde::Serializer>(color: &Rgba, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(color)
}

/// Heights scale to the series maximum. A series whose maximum is not
/// positive gets unit heights. Bars are centered on the origin along x and
/// stand on the floor plane.
pub fn layout(values: &[f64]) -> Vec<Bar3d> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n = values.len() as f64;

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let height = if max <= 0.0 {
                1.0
            } else {
                value / max * MAX_BAR_HEIGHT
            };
            Bar3d {
                index: i,
                x: (i as f64 - n / 2.0) * BAR_SPACING,
                y: height / 2.0,
                height,
                color: Rgba::from_hsl(i as f64 * 60.0, 0.7, 0.5),
            }
        })
        .collect()
}

/// Maps scene coordinates (x right, y up, z away from the viewer) to pixels.
#[derive(Debug, Clone, Copy)]
struct Projection {
    origin_x: f64,
    floor_y: f64,
    scale: f64,
}

impl Projection {
    fn fit(bars: &[Bar3d], width: f64, height: f64, bottom_reserved: f64) -> Self {
        let half = BAR_SIZE / 2.0;
        let min_x = bars.iter().map(|b| b.x - half).fold(-half, f64::min) - 1.0;
        let max_x = bars.iter().map(|b| b.x + half).fold(half, f64::max) + 1.0 + DEPTH_SKEW * BAR_SIZE;
        let min_y = bars.iter().map(|b| b.height.min(0.0)).fold(0.0, f64::min);
        let max_y = bars.iter().map(|b| b.height.max(0.0)).fold(1.0, f64::max) + DEPTH_SKEW * BAR_SIZE;

        let usable_w = (width - 40.0).max(1.0);
        let usable_h = (height - bottom_reserved - 40.0).max(1.0);
        let scale = (usable_w / (max_x - min_x)).min(usable_h / (max_y - min_y));

        let scene_mid = (min_x + max_x) / 2.0;
        Self {
            origin_x: width / 2.0 - scene_mid * scale,
            floor_y: 20.0 + max_y * scale,
            scale,
        }
    }

    fn project(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        (
            self.origin_x + (x + z * DEPTH_SKEW) * self.scale,
            self.floor_y - (y + z * DEPTH_SKEW) * self.scale,
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bar3dRenderer;

impl ChartRenderer for Bar3dRenderer {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String {
        let values = data
            .first_dataset()
            .map(|d| d.data.as_slice())
            .unwrap_or_default();
        render_scene(&layout(values), &data.labels, options)
    }
}

/// Draws an already laid out scene.
pub fn render_scene(bars: &[Bar3d], labels: &[String], options: &RenderOptions) -> String {
    let mut doc = SvgDocument::new(options.width, options.height).animated(options.animation);
    let projection = Projection::fit(bars, doc.width(), doc.height(), 56.0);
    let half = BAR_SIZE / 2.0;

    let floor_min = bars.iter().map(|b| b.x - half).fold(-half, f64::min) - 1.0;
    let floor_max = bars.iter().map(|b| b.x + half).fold(half, f64::max) + 1.0;
    let floor = [
        projection.project(floor_min, 0.0, 0.0),
        projection.project(floor_max, 0.0, 0.0),
        projection.project(floor_max, 0.0, BAR_SIZE),
        projection.project(floor_min, 0.0, BAR_SIZE),
    ];
    doc.polygon(&floor, Paint::fill(FLOOR_COLOR).with_stroke(EDGE_COLOR, 0.5));

    // Left to right so each bar covers the right face of its neighbour.
    for bar in bars {
        let (x0, x1) = (bar.x - half, bar.x + half);
        let (y0, y1) = (bar.y - bar.height / 2.0, bar.y + bar.height / 2.0);
        let edge = |paint: Paint| paint.with_stroke(EDGE_COLOR, 0.5);

        let front = [
            projection.project(x0, y0, 0.0),
            projection.project(x1, y0, 0.0),
            projection.project(x1, y1, 0.0),
            projection.project(x0, y1, 0.0),
        ];
        let top = [
            projection.project(x0, y1, 0.0),
            projection.project(x1, y1, 0.0),
            projection.project(x1, y1, BAR_SIZE),
            projection.project(x0, y1, BAR_SIZE),
        ];
        let side = [
            projection.project(x1, y0, 0.0),
            projection.project(x1, y0, BAR_SIZE),
            projection.project(x1, y1, BAR_SIZE),
            projection.project(x1, y1, 0.0),
        ];
        doc.polygon(&side, edge(Paint::fill(bar.color.shade(0.75))));
        doc.polygon(&front, edge(Paint::fill(bar.color)));
        doc.polygon(&top, edge(Paint::fill(bar.color.shade(1.2))));

        if let Some(label) = labels.get(bar.index) {
            let (lx, ly) = projection.project(bar.x, 0.0, 0.0);
            doc.text(lx, ly + 16.0, 11.0, TextAnchor::Middle, label);
        }
    }

    let title = options
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    doc.bold_text(doc.width() / 2.0, doc.height() - 16.0, 16.0, TextAnchor::Middle, title);

    doc.finish()
}
