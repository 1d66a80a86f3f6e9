// Render adapter - Resolves a chart type tag to its renderer
use crate::domain::chart::{ChartData, ChartError, ChartKind};
use crate::infrastructure::render::bar3d::Bar3dRenderer;
use crate::infrastructure::render::cartesian::{BarRenderer, LineRenderer};
use crate::infrastructure::render::placeholder;
use crate::infrastructure::render::radial::{DoughnutRenderer, PieRenderer, RadarRenderer};

pub const INVALID_DATA_MESSAGE: &str = "Chart data is missing or invalid.";

/// Every supported tag. Lookup ignores case; anything else is unsupported.
const CHART_TYPES: [(&str, ChartKind); 6] = [
    ("bar", ChartKind::Bar),
    ("line", ChartKind::Line),
    ("pie", ChartKind::Pie),
    ("doughnut", ChartKind::Doughnut),
    ("radar", ChartKind::Radar),
    ("bar3d", ChartKind::Bar3d),
];

/// Draws validated chart data as a standalone SVG document.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, data: &ChartData, options: &RenderOptions) -> String;
}

/// One axis title. Hidden unless a label was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTitle {
    pub display: bool,
    pub text: String,
}

impl AxisTitle {
    fn from_label(label: Option<&str>, fallback: &str) -> Self {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(text) => Self {
                display: true,
                text: text.to_string(),
            },
            None => Self {
                display: false,
                text: fallback.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTitles {
    pub x: AxisTitle,
    pub y: AxisTitle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub show_legend: bool,
    pub animation: bool,
    /// Cartesian axis titles. Always `None` for kinds without x/y axes.
    pub axes: Option<AxisTitles>,
}

impl RenderOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            title: None,
            show_legend: true,
            animation: true,
            axes: Some(AxisTitles {
                x: AxisTitle::from_label(None, "X-Axis"),
                y: AxisTitle::from_label(None, "Y-Axis"),
            }),
        }
    }

    pub fn with_axis_labels(mut self, x_label: Option<&str>, y_label: Option<&str>) -> Self {
        self.axes = Some(AxisTitles {
            x: AxisTitle::from_label(x_label, "X-Axis"),
            y: AxisTitle::from_label(y_label, "Y-Axis"),
        });
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn without_animation(mut self) -> Self {
        self.animation = false;
        self
    }

    fn for_kind(&self, kind: ChartKind) -> Self {
        let mut options = self.clone();
        if !kind.has_cartesian_axes() {
            options.axes = None;
        }
        options
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Rendered(RenderedChart),
    Unsupported { chart_type: String, placeholder: String },
    InvalidData { reason: ChartError, placeholder: String },
}

impl RenderOutcome {
    /// The chart, or the in-place message that stands in for it.
    pub fn svg(&self) -> &str {
        match self {
            RenderOutcome::Rendered(chart) => &chart.svg,
            RenderOutcome::Unsupported { placeholder, .. } => placeholder,
            RenderOutcome::InvalidData { placeholder, .. } => placeholder,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    pub fn into_rendered(self) -> Option<RenderedChart> {
        match self {
            RenderOutcome::Rendered(chart) => Some(chart),
            _ => None,
        }
    }
}

pub fn lookup(chart_type: &str) -> Option<ChartKind> {
    let tag = chart_type.trim();
    CHART_TYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, kind)| *kind)
}

pub fn unsupported_message(chart_type: &str) -> String {
    format!("Unsupported chart type: {}", chart_type)
}

fn renderer_for(kind: ChartKind) -> &'static dyn ChartRenderer {
    match kind {
        ChartKind::Bar => &BarRenderer,
        ChartKind::Line => &LineRenderer,
        ChartKind::Pie => &PieRenderer,
        ChartKind::Doughnut => &DoughnutRenderer,
        ChartKind::Radar => &RadarRenderer,
        ChartKind::Bar3d => &Bar3dRenderer,
    }
}

pub fn render(chart_type: &str, data: Option<&ChartData>, options: &RenderOptions) -> RenderOutcome {
    let invalid = |reason: ChartError| RenderOutcome::InvalidData {
        reason,
        placeholder: placeholder(options.width, options.height, INVALID_DATA_MESSAGE),
    };

    let Some(data) = data else {
        return invalid(ChartError::MissingData);
    };
    if let Err(reason) = data.validate() {
        tracing::warn!("Refusing to render chart with invalid data: {}", reason);
        return invalid(reason);
    }

    let Some(kind) = lookup(chart_type) else {
        tracing::debug!("No renderer registered for chart type {:?}", chart_type);
        return RenderOutcome::Unsupported {
            chart_type: chart_type.to_string(),
            placeholder: placeholder(options.width, options.height, &unsupported_message(chart_type)),
        };
    };

    let options = options.for_kind(kind);
    let svg = renderer_for(kind).render(data, &options);
    RenderOutcome::Rendered(RenderedChart {
        kind,
        svg,
        width: options.width,
        height: options.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::{ColorSpec, Dataset};

    fn sample() -> ChartData {
        ChartData {
            labels: vec!["Jan".into(), "Feb".into()],
            datasets: vec![Dataset::plain("Sales", vec![1.0, 2.0])],
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("Bar"), Some(ChartKind::Bar));
        assert_eq!(lookup(" DOUGHNUT "), Some(ChartKind::Doughnut));
        assert_eq!(lookup("bar3D"), Some(ChartKind::Bar3d));
        assert_eq!(lookup("scatter3d"), None);
    }

    #[test]
    fn test_unregistered_type_renders_placeholder() {
        let outcome = render("scatter3d", Some(&sample()), &RenderOptions::new(400, 300));
        match &outcome {
            RenderOutcome::Unsupported { chart_type, .. } => assert_eq!(chart_type, "scatter3d"),
            other => panic!("expected unsupported, got {:?}", other),
        }
        assert!(outcome.svg().contains("Unsupported chart type: scatter3d"));
        assert!(!outcome.is_rendered());
    }

    #[test]
    fn test_missing_data_renders_message() {
        let outcome = render("bar", None, &RenderOptions::new(400, 300));
        assert!(matches!(
            outcome,
            RenderOutcome::InvalidData {
                reason: ChartError::MissingData,
                ..
            }
        ));
        assert!(outcome.svg().contains(INVALID_DATA_MESSAGE));
        let copy = outcome.clone();
        assert_eq!(copy.svg(), outcome.svg());
    }

    #[test]
    fn test_length_mismatch_is_invalid() {
        let mut data = sample();
        data.datasets[0].data.pop();
        let outcome = render("line", Some(&data), &RenderOptions::new(400, 300));
        assert!(matches!(
            outcome,
            RenderOutcome::InvalidData {
                reason: ChartError::LengthMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_every_kind_renders() {
        for (tag, kind) in CHART_TYPES {
            let outcome = render(tag, Some(&sample()), &RenderOptions::new(400, 300));
            let chart = outcome.into_rendered().expect("rendered");
            assert_eq!(chart.kind, kind);
            assert!(chart.svg.starts_with("<svg"));
        }
    }

    #[test]
    fn test_axis_titles_follow_labels() {
        let options = RenderOptions::new(400, 300).with_axis_labels(Some("Month"), None);
        let axes = options.axes.clone().unwrap();
        assert!(axes.x.display);
        assert_eq!(axes.x.text, "Month");
        assert!(!axes.y.display);
        assert_eq!(axes.y.text, "Y-Axis");

        assert!(options.for_kind(ChartKind::Pie).axes.is_none());
        assert!(options.for_kind(ChartKind::Radar).axes.is_none());
        assert!(options.for_kind(ChartKind::Line).axes.is_some());
    }

    #[test]
    fn test_axis_title_appears_in_svg_only_when_labelled() {
        let labelled = RenderOptions::new(400, 300).with_axis_labels(Some("Month"), None);
        let svg = render("bar", Some(&sample()), &labelled).svg().to_string();
        assert!(svg.contains("Month"));
        assert!(!svg.contains("Y-Axis"));
    }

    #[test]
    fn test_radar_ignores_axis_labels() {
        let labelled = RenderOptions::new(400, 300).with_axis_labels(Some("Month"), Some("Revenue"));
        let svg = render("radar", Some(&sample()), &labelled).svg().to_string();
        assert!(!svg.contains("Month"));
        assert!(!svg.contains("Revenue"));
    }

    #[test]
    fn test_non_ascii_color_falls_back_to_palette() {
        let mut data = sample();
        data.datasets[0].background_color = Some(ColorSpec::Single("#a€bc".into()));
        data.datasets[0].border_color = Some(ColorSpec::PerCategory(vec!["#€€".into()]));
        let outcome = render("bar", Some(&data), &RenderOptions::new(400, 300));
        assert!(outcome.is_rendered());
        assert!(outcome.svg().contains("<rect"));
    }
}
