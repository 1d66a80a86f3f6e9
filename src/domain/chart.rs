// Chart domain models - persisted chart configurations and their data
use super::color::Rgba;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartError {
    #[error("dataset `{dataset}` has {data} values for {labels} labels")]
    LengthMismatch {
        dataset: String,
        labels: usize,
        data: usize,
    },

    #[error("dataset `{dataset}` has a non-finite value at index {index}")]
    NonFiniteValue { dataset: String, index: usize },

    #[error("chart data is missing labels or datasets")]
    MissingData,
}

/// Closed set of chart families the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    Bar3d,
}

impl ChartKind {
    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Radar => "radar",
            ChartKind::Bar3d => "bar3d",
        }
    }

    /// Pie and doughnut charts color each category and have no cartesian axes.
    pub fn is_proportional(self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Doughnut)
    }

    /// Only bar and line charts draw x/y axes. Radar uses a radial grid.
    pub fn has_cartesian_axes(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Line)
    }
}

/// A dataset color: one color for the whole series or one per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerCategory(Vec<String>),
}

impl ColorSpec {
    pub fn single(color: Rgba) -> Self {
        ColorSpec::Single(color.to_string())
    }

    pub fn per_category(colors: impl IntoIterator<Item = Rgba>) -> Self {
        ColorSpec::PerCategory(colors.into_iter().map(|c| c.to_string()).collect())
    }

    /// Color for category `index`, if one is given and parseable.
    pub fn color_at(&self, index: usize) -> Option<Rgba> {
        let raw = match self {
            ColorSpec::Single(color) => color.as_str(),
            ColorSpec::PerCategory(colors) => colors.get(index)?.as_str(),
        };
        raw.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub label: String,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<ColorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
}

impl Dataset {
    pub fn plain(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data,
            background_color: None,
            border_color: None,
            border_width: None,
        }
    }
}

/// Renderer-neutral chart data: category labels plus one or more series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Every dataset must carry exactly one finite value per label.
    pub fn validate(&self) -> Result<(), ChartError> {
        for dataset in &self.datasets {
            if dataset.data.len() != self.labels.len() {
                return Err(ChartError::LengthMismatch {
                    dataset: dataset.label.clone(),
                    labels: self.labels.len(),
                    data: dataset.data.len(),
                });
            }
            if let Some(index) = dataset.data.iter().position(|v| !v.is_finite()) {
                return Err(ChartError::NonFiniteValue {
                    dataset: dataset.label.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    pub fn first_dataset(&self) -> Option<&Dataset> {
        self.datasets.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub chart_type: String,
    #[serde(default, deserialize_with = "lenient_chart_data")]
    pub chart_data: Option<ChartData>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default, alias = "insights")]
    pub insight: Option<String>,
}

/// Malformed chart data becomes `None` so one bad chart cannot fail a whole list.
fn lenient_chart_data<'de, D>(deserializer: D) -> Result<Option<ChartData>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| match serde_json::from_value::<ChartData>(raw) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::warn!("Discarding malformed chart data: {}", e);
            None
        }
    }))
}

/// One column pair extracted from an upload, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    #[serde(default)]
    pub x_axis_label: Option<String>,
    #[serde(default)]
    pub y_axis_label: Option<String>,
}

impl RawSeries {
    pub fn new(labels: Vec<String>, data: Vec<f64>) -> Self {
        Self {
            labels,
            data,
            x_axis_label: None,
            y_axis_label: None,
        }
    }
}

/// Payload for persisting a freshly generated chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChartConfig {
    pub upload_id: String,
    pub chart_type: String,
    pub chart_data: ChartData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_upstream_chart_config() {
        let json = r#"{
            "_id": "c1",
            "chartType": "bar",
            "chartData": {
                "labels": ["Jan", "Feb"],
                "datasets": [{
                    "label": "Revenue",
                    "data": [1, 2],
                    "backgroundColor": ["rgba(59, 130, 246, 0.8)", "rgba(16, 185, 129, 0.8)"],
                    "borderColor": "rgba(59, 130, 246, 1)",
                    "borderWidth": 1
                }]
            },
            "insights": "Revenue doubled."
        }"#;

        let config: ChartConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.id, "c1");
        assert_eq!(config.insight.as_deref(), Some("Revenue doubled."));

        let data = config.chart_data.unwrap();
        assert!(data.validate().is_ok());
        let dataset = &data.datasets[0];
        assert!(matches!(dataset.background_color, Some(ColorSpec::PerCategory(_))));
        assert_eq!(
            dataset.border_color.as_ref().unwrap().color_at(5),
            Some(Rgba::new(59, 130, 246, 1.0))
        );
    }

    #[test]
    fn test_malformed_chart_data_is_absent() {
        let json = r#"{"_id": "c2", "chartType": "line", "chartData": {"labels": ["a"]}}"#;
        let config: ChartConfig = serde_json::from_str(json).unwrap();
        assert!(config.chart_data.is_none());
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let data = ChartData {
            labels: vec!["a".into(), "b".into()],
            datasets: vec![Dataset::plain("s", vec![1.0])],
        };
        assert_eq!(
            data.validate(),
            Err(ChartError::LengthMismatch {
                dataset: "s".into(),
                labels: 2,
                data: 1
            })
        );
    }

    #[test]
    fn test_proportional_kinds_have_no_axes() {
        assert!(!ChartKind::Pie.has_cartesian_axes());
        assert!(!ChartKind::Doughnut.has_cartesian_axes());
        assert!(!ChartKind::Radar.has_cartesian_axes());
        assert!(!ChartKind::Bar3d.has_cartesian_axes());
        assert!(ChartKind::Line.has_cartesian_axes());
    }
}
