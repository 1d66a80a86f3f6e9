// Insight domain models - per-chart generated summaries
use super::chart::ChartConfig;
use serde::Serialize;

pub const EMPTY_INSIGHT_TEXT: &str = "No insight generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightEntry {
    pub status: InsightStatus,
    pub text: Option<String>,
}

impl InsightEntry {
    pub fn ready(text: impl Into<String>) -> Self {
        Self {
            status: InsightStatus::Ready,
            text: Some(text.into()),
        }
    }

    /// The generate control stays visible until an insight is ready.
    pub fn shows_generate_control(&self) -> bool {
        self.status != InsightStatus::Ready
    }
}

/// Request body understood by the insight generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub config: InsightSeries,
    pub chart_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub x_label: String,
    pub y_label: String,
    pub label: String,
}

impl InsightRequest {
    /// Describes the chart's first series.
    pub fn for_chart(chart: &ChartConfig) -> Self {
        let labels = chart
            .chart_data
            .as_ref()
            .map(|d| d.labels.clone())
            .unwrap_or_default();
        let first = chart.chart_data.as_ref().and_then(|d| d.first_dataset());
        let data = first.map(|d| d.data.clone()).unwrap_or_default();
        let label = first
            .map(|d| d.label.trim())
            .filter(|l| !l.is_empty())
            .unwrap_or("Dataset")
            .to_string();

        let axis_label = |value: &Option<String>, fallback: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        Self {
            config: InsightSeries {
                labels,
                data,
                x_label: axis_label(&chart.x_label, "X"),
                y_label: axis_label(&chart.y_label, "Y"),
                label,
            },
            chart_type: chart.chart_type.clone(),
        }
    }
}
