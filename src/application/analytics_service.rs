// Analytics service - Chart generation from uploaded spreadsheet columns
use crate::application::chart_builder;
use crate::application::render_adapter::{lookup, RenderOptions};
use crate::application::report_repository::ReportRepository;
use crate::domain::artifact::ArtifactFormat;
use crate::domain::chart::{ChartData, ChartError, ChartKind, Dataset, SaveChartConfig};
use crate::domain::upload::{AnalyticsEvent, UploadDetail};
use crate::infrastructure::render::bar3d::{self, Bar3d};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("both an X axis and a Y axis must be selected")]
    MissingAxes,

    #[error("Unsupported chart type: {0}")]
    UnsupportedChartType(String),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub chart_type: String,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedChart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub chart_data: ChartData,
    /// 3D layout of the same series; pie charts have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bars_3d: Option<Vec<Bar3d>>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<dyn ReportRepository>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn ReportRepository>) -> Self {
        Self { repository }
    }

    pub async fn upload_detail(&self, upload_id: &str) -> Result<UploadDetail, AnalyticsError> {
        Ok(self.repository.upload_detail(upload_id).await?)
    }

    /// Fetches the selected columns, builds the chart and saves its config.
    pub async fn generate_chart(&self, upload_id: &str, request: &ChartRequest) -> Result<GeneratedChart, AnalyticsError> {
        let (x_axis, y_axis) = match (non_empty(&request.x_axis), non_empty(&request.y_axis)) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(AnalyticsError::MissingAxes),
        };
        let kind = lookup(&request.chart_type)
            .ok_or_else(|| AnalyticsError::UnsupportedChartType(request.chart_type.clone()))?;

        let raw = self.repository.chart_data(upload_id, x_axis, y_axis).await?;
        let x_label = raw.x_axis_label.clone().unwrap_or_else(|| x_axis.to_string());
        let y_label = raw.y_axis_label.clone().unwrap_or_else(|| y_axis.to_string());
        let chart_data = chart_builder::build(&raw, kind, &y_label)?;

        // Persist the plain series; colors are reapplied when rendering.
        let saved = SaveChartConfig {
            upload_id: upload_id.to_string(),
            chart_type: kind.tag().to_string(),
            chart_data: ChartData {
                labels: chart_data.labels.clone(),
                datasets: chart_data
                    .datasets
                    .iter()
                    .map(|d| Dataset::plain(d.label.clone(), d.data.clone()))
                    .collect(),
            },
        };
        self.repository.save_chart_config(&saved).await?;
        tracing::info!("Saved {} chart for upload {} ({} vs {})", kind.tag(), upload_id, x_axis, y_axis);

        let bars_3d = (kind != ChartKind::Pie).then(|| {
            chart_data
                .first_dataset()
                .map(|d| bar3d::layout(&d.data))
                .unwrap_or_default()
        });

        Ok(GeneratedChart {
            kind,
            title: non_empty(&request.title)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} vs {}", y_label, x_label)),
            x_label,
            y_label,
            chart_data,
            bars_3d,
        })
    }

    /// Renders the 3D bar scene for two columns, defaulting to the first two.
    pub async fn render_3d(
        &self,
        upload_id: &str,
        x_axis: Option<String>,
        y_axis: Option<String>,
        options: &RenderOptions,
    ) -> Result<String, AnalyticsError> {
        let (x_axis, y_axis) = match (non_empty(&x_axis), non_empty(&y_axis)) {
            (Some(x), Some(y)) => (x.to_string(), y.to_string()),
            _ => self
                .upload_detail(upload_id)
                .await?
                .default_axes()
                .ok_or(AnalyticsError::MissingAxes)?,
        };

        let raw = self.repository.chart_data(upload_id, &x_axis, &y_axis).await?;
        let chart_data = chart_builder::build(&raw, ChartKind::Bar3d, &y_axis)?;
        let values = chart_data
            .first_dataset()
            .map(|d| d.data.as_slice())
            .unwrap_or_default();
        Ok(bar3d::render_scene(&bar3d::layout(values), &chart_data.labels, options))
    }

    /// Records a completed download. Failures are only traced.
    pub async fn log_download(&self, upload_id: &str, format: ArtifactFormat, chart_type: &str) {
        let event = AnalyticsEvent {
            upload_id: upload_id.to_string(),
            action: "chart_download".to_string(),
            details: json!({ "format": format.extension(), "chartType": chart_type }),
        };
        if let Err(e) = self.repository.log_event(&event).await {
            tracing::warn!("Failed to log download for upload {}: {:#}", upload_id, e);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
