// Repository traits for the collaborator API
use crate::domain::chart::{ChartConfig, RawSeries, SaveChartConfig};
use crate::domain::insight::InsightRequest;
use crate::domain::report::ReportSummary;
use crate::domain::upload::{AnalyticsEvent, UploadDetail};
use async_trait::async_trait;

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// List report metadata in display order
    async fn list_reports(&self) -> anyhow::Result<Vec<ReportSummary>>;

    /// Chart configurations generated for one report
    async fn chart_configs(&self, report_id: &str) -> anyhow::Result<Vec<ChartConfig>>;

    async fn upload_detail(&self, upload_id: &str) -> anyhow::Result<UploadDetail>;

    /// Extract one label column and one value column from an upload
    async fn chart_data(&self, upload_id: &str, x_axis: &str, y_axis: &str) -> anyhow::Result<RawSeries>;

    async fn save_chart_config(&self, config: &SaveChartConfig) -> anyhow::Result<()>;

    async fn log_event(&self, event: &AnalyticsEvent) -> anyhow::Result<()>;
}

#[async_trait]
pub trait InsightRepository: Send + Sync {
    /// Generated summary text, `None` when the collaborator returned nothing
    async fn generate_insight(&self, request: &InsightRequest) -> anyhow::Result<Option<String>>;
}
