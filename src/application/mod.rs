// Application layer - Use cases over the collaborator API and rendering
pub mod analytics_service;
pub mod chart_builder;
pub mod export_service;
pub mod insight_controller;
pub mod notifier;
pub mod render_adapter;
pub mod report_repository;
pub mod report_store;
pub mod report_view;

#[cfg(test)]
pub(crate) mod testing {
    use super::report_repository::{InsightRepository, ReportRepository};
    use crate::domain::chart::{ChartConfig, ChartData, Dataset, RawSeries, SaveChartConfig};
    use crate::domain::insight::InsightRequest;
    use crate::domain::report::ReportSummary;
    use crate::domain::upload::{AnalyticsEvent, UploadDetail};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// In-memory collaborator with switchable failures.
    #[derive(Default)]
    pub struct FakeRepository {
        pub reports: Vec<ReportSummary>,
        pub charts: HashMap<String, Vec<ChartConfig>>,
        pub failing_reports: HashSet<String>,
        pub fail_list: bool,
        pub upload: Option<UploadDetail>,
        pub series: Option<RawSeries>,
        pub saved: Mutex<Vec<SaveChartConfig>>,
        pub events: Mutex<Vec<AnalyticsEvent>>,
    }

    impl FakeRepository {
        pub fn with_report(mut self, id: &str, charts: Vec<ChartConfig>) -> Self {
            self.reports.push(summary(id));
            self.charts.insert(id.to_string(), charts);
            self
        }

        pub fn failing_charts(mut self, report_id: &str) -> Self {
            self.failing_reports.insert(report_id.to_string());
            self
        }
    }

    #[async_trait]
    impl ReportRepository for FakeRepository {
        async fn list_reports(&self) -> anyhow::Result<Vec<ReportSummary>> {
            if self.fail_list {
                anyhow::bail!("reports list unavailable");
            }
            Ok(self.reports.clone())
        }

        async fn chart_configs(&self, report_id: &str) -> anyhow::Result<Vec<ChartConfig>> {
            if self.failing_reports.contains(report_id) {
                anyhow::bail!("chart configs for {} unavailable", report_id);
            }
            Ok(self.charts.get(report_id).cloned().unwrap_or_default())
        }

        async fn upload_detail(&self, upload_id: &str) -> anyhow::Result<UploadDetail> {
            self.upload
                .clone()
                .ok_or_else(|| anyhow::anyhow!("upload {} not found", upload_id))
        }

        async fn chart_data(&self, upload_id: &str, _x: &str, _y: &str) -> anyhow::Result<RawSeries> {
            self.series
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no chart data for {}", upload_id))
        }

        async fn save_chart_config(&self, config: &SaveChartConfig) -> anyhow::Result<()> {
            self.saved.lock().unwrap().push(config.clone());
            Ok(())
        }

        async fn log_event(&self, event: &AnalyticsEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Insight collaborator that can be held open until released.
    pub struct FakeInsights {
        reply: Result<Option<String>, String>,
        gate: Option<Arc<Notify>>,
        pub calls: AtomicUsize,
    }

    impl FakeInsights {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(Some(text.to_string())),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn empty() -> Self {
            Self {
                reply: Ok(None),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: Err("insight service unavailable".to_string()),
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InsightRepository for FakeInsights {
        async fn generate_insight(&self, _request: &InsightRequest) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    pub fn summary(id: &str) -> ReportSummary {
        ReportSummary {
            id: id.to_string(),
            display_name: format!("{}.xlsx", id),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    pub fn chart(id: &str, chart_type: &str) -> ChartConfig {
        ChartConfig {
            id: id.to_string(),
            chart_type: chart_type.to_string(),
            chart_data: Some(ChartData {
                labels: vec!["Jan".to_string(), "Feb".to_string()],
                datasets: vec![Dataset::plain("Sales", vec![1.0, 2.0])],
            }),
            x_label: None,
            y_label: None,
            insight: None,
        }
    }
}
