// Report store - Loads reports and their chart configs concurrently
use crate::application::report_repository::ReportRepository;
use crate::domain::report::Report;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReportStore {
    repository: Arc<dyn ReportRepository>,
}

impl ReportStore {
    pub fn new(repository: Arc<dyn ReportRepository>) -> Self {
        Self { repository }
    }

    /// Fails only when the report list itself cannot be fetched. A report whose
    /// chart configs fail to load keeps its place with no charts.
    pub async fn load_reports(&self) -> anyhow::Result<Vec<Report>> {
        let summaries = self.repository.list_reports().await?;
        tracing::debug!("Loading chart configs for {} reports", summaries.len());

        let fetches = summaries.into_iter().map(|summary| {
            let repo = self.repository.clone();
            async move {
                let charts = match repo.chart_configs(&summary.id).await {
                    Ok(charts) => charts,
                    Err(e) => {
                        tracing::warn!("Failed to load chart configs for report {}: {:#}", summary.id, e);
                        Vec::new()
                    }
                };
                Report::from_summary(summary, charts)
            }
        });

        Ok(join_all(fetches).await)
    }
}
