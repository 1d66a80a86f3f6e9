// Report view - One session's reports, expansion state, surfaces and actions
use crate::application::analytics_service::AnalyticsService;
use crate::application::export_service::{ExportError, ExportService};
use crate::application::insight_controller::{InsightController, TriggerOutcome};
use crate::application::notifier::Notifier;
use crate::application::render_adapter::{render, RenderOptions, RenderOutcome};
use crate::application::report_store::ReportStore;
use crate::domain::artifact::{Artifact, ArtifactFormat};
use crate::domain::chart::ChartConfig;
use crate::domain::expansion::ExpansionState;
use crate::domain::insight::{InsightEntry, InsightRequest, InsightStatus};
use crate::domain::report::Report;
use crate::infrastructure::config::{DisplaySettings, ExportSettings};
use crate::infrastructure::render::raster::Surface;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

pub const REPORTS_NOTIFICATION_KEY: &str = "reports";

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("chart {0} not found")]
    ChartNotFound(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Where a PNG export takes its pixels from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportSource {
    /// The mounted surface if there is one, otherwise off-screen.
    #[default]
    Auto,
    Screen,
    Offscreen,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSummary {
    pub id: String,
    pub chart_type: String,
    pub expanded: bool,
    pub mounted: bool,
    pub insight: InsightEntry,
    pub show_generate_control: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryView {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub expanded: bool,
    pub charts: Vec<ChartSummary>,
}

#[derive(Default)]
struct ViewState {
    reports: Vec<Report>,
    expansion: ExpansionState,
    /// Mounted charts by chart id. Present only while the report is expanded.
    surfaces: HashMap<String, Surface>,
}

impl ViewState {
    fn find_chart(&self, chart_id: &str) -> Option<(&Report, &ChartConfig)> {
        self.reports
            .iter()
            .find_map(|report| report.chart(chart_id).map(|chart| (report, chart)))
    }
}

pub struct ReportView {
    store: ReportStore,
    exports: ExportService,
    insights: InsightController,
    analytics: AnalyticsService,
    notifier: Notifier,
    display: DisplaySettings,
    fullscreen: (u32, u32),
    state: RwLock<ViewState>,
}

impl ReportView {
    pub fn new(
        store: ReportStore,
        exports: ExportService,
        insights: InsightController,
        analytics: AnalyticsService,
        notifier: Notifier,
        display: DisplaySettings,
        export_settings: &ExportSettings,
    ) -> Self {
        Self {
            store,
            exports,
            insights,
            analytics,
            notifier,
            display,
            fullscreen: (export_settings.width, export_settings.height),
            state: RwLock::new(ViewState::default()),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Reloads every report. On failure the view is emptied and an error is
    /// raised; it never propagates.
    pub async fn refresh(&self) -> usize {
        let reports = match self.store.load_reports().await {
            Ok(reports) => reports,
            Err(e) => {
                tracing::error!("Failed to fetch reports: {:#}", e);
                self.notifier.error(REPORTS_NOTIFICATION_KEY, "Failed to fetch reports");
                Vec::new()
            }
        };

        for chart in reports.iter().flat_map(|r| &r.chart_configs) {
            if let Some(text) = &chart.insight {
                self.insights.seed(&chart.id, text);
            }
        }

        let expanded: Vec<ChartConfig> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            reports
                .iter()
                .filter(|r| state.expansion.is_report_expanded(&r.id))
                .flat_map(|r| r.chart_configs.iter().cloned())
                .collect()
        };
        let surfaces = self.mount_all(&expanded);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.surfaces = surfaces.into_iter().collect();
        state.reports = reports;
        tracing::info!("Loaded {} reports", state.reports.len());
        state.reports.len()
    }

    pub fn reports_view(&self) -> Vec<ReportSummaryView> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let insights = self.insights.snapshot();

        state
            .reports
            .iter()
            .map(|report| ReportSummaryView {
                id: report.id.clone(),
                display_name: report.display_name.clone(),
                created_at: report.created_at,
                expanded: state.expansion.is_report_expanded(&report.id),
                charts: report
                    .chart_configs
                    .iter()
                    .map(|chart| {
                        let insight = insights.get(&chart.id).cloned().unwrap_or_default();
                        ChartSummary {
                            id: chart.id.clone(),
                            chart_type: chart.chart_type.clone(),
                            expanded: state.expansion.is_chart_expanded(&chart.id),
                            mounted: state.surfaces.contains_key(&chart.id),
                            show_generate_control: insight.shows_generate_control(),
                            insight,
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    /// Expanding mounts the report's charts; collapsing unmounts them.
    /// `None` when the report is unknown.
    pub fn toggle_report(&self, report_id: &str) -> Option<bool> {
        let (expanded, charts) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let charts = state
                .reports
                .iter()
                .find(|r| r.id == report_id)?
                .chart_configs
                .clone();
            let expanded = state.expansion.toggle_report(report_id);
            if !expanded {
                for chart in &charts {
                    state.surfaces.remove(&chart.id);
                }
            }
            (expanded, charts)
        };

        if expanded {
            let surfaces = self.mount_all(&charts);
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            // Skip the insert if the report was collapsed while rendering.
            if state.expansion.is_report_expanded(report_id) {
                state.surfaces.extend(surfaces);
            }
        }
        Some(expanded)
    }

    /// Rasterizes on-screen surfaces. Called without the state lock held.
    fn mount_all(&self, charts: &[ChartConfig]) -> Vec<(String, Surface)> {
        charts
            .iter()
            .filter_map(|chart| {
                self.exports
                    .mount(chart, &self.display)
                    .map(|surface| (chart.id.clone(), surface))
            })
            .collect()
    }

    pub fn toggle_chart(&self, chart_id: &str) -> Option<bool> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.find_chart(chart_id)?;
        Some(state.expansion.toggle_chart(chart_id))
    }

    /// The chart as displayed, or the placeholder that replaces it.
    pub fn chart_view(&self, chart_id: &str) -> Result<RenderOutcome, ViewError> {
        let (chart, expanded) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let (_, chart) = state
                .find_chart(chart_id)
                .ok_or_else(|| ViewError::ChartNotFound(chart_id.to_string()))?;
            (chart.clone(), state.expansion.is_chart_expanded(chart_id))
        };

        let (width, height) = if expanded {
            self.fullscreen
        } else {
            (self.display.width, self.display.height)
        };
        let options = RenderOptions::new(width, height)
            .with_axis_labels(chart.x_label.as_deref(), chart.y_label.as_deref());
        Ok(render(&chart.chart_type, chart.chart_data.as_ref(), &options))
    }

    pub async fn export_png(&self, chart_id: &str, source: ExportSource) -> Result<Artifact, ViewError> {
        let key = format!("png-{}", chart_id);
        let (report_id, chart, surface) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let Some((report, chart)) = state.find_chart(chart_id) else {
                self.notifier.error(&key, "Chart not found");
                return Err(ViewError::ChartNotFound(chart_id.to_string()));
            };
            (report.id.clone(), chart.clone(), state.surfaces.get(chart_id).cloned())
        };

        self.notifier.loading(&key, "Exporting PNG...");
        let result = match (source, surface) {
            (ExportSource::Screen, surface) => self.exports.png_from_surface(&chart.id, surface.as_ref()),
            (ExportSource::Auto, Some(surface)) => self.exports.png_from_surface(&chart.id, Some(&surface)),
            (ExportSource::Auto, None) | (ExportSource::Offscreen, _) => self.exports.png_offscreen(&chart).await,
        };
        self.finish_export(&key, "PNG", &report_id, &chart, ArtifactFormat::Png, result)
            .await
    }

    /// PDF of the chart, annotated with its insight when one is known.
    pub async fn export_pdf(&self, chart_id: &str) -> Result<Artifact, ViewError> {
        let key = format!("pdf-{}", chart_id);
        let (report_id, chart) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let Some((report, chart)) = state.find_chart(chart_id) else {
                self.notifier.error(&key, "Chart not found");
                return Err(ViewError::ChartNotFound(chart_id.to_string()));
            };
            (report.id.clone(), chart.clone())
        };

        let entry = self.insights.entry(chart_id);
        let insight = match entry.status {
            InsightStatus::Ready => entry.text,
            _ => chart.insight.clone().filter(|t| !t.trim().is_empty()),
        };

        self.notifier.loading(&key, "Exporting PDF...");
        let result = self.exports.pdf(&chart, insight.as_deref()).await;
        self.finish_export(&key, "PDF", &report_id, &chart, ArtifactFormat::Pdf, result)
            .await
    }

    async fn finish_export(
        &self,
        key: &str,
        label: &str,
        report_id: &str,
        chart: &ChartConfig,
        format: ArtifactFormat,
        result: Result<Artifact, ExportError>,
    ) -> Result<Artifact, ViewError> {
        match result {
            Ok(artifact) => {
                self.notifier.success(key, format!("{} exported", label));
                tracing::info!("Exported {} ({} bytes)", artifact.filename, artifact.bytes.len());
                self.analytics
                    .log_download(report_id, format, &chart.chart_type)
                    .await;
                Ok(artifact)
            }
            Err(e) => {
                tracing::error!("{} export of chart {} failed: {}", label, chart.id, e);
                self.notifier.error(key, format!("Failed to export {}: {}", label, e));
                Err(e.into())
            }
        }
    }

    pub fn generate_insight(&self, chart_id: &str) -> Result<TriggerOutcome, ViewError> {
        let chart = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let (_, chart) = state
                .find_chart(chart_id)
                .ok_or_else(|| ViewError::ChartNotFound(chart_id.to_string()))?;
            chart.clone()
        };
        Ok(self.insights.trigger(chart_id, InsightRequest::for_chart(&chart)))
    }

    pub fn insight(&self, chart_id: &str) -> Result<InsightEntry, ViewError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .find_chart(chart_id)
            .ok_or_else(|| ViewError::ChartNotFound(chart_id.to_string()))?;
        Ok(self.insights.entry(chart_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{chart, FakeInsights, FakeRepository};
    use crate::domain::notification::NotificationLevel;
    use crate::infrastructure::render::offscreen::OffscreenRegistry;
    use crate::infrastructure::render::raster::Rasterizer;
    use std::sync::Arc;

    fn view_with(repo: FakeRepository, insights: FakeInsights) -> (ReportView, Arc<FakeRepository>) {
        let repo = Arc::new(repo);
        let notifier = Notifier::new(20);
        let export_settings = ExportSettings {
            width: 120,
            height: 90,
            ..Default::default()
        };
        let view = ReportView::new(
            ReportStore::new(repo.clone()),
            ExportService::new(Rasterizer::headless(), OffscreenRegistry::new(), export_settings.clone()),
            InsightController::new(Arc::new(insights), notifier.clone()),
            AnalyticsService::new(repo.clone()),
            notifier,
            DisplaySettings { width: 80, height: 60 },
            &export_settings,
        );
        (view, repo)
    }

    fn sample() -> FakeRepository {
        let mut with_insight = chart("a2", "pie");
        with_insight.insight = Some("Feb leads.".to_string());
        FakeRepository::default()
            .with_report("A", vec![chart("a1", "bar"), with_insight])
            .with_report("B", vec![chart("b1", "scatter3d")])
    }

    #[tokio::test]
    async fn test_list_failure_shows_empty_state_with_notification() {
        let repo = FakeRepository {
            fail_list: true,
            ..sample()
        };
        let (view, _) = view_with(repo, FakeInsights::empty());

        assert_eq!(view.refresh().await, 0);
        assert!(view.reports_view().is_empty());
        let note = view.notifier().latest(REPORTS_NOTIFICATION_KEY).unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.message, "Failed to fetch reports");
    }

    #[tokio::test]
    async fn test_refresh_seeds_stored_insights() {
        let (view, _) = view_with(sample(), FakeInsights::empty());
        assert_eq!(view.refresh().await, 2);

        let reports = view.reports_view();
        let a2 = &reports[0].charts[1];
        assert_eq!(a2.insight.status, InsightStatus::Ready);
        assert!(!a2.show_generate_control);
        assert!(reports[0].charts[0].show_generate_control);
    }

    #[tokio::test]
    async fn test_expanding_mounts_and_collapsing_unmounts() {
        let (view, _) = view_with(sample(), FakeInsights::empty());
        view.refresh().await;

        assert_eq!(view.toggle_report("A"), Some(true));
        let reports = view.reports_view();
        assert!(reports[0].expanded);
        assert!(reports[0].charts.iter().all(|c| c.mounted));

        let artifact = view.export_png("a1", ExportSource::Screen).await.unwrap();
        assert_eq!(artifact.filename, "chart-a1.png");

        assert_eq!(view.toggle_report("A"), Some(false));
        let err = view.export_png("a1", ExportSource::Screen).await.unwrap_err();
        assert!(matches!(err, ViewError::Export(ExportError::MissingSurface(_))));
        assert_eq!(
            view.notifier().latest("png-a1").unwrap().level,
            NotificationLevel::Error
        );
        assert_eq!(view.toggle_report("missing"), None);
    }

    #[tokio::test]
    async fn test_refresh_remounts_only_expanded_reports() {
        let (view, _) = view_with(sample(), FakeInsights::empty());
        view.refresh().await;
        view.toggle_report("A");

        assert_eq!(view.refresh().await, 2);
        let reports = view.reports_view();
        assert!(reports[0].charts.iter().all(|c| c.mounted));
        assert!(!reports[1].expanded);
        assert!(reports[1].charts.iter().all(|c| !c.mounted));

        view.toggle_report("A");
        view.refresh().await;
        assert!(view.reports_view()[0].charts.iter().all(|c| !c.mounted));
    }

    #[tokio::test]
    async fn test_auto_export_falls_back_to_offscreen() {
        let (view, repo) = view_with(sample(), FakeInsights::empty());
        view.refresh().await;

        let artifact = view.export_png("a1", ExportSource::Auto).await.unwrap();
        assert_eq!(artifact.format, ArtifactFormat::Png);
        assert_eq!(view.notifier().latest("png-a1").unwrap().level, NotificationLevel::Success);

        let events = repo.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].upload_id, "A");
    }

    #[tokio::test]
    async fn test_pdf_export_and_unsupported_chart_failure() {
        let (view, _) = view_with(sample(), FakeInsights::empty());
        view.refresh().await;

        let artifact = view.export_pdf("a2").await.unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF"));

        assert!(view.export_pdf("b1").await.is_err());
        assert_eq!(view.notifier().latest("pdf-b1").unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_chart_view_and_toggle() {
        let (view, _) = view_with(sample(), FakeInsights::empty());
        view.refresh().await;

        let outcome = view.chart_view("b1").unwrap();
        assert!(outcome.svg().contains("Unsupported chart type: scatter3d"));

        assert_eq!(view.toggle_chart("a1"), Some(true));
        let expanded = view.chart_view("a1").unwrap().into_rendered().unwrap();
        assert_eq!((expanded.width, expanded.height), (120, 90));
        assert_eq!(view.toggle_chart("nope"), None);
        assert!(matches!(view.chart_view("nope"), Err(ViewError::ChartNotFound(_))));
    }

    #[tokio::test]
    async fn test_generate_insight_through_view() {
        let (view, _) = view_with(sample(), FakeInsights::replying("Rising."));
        view.refresh().await;

        let TriggerOutcome::Started(handle) = view.generate_insight("a1").unwrap() else {
            panic!("expected a request to start");
        };
        handle.await.unwrap();
        assert_eq!(view.insight("a1").unwrap().text.as_deref(), Some("Rising."));
        assert!(matches!(
            view.generate_insight("a2").unwrap(),
            TriggerOutcome::AlreadyReady
        ));
    }
}
