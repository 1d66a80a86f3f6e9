// Insight controller - Per-chart insight requests and their cached results
use crate::application::notifier::Notifier;
use crate::application::report_repository::InsightRepository;
use crate::domain::insight::{InsightEntry, InsightRequest, InsightStatus, EMPTY_INSIGHT_TEXT};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

#[derive(Debug)]
pub enum TriggerOutcome {
    /// A request is in flight; the handle resolves to the final status.
    Started(JoinHandle<InsightStatus>),
    AlreadyLoading,
    AlreadyReady,
}

fn notification_key(chart_id: &str) -> String {
    format!("insight-{}", chart_id)
}

/// Insight cache keyed by chart id. Entries only move
/// idle -> loading -> ready, or loading -> error -> loading.
/// A ready entry is never replaced.
#[derive(Clone)]
pub struct InsightController {
    repository: Arc<dyn InsightRepository>,
    entries: Arc<Mutex<HashMap<String, InsightEntry>>>,
    notifier: Notifier,
}

impl InsightController {
    pub fn new(repository: Arc<dyn InsightRepository>, notifier: Notifier) -> Self {
        Self {
            repository,
            entries: Arc::new(Mutex::new(HashMap::new())),
            notifier,
        }
    }

    pub fn entry(&self, chart_id: &str) -> InsightEntry {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chart_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> HashMap<String, InsightEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Marks a chart ready with text it already carries. Existing entries win.
    pub fn seed(&self, chart_id: &str, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(chart_id.to_string())
            .or_insert_with(|| InsightEntry::ready(text));
    }

    /// Starts generation unless the chart is loading or already has an insight.
    pub fn trigger(&self, chart_id: &str, request: InsightRequest) -> TriggerOutcome {
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.entry(chart_id.to_string()).or_default();
            match entry.status {
                InsightStatus::Loading => return TriggerOutcome::AlreadyLoading,
                InsightStatus::Ready => return TriggerOutcome::AlreadyReady,
                InsightStatus::Idle | InsightStatus::Error => entry.status = InsightStatus::Loading,
            }
        }

        let key = notification_key(chart_id);
        self.notifier.loading(&key, "Generating insight...");
        tracing::info!("Generating insight for chart {}", chart_id);

        let repository = self.repository.clone();
        let entries = self.entries.clone();
        let notifier = self.notifier.clone();
        let chart_id = chart_id.to_string();

        TriggerOutcome::Started(tokio::spawn(async move {
            let result = repository
                .generate_insight(&request)
                .await
                .map_err(InsightError::Generation);

            match result {
                Ok(text) => {
                    let text = text
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| EMPTY_INSIGHT_TEXT.to_string());
                    entries
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(chart_id.clone(), InsightEntry::ready(text));
                    notifier.success(&key, "Insight generated!");
                    InsightStatus::Ready
                }
                Err(e) => {
                    tracing::error!("Insight for chart {} failed: {}", chart_id, e);
                    entries
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(
                            chart_id.clone(),
                            InsightEntry {
                                status: InsightStatus::Error,
                                text: None,
                            },
                        );
                    notifier.error(&key, "Failed to generate insight");
                    InsightStatus::Error
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{chart, FakeInsights};
    use crate::domain::notification::NotificationLevel;
    use tokio::sync::Notify;

    fn controller(insights: FakeInsights) -> (InsightController, Arc<FakeInsights>, Notifier) {
        let insights = Arc::new(insights);
        let notifier = Notifier::new(10);
        (
            InsightController::new(insights.clone(), notifier.clone()),
            insights,
            notifier,
        )
    }

    fn request() -> InsightRequest {
        InsightRequest::for_chart(&chart("c1", "bar"))
    }

    #[tokio::test]
    async fn test_lifecycle_idle_loading_ready() {
        let gate = Arc::new(Notify::new());
        let (controller, insights, _) =
            controller(FakeInsights::replying("Sales doubled.").gated(gate.clone()));
        assert_eq!(controller.entry("c1").status, InsightStatus::Idle);

        let TriggerOutcome::Started(handle) = controller.trigger("c1", request()) else {
            panic!("first trigger should start a request");
        };
        assert_eq!(controller.entry("c1").status, InsightStatus::Loading);
        assert!(matches!(
            controller.trigger("c1", request()),
            TriggerOutcome::AlreadyLoading
        ));

        gate.notify_one();
        assert_eq!(handle.await.unwrap(), InsightStatus::Ready);

        let entry = controller.entry("c1");
        assert_eq!(entry.text.as_deref(), Some("Sales doubled."));
        assert!(!entry.shows_generate_control());
        assert!(matches!(
            controller.trigger("c1", request()),
            TriggerOutcome::AlreadyReady
        ));
        assert_eq!(insights.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_insight_gets_placeholder_text() {
        let (controller, _, _) = controller(FakeInsights::empty());
        let TriggerOutcome::Started(handle) = controller.trigger("c1", request()) else {
            panic!("expected start");
        };
        handle.await.unwrap();
        assert_eq!(controller.entry("c1").text.as_deref(), Some(EMPTY_INSIGHT_TEXT));
    }

    #[tokio::test]
    async fn test_failure_is_retryable() {
        let (controller, insights, notifier) = controller(FakeInsights::failing());
        let TriggerOutcome::Started(handle) = controller.trigger("c1", request()) else {
            panic!("expected start");
        };
        assert_eq!(handle.await.unwrap(), InsightStatus::Error);

        let entry = controller.entry("c1");
        assert!(entry.shows_generate_control());
        let note = notifier.latest("insight-c1").unwrap();
        assert_eq!(note.level, NotificationLevel::Error);

        let TriggerOutcome::Started(retry) = controller.trigger("c1", request()) else {
            panic!("error state should allow a retry");
        };
        retry.await.unwrap();
        assert_eq!(insights.call_count(), 2);
    }

    #[tokio::test]
    async fn test_distinct_charts_run_independently() {
        let gate = Arc::new(Notify::new());
        let (controller, _, _) = controller(FakeInsights::replying("ok").gated(gate.clone()));

        let first = controller.trigger("c1", request());
        let second = controller.trigger("c2", request());
        assert!(matches!(first, TriggerOutcome::Started(_)));
        assert!(matches!(second, TriggerOutcome::Started(_)));
        assert_eq!(controller.entry("c2").status, InsightStatus::Loading);
    }

    #[test]
    fn test_seed_never_overwrites() {
        let (controller, _, _) = controller(FakeInsights::empty());
        controller.seed("c1", "Stored insight.");
        controller.seed("c1", "Newer text.");
        controller.seed("c2", "   ");

        assert_eq!(controller.entry("c1").text.as_deref(), Some("Stored insight."));
        assert_eq!(controller.entry("c2").status, InsightStatus::Idle);
    }
}
