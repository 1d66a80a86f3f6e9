// Session registry - one report view per client session
use crate::application::analytics_service::AnalyticsService;
use crate::application::export_service::ExportService;
use crate::application::insight_controller::InsightController;
use crate::application::notifier::Notifier;
use crate::application::report_repository::{InsightRepository, ReportRepository};
use crate::application::report_store::ReportStore;
use crate::application::report_view::ReportView;
use crate::infrastructure::config::{DisplaySettings, ExportSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Builds fresh views. Each view gets its own notifier and insight cache.
pub struct ViewFactory {
    pub reports: Arc<dyn ReportRepository>,
    pub insights: Arc<dyn InsightRepository>,
    pub exports: ExportService,
    pub analytics: AnalyticsService,
    pub display: DisplaySettings,
    pub export_settings: ExportSettings,
    pub notification_capacity: usize,
}

impl ViewFactory {
    pub fn build(&self) -> ReportView {
        let notifier = Notifier::new(self.notification_capacity);
        ReportView::new(
            ReportStore::new(self.reports.clone()),
            self.exports.clone(),
            InsightController::new(self.insights.clone(), notifier.clone()),
            self.analytics.clone(),
            notifier,
            self.display.clone(),
            &self.export_settings,
        )
    }
}

struct Session {
    view: Arc<ReportView>,
    loaded: Arc<OnceCell<()>>,
    last_used: Instant,
    /// Order of last use; breaks ties between equal instants.
    last_tick: u64,
}

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, Session>,
    tick: u64,
}

/// Bounds on how many sessions are kept and for how long.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

/// Session state lives only in memory and starts empty.
#[derive(Clone)]
pub struct SessionRegistry {
    factory: Arc<ViewFactory>,
    limits: SessionLimits,
    table: Arc<Mutex<SessionTable>>,
}

impl SessionRegistry {
    pub fn new(factory: ViewFactory, limits: SessionLimits) -> Self {
        Self {
            factory: Arc::new(factory),
            limits,
            table: Arc::new(Mutex::new(SessionTable::default())),
        }
    }

    /// The session's view, loading its reports the first time it is used.
    pub async fn view(&self, session_id: &str) -> Arc<ReportView> {
        let (view, loaded) = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            table.tick += 1;
            let tick = table.tick;
            self.evict(&mut table.sessions, session_id, now);

            let session = table.sessions.entry(session_id.to_string()).or_insert_with(|| {
                tracing::info!("Starting session {}", session_id);
                Session {
                    view: Arc::new(self.factory.build()),
                    loaded: Arc::new(OnceCell::new()),
                    last_used: now,
                    last_tick: tick,
                }
            });
            session.last_used = now;
            session.last_tick = tick;
            (session.view.clone(), session.loaded.clone())
        };

        loaded
            .get_or_init(|| async {
                view.refresh().await;
            })
            .await;
        view
    }

    /// Drops idle sessions, then the least recently used ones until a slot
    /// is free for `keep`.
    fn evict(&self, sessions: &mut HashMap<String, Session>, keep: &str, now: Instant) {
        let idle_timeout = self.limits.idle_timeout;
        sessions.retain(|id, session| {
            let alive = id == keep || now.duration_since(session.last_used) < idle_timeout;
            if !alive {
                tracing::info!("Dropping idle session {}", id);
            }
            alive
        });

        let max = self.limits.max_sessions.max(1);
        while !sessions.contains_key(keep) && sessions.len() >= max {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_tick)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            tracing::info!("Evicting least recently used session {}", oldest);
            sessions.remove(&oldest);
        }
    }

    pub fn session_count(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }
}
