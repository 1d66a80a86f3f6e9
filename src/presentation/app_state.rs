// Application state for HTTP handlers
use crate::application::analytics_service::AnalyticsService;
use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::config::DisplaySettings;
use crate::presentation::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub analytics: AnalyticsService,
    pub artifacts: ArtifactStore,
    pub display: DisplaySettings,
}
