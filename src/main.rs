// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::analytics_service::AnalyticsService;
use crate::application::export_service::ExportService;
use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_repository::HttpRepository;
use crate::infrastructure::render::offscreen::OffscreenRegistry;
use crate::infrastructure::render::raster::Rasterizer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart_3d, chart_view, export_pdf, export_png, generate_chart, generate_insight, get_insight,
    health_check, list_notifications, list_reports, notification_stream, refresh_reports,
    toggle_chart, toggle_report, upload_detail,
};
use crate::presentation::sessions::{SessionLimits, SessionRegistry, ViewFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpRepository::new(&config.api)?);
    let rasterizer = Rasterizer::with_system_fonts();

    // Create services (application layer)
    let exports = ExportService::new(rasterizer, OffscreenRegistry::new(), config.export.clone());
    let analytics = AnalyticsService::new(repository.clone());
    let sessions = SessionRegistry::new(
        ViewFactory {
            reports: repository.clone(),
            insights: repository,
            exports,
            analytics: analytics.clone(),
            display: config.display.clone(),
            export_settings: config.export.clone(),
            notification_capacity: config.server.notification_capacity,
        },
        SessionLimits {
            max_sessions: config.server.max_sessions,
            idle_timeout: Duration::from_secs(config.server.session_idle_secs),
        },
    );

    let artifacts = ArtifactStore::new(config.export.output_dir.clone());
    tracing::info!("Saving exported artifacts under {}", artifacts.dir().display());

    // Create application state
    let state = Arc::new(AppState {
        sessions,
        analytics,
        artifacts,
        display: config.display.clone(),
    });

    // Build router (presentation layer)
    // Compression is applied by the response builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/reports", get(list_reports))
        .route("/reports/refresh", post(refresh_reports))
        .route("/reports/:id/toggle", post(toggle_report))
        .route("/charts/:id/view", get(chart_view))
        .route("/charts/:id/toggle", post(toggle_chart))
        .route("/charts/:id/png", get(export_png))
        .route("/charts/:id/pdf", get(export_pdf))
        .route("/charts/:id/insight", get(get_insight).post(generate_insight))
        .route("/notifications", get(list_notifications))
        .route("/notifications/stream", get(notification_stream))
        .route("/uploads/:id", get(upload_detail))
        .route("/uploads/:id/charts", post(generate_chart))
        .route("/uploads/:id/charts/3d", get(chart_3d))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting report-studio service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
