// HTTP request handlers
use crate::application::analytics_service::{AnalyticsError, ChartRequest};
use crate::application::export_service::ExportError;
use crate::application::insight_controller::TriggerOutcome;
use crate::application::render_adapter::RenderOptions;
use crate::application::report_view::{ExportSource, ReportView, ViewError};
use crate::domain::artifact::Artifact;
use crate::infrastructure::http_response::{accepts_brotli, artifact_response, json_response, svg_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub const SESSION_HEADER: &str = "x-session-id";
const DEFAULT_SESSION: &str = "default";

#[derive(Debug)]
pub enum ApiError {
    View(ViewError),
    Analytics(AnalyticsError),
    NotFound(String),
    Save(std::io::Error),
    Task(String),
}

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        ApiError::View(e)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(e: AnalyticsError) -> Self {
        ApiError::Analytics(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::View(ViewError::ChartNotFound(_)) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::View(ViewError::Export(ExportError::MissingSurface(_))) => StatusCode::CONFLICT,
            ApiError::View(ViewError::Export(ExportError::Unrenderable(_))) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::View(ViewError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Analytics(AnalyticsError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Analytics(_) => StatusCode::BAD_REQUEST,
            ApiError::Save(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::View(e) => e.to_string(),
            ApiError::Analytics(e) => e.to_string(),
            ApiError::NotFound(what) => format!("{} not found", what),
            ApiError::Save(e) => format!("failed to save artifact: {}", e),
            ApiError::Task(e) => format!("export task failed: {}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

async fn session_view(headers: &HeaderMap, state: &AppState) -> Arc<ReportView> {
    state.sessions.view(&session_id(headers)).await
}

async fn json_reply<T: Serialize>(value: &T, headers: &HeaderMap) -> Response {
    match json_response(value, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Runs an export to completion in its own task so a dropped request
/// cannot interrupt it or its cleanup, then optionally saves the result.
async fn run_export<F>(state: &AppState, export: F, save: bool) -> Result<Response, ApiError>
where
    F: Future<Output = Result<Artifact, ViewError>> + Send + 'static,
{
    let artifacts = state.artifacts.clone();
    let task = tokio::spawn(async move {
        let artifact = export.await.map_err(ApiError::View)?;
        if save {
            artifacts.save(&artifact).await.map_err(ApiError::Save)?;
        }
        Ok::<_, ApiError>(artifact)
    });

    let artifact = task.await.map_err(|e| ApiError::Task(e.to_string()))??;
    artifact_response(artifact).map_err(|status| ApiError::Task(status.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Reports with expansion and insight state for this session
pub async fn list_reports(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = session_view(&headers, &state).await;
    json_reply(&view.reports_view(), &headers).await
}

pub async fn refresh_reports(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = session_view(&headers, &state).await;
    let count = view.refresh().await;
    json_reply(&json!({ "reports": count }), &headers).await
}

pub async fn toggle_report(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    let expanded = view
        .toggle_report(&id)
        .ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?;
    Ok(json_reply(&json!({ "id": id, "expanded": expanded }), &headers).await)
}

pub async fn toggle_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    let expanded = view
        .toggle_chart(&id)
        .ok_or_else(|| ApiError::NotFound(format!("chart {}", id)))?;
    Ok(json_reply(&json!({ "id": id, "expanded": expanded }), &headers).await)
}

/// The chart SVG, or the in-place message shown instead of it
pub async fn chart_view(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    let outcome = view.chart_view(&id)?;
    if !outcome.is_rendered() {
        tracing::debug!("Chart {} shown as placeholder", id);
    }
    Ok(svg_response(outcome.svg().to_string(), accepts_brotli(&headers))
        .await
        .unwrap_or_else(IntoResponse::into_response))
}

#[derive(Debug, Deserialize)]
pub struct PngQuery {
    #[serde(default)]
    pub source: ExportSource,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveQuery {
    #[serde(default)]
    pub save: bool,
}

pub async fn export_png(
    Path(id): Path<String>,
    Query(query): Query<PngQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    run_export(
        &state,
        async move { view.export_png(&id, query.source).await },
        query.save,
    )
    .await
}

pub async fn export_pdf(
    Path(id): Path<String>,
    Query(query): Query<SaveQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    run_export(&state, async move { view.export_pdf(&id).await }, query.save).await
}

/// Starts insight generation. 202 while a new request runs, 200 when nothing changed.
pub async fn generate_insight(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    let status = match view.generate_insight(&id)? {
        TriggerOutcome::Started(_) => StatusCode::ACCEPTED,
        TriggerOutcome::AlreadyLoading | TriggerOutcome::AlreadyReady => StatusCode::OK,
    };
    let entry = view.insight(&id)?;
    Ok((status, json_reply(&entry, &headers).await).into_response())
}

pub async fn get_insight(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = session_view(&headers, &state).await;
    let entry = view.insight(&id)?;
    Ok(json_reply(&entry, &headers).await)
}

pub async fn list_notifications(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = session_view(&headers, &state).await;
    json_reply(&view.notifier().recent(), &headers).await
}

/// Server-sent notification events for this session
pub async fn notification_stream(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let view = session_view(&headers, &state).await;
    let mut rx = view.notifier().subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(notification) => match Event::default().event("notification").json_data(&notification) {
                    Ok(event) => yield Ok(event),
                    Err(e) => tracing::error!("Failed to encode notification: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Notification stream skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn upload_detail(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let detail = state.analytics.upload_detail(&id).await?;
    let body = json!({
        "preview": detail.preview(),
        "defaultAxes": detail.default_axes(),
        "numericColumns": detail.numeric_columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "upload": detail,
    });
    Ok(json_reply(&body, &headers).await)
}

pub async fn generate_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChartRequest>,
) -> Result<Response, ApiError> {
    let chart = state.analytics.generate_chart(&id, &request).await?;
    Ok(json_reply(&chart, &headers).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar3dQuery {
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub title: Option<String>,
}

pub async fn chart_3d(
    Path(id): Path<String>,
    Query(query): Query<Bar3dQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let mut options = RenderOptions::new(state.display.width, state.display.height);
    if let Some(title) = query.title {
        options = options.with_title(title);
    }
    let svg = state
        .analytics
        .render_3d(&id, query.x_axis, query.y_axis, &options)
        .await?;
    Ok(svg_response(svg, accepts_brotli(&headers))
        .await
        .unwrap_or_else(IntoResponse::into_response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_defaults() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), "default");
        headers.insert(SESSION_HEADER, HeaderValue::from_static("  "));
        assert_eq!(session_id(&headers), "default");
        headers.insert(SESSION_HEADER, HeaderValue::from_static("tab-7"));
        assert_eq!(session_id(&headers), "tab-7");
    }

    #[test]
    fn test_error_status_mapping() {
        let missing = ApiError::View(ViewError::Export(ExportError::MissingSurface("c1".into())));
        assert_eq!(missing.status(), StatusCode::CONFLICT);

        let unsupported = ApiError::View(ViewError::Export(ExportError::Unrenderable("x".into())));
        assert_eq!(unsupported.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let not_found = ApiError::View(ViewError::ChartNotFound("c1".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let upstream = ApiError::Analytics(AnalyticsError::Upstream(anyhow::anyhow!("down")));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        assert_eq!(
            ApiError::Analytics(AnalyticsError::MissingAxes).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
