// Collaborator API repository implementation over reqwest
use crate::application::report_repository::{InsightRepository, ReportRepository};
use crate::domain::chart::{ChartConfig, RawSeries, SaveChartConfig};
use crate::domain::insight::InsightRequest;
use crate::domain::report::ReportSummary;
use crate::domain::upload::{AnalyticsEvent, UploadDetail};
use crate::infrastructure::config::{prepare_path, ApiSettings, EndpointSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    endpoints: EndpointSettings,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    #[serde(default)]
    insight: Option<String>,
}

impl HttpRepository {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            endpoints: settings.endpoints.clone(),
        })
    }

    fn url(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        format!("{}{}", self.base_url, prepare_path(template, &vars))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} request failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url), what)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    async fn post_json<B: Serialize + Sync>(&self, url: &str, body: &B, what: &str) -> Result<reqwest::Response> {
        tracing::debug!("POST {}", url);
        self.send(self.client.post(url).json(body), what).await
    }
}

#[async_trait]
impl ReportRepository for HttpRepository {
    async fn list_reports(&self) -> Result<Vec<ReportSummary>> {
        let url = self.url(&self.endpoints.reports, &[]);
        self.get_json(&url, "reports list").await
    }

    async fn chart_configs(&self, report_id: &str) -> Result<Vec<ChartConfig>> {
        let url = self.url(&self.endpoints.chart_configs, &[("report_id", report_id)]);
        self.get_json(&url, "chart configs").await
    }

    async fn upload_detail(&self, upload_id: &str) -> Result<UploadDetail> {
        let url = self.url(&self.endpoints.upload_detail, &[("upload_id", upload_id)]);
        self.get_json(&url, "upload detail").await
    }

    async fn chart_data(&self, upload_id: &str, x_axis: &str, y_axis: &str) -> Result<RawSeries> {
        let url = format!(
            "{}?xAxis={}&yAxis={}",
            self.url(&self.endpoints.chart_data, &[("upload_id", upload_id)]),
            urlencoding::encode(x_axis),
            urlencoding::encode(y_axis)
        );
        self.get_json(&url, "chart data").await
    }

    async fn save_chart_config(&self, config: &SaveChartConfig) -> Result<()> {
        let url = self.url(&self.endpoints.save_chart_config, &[]);
        self.post_json(&url, config, "save chart config").await?;
        Ok(())
    }

    async fn log_event(&self, event: &AnalyticsEvent) -> Result<()> {
        let url = self.url(&self.endpoints.analytics_log, &[]);
        self.post_json(&url, event, "analytics log").await?;
        Ok(())
    }
}

#[async_trait]
impl InsightRepository for HttpRepository {
    async fn generate_insight(&self, request: &InsightRequest) -> Result<Option<String>> {
        let url = self.url(&self.endpoints.generate_insight, &[]);
        let response: InsightResponse = self
            .post_json(&url, request, "generate insight")
            .await?
            .json()
            .await
            .context("Failed to parse generate insight response")?;
        Ok(response.insight)
    }
}
