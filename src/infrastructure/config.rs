use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
    /// Upper bound on live sessions; the least recently used is evicted.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Sessions unused for this long are dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            notification_capacity: default_notification_capacity(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoints: EndpointSettings,
}

/// Collaborator endpoint paths. `${var}` placeholders are filled per request.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointSettings {
    pub reports: String,
    pub chart_configs: String,
    pub generate_insight: String,
    pub upload_detail: String,
    pub chart_data: String,
    pub save_chart_config: String,
    pub analytics_log: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            reports: "/api/analytics/reports".to_string(),
            chart_configs: "/api/chart-analytics/${report_id}".to_string(),
            generate_insight: "/api/insights/generate".to_string(),
            upload_detail: "/api/upload/${upload_id}".to_string(),
            chart_data: "/api/analytics/chart-data/${upload_id}".to_string(),
            save_chart_config: "/api/chart-analytics".to_string(),
            analytics_log: "/api/analytics/log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    /// Upper bound on waiting for an off-screen render to report completion.
    pub settle_delay_ms: u64,
    pub output_dir: PathBuf,
    pub pdf: PdfSettings,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            settle_delay_ms: 500,
            output_dir: PathBuf::from("exports"),
            pdf: PdfSettings::default(),
        }
    }
}

/// Page geometry and typography for composed PDFs (millimetres and points).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PdfSettings {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub section_gap_mm: f32,
    pub heading_font_pt: f32,
    pub body_font_pt: f32,
    pub line_spacing: f32,
    pub min_image_height_mm: f32,
}

impl Default for PdfSettings {
    fn default() -> Self {
        // A4 landscape
        Self {
            page_width_mm: 297.0,
            page_height_mm: 210.0,
            margin_mm: 14.0,
            section_gap_mm: 8.0,
            heading_font_pt: 18.0,
            body_font_pt: 12.0,
            line_spacing: 1.35,
            min_image_height_mm: 40.0,
        }
    }
}

/// Size of charts rendered for on-screen display.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_notification_capacity() -> usize {
    50
}

fn default_max_sessions() -> usize {
    256
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/report_studio").required(false))
        .add_source(config::Environment::with_prefix("REPORT_STUDIO").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in an endpoint path. Values are URL-encoded.
pub fn prepare_path(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}
