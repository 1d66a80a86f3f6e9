// Report domain model
use super::chart::ChartConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report metadata as listed by the reports endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "originalName")]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub chart_configs: Vec<ChartConfig>,
}

impl Report {
    /// Charts without an id are keyed as `<report id>-<index>`.
    pub fn from_summary(summary: ReportSummary, chart_configs: Vec<ChartConfig>) -> Self {
        let chart_configs = chart_configs
            .into_iter()
            .enumerate()
            .map(|(index, mut chart)| {
                if chart.id.trim().is_empty() {
                    chart.id = format!("{}-{}", summary.id, index);
                }
                chart
            })
            .collect();

        Self {
            id: summary.id,
            display_name: summary.display_name,
            created_at: summary.created_at,
            chart_configs,
        }
    }

    pub fn chart(&self, chart_id: &str) -> Option<&ChartConfig> {
        self.chart_configs.iter().find(|c| c.id == chart_id)
    }
}
