// Upload domain models - spreadsheet metadata used to (re)generate charts
use serde::{Deserialize, Serialize};

const PREVIEW_ROWS: usize = 5;
const PREVIEW_COLUMNS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default)]
    pub total_columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDetail {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "originalName")]
    pub display_name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub sheet_data: Option<SheetData>,
}

/// The first rows and columns of an upload, stringified for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub truncated: bool,
}

impl UploadDetail {
    /// First column on X, second on Y, when at least two columns exist.
    pub fn default_axes(&self) -> Option<(String, String)> {
        match self.columns.as_slice() {
            [x, y, ..] => Some((x.name.clone(), y.name.clone())),
            _ => None,
        }
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.column_type == "number")
    }

    pub fn preview(&self) -> DataPreview {
        let sheet = self.sheet_data.clone().unwrap_or_default();
        let headers = sheet.headers.iter().take(PREVIEW_COLUMNS).cloned().collect();
        let rows = sheet
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|row| row.iter().take(PREVIEW_COLUMNS).map(cell_text).collect())
            .collect();

        DataPreview {
            headers,
            rows,
            total_rows: sheet.rows.len(),
            truncated: sheet.rows.len() > PREVIEW_ROWS,
        }
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Usage event recorded by the analytics log endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub upload_id: String,
    pub action: String,
    pub details: serde_json::Value,
}
