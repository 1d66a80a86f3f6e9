// Notification domain model - non-blocking user-visible signals
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Loading,
    Success,
    Error,
}

/// A notification keyed so later updates (loading -> success) replace earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub key: String,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(key: impl Into<String>, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
