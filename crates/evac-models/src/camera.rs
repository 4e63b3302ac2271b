use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `Error` is reserved for system-driven auto-disable (see the health
/// tracker). Only an operator may set `Disabled`/`Maintenance` or clear
/// `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Active,
    Disabled,
    Maintenance,
    Error,
}

impl Default for CameraStatus {
    fn default() -> Self {
        CameraStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: String,
    pub edge_id: String,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub status: CameraStatus,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled_reason: Option<String>,
    #[serde(default)]
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled_by: Option<String>,
}

impl Camera {
    pub fn is_active(&self) -> bool {
        matches!(self.status, CameraStatus::Active)
    }

    /// Resolves the URL to poll for a frame, substituting `{cameraId}` into
    /// the configured template when no explicit `stream_url` is set.
    pub fn resolve_stream_url(&self, template: &str) -> String {
        match &self.stream_url {
            Some(url) => url.clone(),
            None => template.replace("{cameraId}", &self.id),
        }
    }
}
