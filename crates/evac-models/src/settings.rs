use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    InProgress,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSync {
    pub enabled: bool,
    /// Stored and transmitted as-is, not validated on write. The
    /// replication loop clamps this to `[1, 168]` itself on every poll
    /// before computing its fire interval; a second consumer of this
    /// field must clamp it too rather than trust it to already be in range.
    pub interval_hours: u32,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sync_status: Option<SyncStatus>,
    #[serde(default)]
    pub last_sync_error: Option<String>,
    #[serde(default)]
    pub last_sync_duration_ms: Option<i64>,
}

impl Default for CloudSync {
    fn default() -> Self {
        CloudSync {
            enabled: false,
            interval_hours: 24,
            last_sync_at: None,
            last_sync_status: None,
            last_sync_error: None,
            last_sync_duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProcessing {
    pub enabled: bool,
    #[serde(default)]
    pub disabled_reason: Option<String>,
    #[serde(default)]
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled_by: Option<String>,
}

impl Default for CloudProcessing {
    fn default() -> Self {
        CloudProcessing {
            enabled: true,
            disabled_reason: None,
            disabled_at: None,
            disabled_by: None,
        }
    }
}

/// Singleton settings document. Read once per pipeline cycle and watched
/// for changes by the replicator between its own cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub cloud_sync: CloudSync,
    pub cloud_processing: CloudProcessing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_error_fallback() {
        // §7 ConfigError: "the cycle assumes defaults (cloud processing on,
        // cloud sync off) and continues."
        let s = Settings::default();
        assert!(s.cloud_processing.enabled);
        assert!(!s.cloud_sync.enabled);
    }
}
