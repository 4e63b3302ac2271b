use evac_models::Settings;
use libsql::params;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

const SETTINGS_KEY: &str = "singleton";

#[derive(Clone)]
pub struct SettingsRepository {
    client: StoreClient,
}

impl SettingsRepository {
    pub fn new(client: StoreClient) -> Self {
        SettingsRepository { client }
    }

    /// Returns the defaults from §7's `ConfigError` fallback (cloud
    /// processing on, cloud sync off) when no row has ever been written.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Settings, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT document_json FROM settings WHERE key = ?1", params![SETTINGS_KEY])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Settings::default()),
        }
    }

    #[instrument(skip(self, settings))]
    pub async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let raw = serde_json::to_string(settings)?;
        conn.execute(
            "INSERT INTO settings (key, document_json, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET document_json = excluded.document_json,
                updated_at = CURRENT_TIMESTAMP",
            params![SETTINGS_KEY, raw],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_without_prior_save_returns_config_error_defaults() {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        let repo = SettingsRepository::new(client);
        let settings = repo.get().await.unwrap();
        assert!(settings.cloud_processing.enabled);
        assert!(!settings.cloud_sync.enabled);
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        let repo = SettingsRepository::new(client);
        let mut settings = Settings::default();
        settings.cloud_sync.enabled = true;
        settings.cloud_sync.interval_hours = 6;
        repo.save(&settings).await.unwrap();
        let fetched = repo.get().await.unwrap();
        assert!(fetched.cloud_sync.enabled);
        assert_eq!(fetched.cloud_sync.interval_hours, 6);
    }
}
