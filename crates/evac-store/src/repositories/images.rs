use evac_models::ImageRecord;
use libsql::params;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

#[derive(Clone)]
pub struct ImageRepository {
    client: StoreClient,
}

impl ImageRepository {
    pub fn new(client: StoreClient) -> Self {
        ImageRepository { client }
    }

    #[instrument(skip(self, record))]
    pub async fn insert(&self, record: &ImageRecord) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let document = serde_json::to_string(record)?;
        conn.execute(
            "INSERT INTO image_records (id, floor_id, camera_id, edge_id, document_json, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET document_json = excluded.document_json",
            params![
                record.id.to_string(),
                record.floor_id.clone(),
                record.camera_id.clone(),
                record.edge_id.clone(),
                document,
                record.captured_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ImageRecord>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn.query("SELECT document_json FROM image_records", ()).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            records.push(serde_json::from_str(&raw)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_list_round_trips() {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        let repo = ImageRepository::new(client);
        let record = ImageRecord::new("F1".into(), "CAM1".into(), "E1".into(), "2026/01/01/F1/CAM1/1.jpg".into());
        repo.insert(&record).await.unwrap();
        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].camera_id, "CAM1");
    }
}
