use evac_models::RouteDocument;
use libsql::params;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

/// One row per floor: the route document is append-only in spirit
/// (immutable once computed) but the store only needs the latest per
/// floor, so writes upsert on `floor_id`.
#[derive(Clone)]
pub struct RouteRepository {
    client: StoreClient,
}

impl RouteRepository {
    pub fn new(client: StoreClient) -> Self {
        RouteRepository { client }
    }

    #[instrument(skip(self, document))]
    pub async fn save(&self, document: &RouteDocument) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let raw = serde_json::to_string(document)?;
        conn.execute(
            "INSERT INTO routes (floor_id, document_json, computed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(floor_id) DO UPDATE SET document_json = excluded.document_json,
                computed_at = excluded.computed_at",
            params![document.floor_id.clone(), raw, document.computed_at.to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn latest(&self, floor_id: &str) -> Result<Option<RouteDocument>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT document_json FROM routes WHERE floor_id = ?1", params![floor_id])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<RouteDocument>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn.query("SELECT document_json FROM routes", ()).await?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            docs.push(serde_json::from_str(&raw)?);
        }
        Ok(docs)
    }
}
