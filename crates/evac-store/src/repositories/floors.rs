use evac_models::{Floor, FloorStatus};
use libsql::params;
use tracing::instrument;

use crate::client::StoreClient;
use crate::errors::StoreError;

#[derive(Clone)]
pub struct FloorRepository {
    client: StoreClient,
}

impl FloorRepository {
    pub fn new(client: StoreClient) -> Self {
        FloorRepository { client }
    }

    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Floor>, StoreError> {
        let floors = self.list_all().await?;
        Ok(floors.into_iter().filter(|f| f.is_active()).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Floor>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn.query("SELECT document_json FROM floors", ()).await?;
        let mut floors = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            floors.push(serde_json::from_str(&raw)?);
        }
        Ok(floors)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, floor_id: &str) -> Result<Option<Floor>, StoreError> {
        let conn = self.client.connection()?;
        let mut rows = conn
            .query("SELECT document_json FROM floors WHERE id = ?1", params![floor_id])
            .await?;
        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, floor))]
    pub async fn save(&self, floor: &Floor) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let document = serde_json::to_string(floor)?;
        let status = match floor.status {
            FloorStatus::Active => "active",
            FloorStatus::Disabled => "disabled",
            FloorStatus::Maintenance => "maintenance",
        };
        conn.execute(
            "INSERT INTO floors (id, status, document_json, updated_at)
             VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status,
                document_json = excluded.document_json, updated_at = CURRENT_TIMESTAMP",
            params![floor.floor_id.clone(), status, document],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evac_models::{Edge, EdgeCurrent, EdgeThresholds, Node, NodeType};

    async fn test_repo() -> FloorRepository {
        let client = StoreClient::connect(":memory:", None).await.unwrap();
        FloorRepository::new(client)
    }

    fn sample_floor(id: &str) -> Floor {
        Floor {
            floor_id: id.to_string(),
            status: FloorStatus::Active,
            name: "Test Floor".into(),
            nodes: vec![
                Node {
                    id: "A".into(),
                    x: 0.0,
                    y: 0.0,
                    node_type: NodeType::Room,
                },
                Node {
                    id: "B".into(),
                    x: 10.0,
                    y: 0.0,
                    node_type: NodeType::Exit,
                },
            ],
            edges: vec![Edge {
                id: "E1".into(),
                from: "A".into(),
                to: "B".into(),
                weight: 1.0,
                thresholds: EdgeThresholds {
                    people: 10.0,
                    fire: 0.7,
                    smoke: 0.6,
                },
                current: EdgeCurrent::default(),
            }],
            cameras: vec![],
            screens: vec![],
            start_points: vec![],
            exit_points: vec!["B".into()],
            map_image: None,
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let repo = test_repo().await;
        let floor = sample_floor("F1");
        repo.save(&floor).await.unwrap();
        let fetched = repo.get("F1").await.unwrap().expect("floor should exist");
        assert_eq!(fetched.floor_id, "F1");
        assert_eq!(fetched.edges.len(), 1);
    }

    #[tokio::test]
    async fn list_active_excludes_disabled() {
        let repo = test_repo().await;
        let mut disabled = sample_floor("F2");
        disabled.status = FloorStatus::Disabled;
        repo.save(&sample_floor("F1")).await.unwrap();
        repo.save(&disabled).await.unwrap();
        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].floor_id, "F1");
    }

    #[tokio::test]
    async fn save_upserts_existing_floor() {
        let repo = test_repo().await;
        let mut floor = sample_floor("F1");
        repo.save(&floor).await.unwrap();
        floor.edges[0].current.fire = 0.9;
        repo.save(&floor).await.unwrap();
        let fetched = repo.get("F1").await.unwrap().unwrap();
        assert!((fetched.edges[0].current.fire - 0.9).abs() < 1e-9);
    }
}
