use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One captured-and-fused frame. Written once per camera per cycle; never
/// mutated after the fusion step stamps `processed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Uuid,
    pub floor_id: String,
    pub camera_id: String,
    pub edge_id: String,
    /// Portable path relative to the local storage root, as returned by the
    /// storage placer.
    pub local_path: String,
    #[serde(default)]
    pub cloud_url: Option<String>,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub people_count: f64,
    #[serde(default)]
    pub fire_prob: f64,
    #[serde(default)]
    pub smoke_prob: f64,
}

impl ImageRecord {
    pub fn new(floor_id: String, camera_id: String, edge_id: String, local_path: String) -> Self {
        ImageRecord {
            id: Uuid::new_v4(),
            floor_id,
            camera_id,
            edge_id,
            local_path,
            cloud_url: None,
            captured_at: Utc::now(),
            processed: false,
            people_count: 0.0,
            fire_prob: 0.0,
            smoke_prob: 0.0,
        }
    }
}
