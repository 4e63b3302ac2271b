use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::screen::Screen;

/// Lifecycle state of a floor. Legacy/absent values deserialize straight to
/// `Active` via `#[serde(default)]` on `Floor::status`, below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorStatus {
    Active,
    Disabled,
    Maintenance,
}

impl Default for FloorStatus {
    fn default() -> Self {
        FloorStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Room,
    Hall,
    Door,
    Entrance,
    Exit,
    Junction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

/// Per-edge thresholds above which a hazard reading is considered to exceed
/// safe operating bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeThresholds {
    pub people: f64,
    pub fire: f64,
    pub smoke: f64,
}

/// The values most recently stamped onto an edge by AI fusion. Reset to zero
/// at the top of every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCurrent {
    pub people: f64,
    pub fire: f64,
    pub smoke: f64,
}

impl Default for EdgeCurrent {
    fn default() -> Self {
        EdgeCurrent {
            people: 0.0,
            fire: 0.0,
            smoke: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub weight: f64,
    pub thresholds: EdgeThresholds,
    #[serde(default)]
    pub current: EdgeCurrent,
}

/// Pixel-to-meter scale descriptor for a floor's map image. `None` (or any
/// zero dimension) means the scaler falls back to raw pixel distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScale {
    pub width_pixels: f64,
    pub height_pixels: f64,
    pub width_meters: f64,
    pub height_meters: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapImage {
    pub url: Option<String>,
    pub scale: Option<MapScale>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub floor_id: String,
    #[serde(default)]
    pub status: FloorStatus,
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub screens: Vec<Screen>,
    /// Legacy shape: some floor documents carry flat start-node ids here
    /// instead of a `screens` list. Only consulted when `screens` is empty.
    #[serde(default)]
    pub start_points: Vec<String>,
    pub exit_points: Vec<String>,
    #[serde(default)]
    pub map_image: Option<MapImage>,
}

impl Floor {
    pub fn is_active(&self) -> bool {
        matches!(self.status, FloorStatus::Active)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node ids to route from. Normalized `screens` take precedence; a
    /// floor persisted in the legacy shape (flat `startPoints`, no
    /// `screens` list at all) falls back to those ids directly.
    pub fn active_screen_node_ids(&self) -> Vec<String> {
        if !self.screens.is_empty() {
            return self
                .screens
                .iter()
                .filter(|s| s.is_active())
                .map(|s| s.node_id.clone())
                .collect();
        }
        self.start_points.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_floor_status_is_active() {
        assert_eq!(FloorStatus::default(), FloorStatus::Active);
    }

    #[test]
    fn floor_status_eq_ok() {
        assert_ne!(FloorStatus::Active, FloorStatus::Disabled);
    }

    #[test]
    fn legacy_start_points_resolve_when_screens_absent() {
        let raw = r#"{
            "floorId": "F1",
            "name": "Lobby",
            "nodes": [],
            "edges": [],
            "startPoints": ["N1", "N2"],
            "exitPoints": ["N3"]
        }"#;
        let floor: Floor = serde_json::from_str(raw).unwrap();
        assert!(floor.screens.is_empty());
        assert_eq!(floor.active_screen_node_ids(), vec!["N1".to_string(), "N2".to_string()]);
    }

    #[test]
    fn screens_take_precedence_over_legacy_start_points() {
        let raw = r#"{
            "floorId": "F1",
            "name": "Lobby",
            "nodes": [],
            "edges": [],
            "screens": [{"id": "S1", "nodeId": "N1", "name": "Screen 1", "status": "active"}],
            "startPoints": ["N2"],
            "exitPoints": ["N3"]
        }"#;
        let floor: Floor = serde_json::from_str(raw).unwrap();
        assert_eq!(floor.active_screen_node_ids(), vec!["N1".to_string()]);
    }
}
