use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::route::{HazardLevel, ScreenRoute};

/// The wire record pushed to displays and framed for radio. Field order and
/// names follow the external contract in §6 verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub floor_id: String,
    pub floor_name: String,
    pub routes: Vec<ScreenRoute>,
    pub emergency: bool,
    pub overall_hazard_level: HazardLevel,
    pub timestamp: DateTime<Utc>,
    pub total_routes: usize,
}

impl Envelope {
    pub fn new(floor_id: String, floor_name: String, routes: Vec<ScreenRoute>) -> Self {
        let emergency = routes.iter().any(|r| r.exceeds_thresholds);
        let overall_hazard_level = routes
            .iter()
            .map(|r| r.hazard_level)
            .max()
            .unwrap_or(HazardLevel::Safe);
        let total_routes = routes.len();
        Envelope {
            floor_id,
            floor_name,
            routes,
            emergency,
            overall_hazard_level,
            timestamp: Utc::now(),
            total_routes,
        }
    }
}

/// Confirmation payload sent to a subscriber once its `{floorId}` join
/// request has been validated against the floor store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationConfirmed {
    pub floor_id: String,
    pub floor_name: String,
    pub start_points: Vec<String>,
    pub exit_points: Vec<String>,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationError {
    pub message: String,
    pub ts: DateTime<Utc>,
}

/// Events the dispatch layer pushes through the room-based pub/sub. The
/// room name for a targeted send is always `floor:{floorId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum PushEvent {
    #[serde(rename = "floor-routes")]
    FloorRoutes(Envelope),
    /// Legacy global broadcast; new clients should ignore it. Kept for
    /// compatibility per the design notes' double-emission guidance.
    #[serde(rename = "route_update")]
    RouteUpdate(Envelope),
    #[serde(rename = "registration_confirmed")]
    RegistrationConfirmed(RegistrationConfirmed),
    #[serde(rename = "registration_error")]
    RegistrationError(RegistrationError),
}
