use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-valued in practice: `High` is part of the persisted vocabulary but
/// is unreachable from the current classifier (`<0.7 safe, [0.7,1.0) moderate,
/// >=1.0 critical`) — see the open question in the design notes. The `Ord`
/// derive relies on declaration order, so keep this list sorted
/// `Safe < Moderate < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardLevel {
    Safe,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeHazardDetail {
    pub edge_id: String,
    pub fire: f64,
    pub smoke: f64,
    pub people: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRoute {
    pub start_node: String,
    pub exit_node: String,
    pub path: Vec<String>,
    pub edges: Vec<String>,
    pub distance: f64,
    pub distance_meters: f64,
    pub hazard_level: HazardLevel,
    pub exceeds_thresholds: bool,
    pub edge_hazards: Vec<EdgeHazardDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocument {
    pub floor_id: String,
    pub computed_at: DateTime<Utc>,
    pub routes: Vec<ScreenRoute>,
    pub emergency: bool,
    pub overall_hazard_level: HazardLevel,
}

impl RouteDocument {
    /// `safe` when there are no routes at all — an empty screens/exits
    /// cycle never reaches this constructor per the boundary behavior in
    /// §8, but the fallback keeps the type total.
    pub fn overall_level(routes: &[ScreenRoute]) -> HazardLevel {
        routes
            .iter()
            .map(|r| r.hazard_level)
            .max()
            .unwrap_or(HazardLevel::Safe)
    }

    pub fn is_emergency(routes: &[ScreenRoute]) -> bool {
        routes.iter().any(|r| r.exceeds_thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_level_ordering() {
        assert!(HazardLevel::Safe < HazardLevel::Moderate);
        assert!(HazardLevel::Moderate < HazardLevel::High);
        assert!(HazardLevel::High < HazardLevel::Critical);
    }

    #[test]
    fn overall_level_of_no_routes_is_safe() {
        assert_eq!(RouteDocument::overall_level(&[]), HazardLevel::Safe);
    }
}
