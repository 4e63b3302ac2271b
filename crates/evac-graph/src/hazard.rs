use evac_models::{Edge, EdgeCurrent, EdgeThresholds};
use serde::{Deserialize, Serialize};

/// Tunable penalty/factor knobs for the weight function, overridable from
/// the environment variables named in the external interfaces section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    pub fire_pen: f64,
    pub smoke_pen: f64,
    pub people_pen: f64,
    pub people_factor: f64,
    pub fire_factor: f64,
    pub smoke_factor: f64,
    pub threshold_mult: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        WeightParams {
            fire_pen: 1000.0,
            smoke_pen: 500.0,
            people_pen: 2.0,
            people_factor: 0.5,
            fire_factor: 2.0,
            smoke_factor: 1.5,
            threshold_mult: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWeight {
    pub weight: f64,
    pub exceeds_threshold: bool,
    pub threshold_ratio: f64,
    pub distance_meters: f64,
}

/// Maps an edge's current hazard reading to a scalar edge cost. Pure,
/// deterministic and monotone nondecreasing in each of `current.people`,
/// `current.fire`, `current.smoke` by construction: both branches only ever
/// multiply the base cost by factors `>= 1` or add a nonnegative penalty.
pub fn edge_weight(edge: &Edge, distance_meters: f64, params: &WeightParams) -> EdgeWeight {
    let thresholds: EdgeThresholds = edge.thresholds;
    let current: EdgeCurrent = edge.current;

    let people_excess = (current.people - thresholds.people).max(0.0);
    let fire_excess = (current.fire - thresholds.fire).max(0.0);
    let smoke_excess = (current.smoke - thresholds.smoke).max(0.0);

    let exceeds = people_excess > 0.0 || fire_excess > 0.0 || smoke_excess > 0.0;

    let threshold_ratio = ratio(current.people, thresholds.people)
        .max(ratio(current.fire, thresholds.fire))
        .max(ratio(current.smoke, thresholds.smoke));

    let mut weight = distance_meters * edge.weight;

    if exceeds {
        weight *= 1.0 + threshold_ratio * params.threshold_mult;
        if fire_excess > 0.0 {
            weight *= 1.0 + fire_excess * params.fire_pen;
        }
        if smoke_excess > 0.0 {
            weight *= 1.0 + smoke_excess * params.smoke_pen;
        }
        weight += people_excess * params.people_pen;
    } else {
        weight *= 1.0 + ratio(current.people, thresholds.people) * params.people_factor;
        weight *= 1.0 + ratio(current.fire, thresholds.fire) * params.fire_factor;
        weight *= 1.0 + ratio(current.smoke, thresholds.smoke) * params.smoke_factor;
    }

    EdgeWeight {
        weight,
        exceeds_threshold: exceeds,
        threshold_ratio,
        distance_meters,
    }
}

fn ratio(value: f64, threshold: f64) -> f64 {
    if threshold > 0.0 {
        value / threshold
    } else {
        0.0
    }
}
