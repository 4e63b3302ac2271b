use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use evac_models::{Edge, EdgeHazardDetail, HazardLevel, MapScale, Node, ScreenRoute};
use tracing::warn;

use crate::error::GraphError;
use crate::hazard::{edge_weight, WeightParams};
use crate::scale::distance_meters;

/// The graph snapshot a per-floor cycle builds once per tick: nodes plus
/// edges carrying whatever hazard state the AI fusion step just stamped on
/// them, and the floor's scale descriptor.
#[derive(Debug, Clone)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub scale: Option<MapScale>,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteTiming {
    pub duration_micros: u128,
}

/// Per-start route records plus a `_timing` side-channel: one entry per
/// start, present even for starts that were skipped. `errors` is a
/// non-fatal side-channel: per §4.3/§7 these never abort the run, but a
/// caller may want to inspect what was skipped and why.
#[derive(Debug, Clone)]
pub struct DijkstraOutput {
    pub routes: Vec<ScreenRoute>,
    pub timing: HashMap<String, RouteTiming>,
    pub errors: Vec<GraphError>,
}

struct ComputedEdge {
    id: String,
    from: String,
    to: String,
    weight: f64,
    distance_meters: f64,
    fire: f64,
    smoke: f64,
    people: f64,
    fire_threshold: f64,
    smoke_threshold: f64,
}

struct HeapEntry {
    dist: f64,
    node: String,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.node == other.node
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the smallest distance.
        other.dist.total_cmp(&self.dist).then_with(|| self.node.cmp(&other.node))
    }
}

fn ratio(value: f64, threshold: f64) -> f64 {
    if threshold > 0.0 {
        value / threshold
    } else {
        0.0
    }
}

/// Single-source multi-target shortest path from every start over the
/// shared exit set, with early termination, path reconstruction and
/// per-route hazard classification. See the per-floor cycle for how the
/// graph view is assembled each tick.
pub fn shortest_paths(
    graph: &GraphView,
    starts: &[String],
    exits: &HashSet<String>,
    params: &WeightParams,
) -> DijkstraOutput {
    let mut errors = Vec::new();

    if starts.is_empty() || exits.is_empty() {
        if exits.is_empty() {
            let err = GraphError::NoExits;
            warn!(error = %err, "dijkstra invoked with no exits; returning empty route list");
            errors.push(err);
        } else {
            warn!("dijkstra invoked with no starts; returning empty route list");
        }
        return DijkstraOutput {
            routes: Vec::new(),
            timing: HashMap::new(),
            errors,
        };
    }

    let node_lookup: HashMap<&str, &Node> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let computed_edges: Vec<ComputedEdge> = graph
        .edges
        .iter()
        .map(|e| {
            let dm = match (node_lookup.get(e.from.as_str()), node_lookup.get(e.to.as_str())) {
                (Some(a), Some(b)) => distance_meters(a.x, a.y, b.x, b.y, graph.scale.as_ref()),
                _ => {
                    let missing = if !node_lookup.contains_key(e.from.as_str()) {
                        e.from.clone()
                    } else {
                        e.to.clone()
                    };
                    let err = GraphError::DanglingEdgeEndpoint {
                        edge_id: e.id.clone(),
                        node_id: missing,
                    };
                    warn!(error = %err, "treating distance as zero");
                    errors.push(err);
                    0.0
                }
            };
            let w = edge_weight(e, dm, params);
            ComputedEdge {
                id: e.id.clone(),
                from: e.from.clone(),
                to: e.to.clone(),
                weight: w.weight,
                distance_meters: dm,
                fire: e.current.fire,
                smoke: e.current.smoke,
                people: e.current.people,
                fire_threshold: e.thresholds.fire,
                smoke_threshold: e.thresholds.smoke,
            }
        })
        .collect();

    let mut adjacency: HashMap<&str, Vec<&ComputedEdge>> = HashMap::new();
    for ce in &computed_edges {
        adjacency.entry(ce.from.as_str()).or_default().push(ce);
        adjacency.entry(ce.to.as_str()).or_default().push(ce);
    }
    let edge_by_id: HashMap<&str, &ComputedEdge> = computed_edges.iter().map(|ce| (ce.id.as_str(), ce)).collect();

    let mut routes = Vec::new();
    let mut timing = HashMap::new();

    for start in starts {
        let t0 = Instant::now();

        if !node_lookup.contains_key(start.as_str()) {
            let err = GraphError::UnknownStart(start.clone());
            warn!(error = %err, "skipping");
            errors.push(err);
            continue;
        }

        let mut dist: HashMap<String, f64> = HashMap::new();
        let mut prev: HashMap<String, (String, String)> = HashMap::new();
        let mut heap = BinaryHeap::new();
        dist.insert(start.clone(), 0.0);
        heap.push(HeapEntry {
            dist: 0.0,
            node: start.clone(),
        });

        let mut winning_exit: Option<String> = None;

        while let Some(HeapEntry { dist: d, node }) = heap.pop() {
            if let Some(&best) = dist.get(&node) {
                if d > best {
                    continue;
                }
            }
            if exits.contains(&node) {
                winning_exit = Some(node);
                break;
            }
            if let Some(neighbors) = adjacency.get(node.as_str()) {
                for ce in neighbors {
                    let other = if ce.from == node { ce.to.clone() } else { ce.from.clone() };
                    let candidate = d + ce.weight;
                    let better = dist.get(&other).map_or(true, |&cur| candidate < cur);
                    if better {
                        dist.insert(other.clone(), candidate);
                        prev.insert(other.clone(), (node.clone(), ce.id.clone()));
                        heap.push(HeapEntry {
                            dist: candidate,
                            node: other,
                        });
                    }
                }
            }
        }

        timing.insert(
            start.clone(),
            RouteTiming {
                duration_micros: t0.elapsed().as_micros(),
            },
        );

        let exit_node = match winning_exit {
            Some(e) => e,
            None => {
                warn!(start = %start, "no reachable exit; skipping");
                continue;
            }
        };

        let mut path_nodes = vec![exit_node.clone()];
        let mut path_edges = Vec::new();
        let mut cursor = exit_node.clone();
        while cursor != *start {
            match prev.get(&cursor) {
                Some((p, edge_id)) => {
                    path_edges.push(edge_id.clone());
                    path_nodes.push(p.clone());
                    cursor = p.clone();
                }
                None => break,
            }
        }
        path_nodes.reverse();
        path_edges.reverse();

        let distance = *dist.get(&exit_node).unwrap_or(&0.0);

        let mut distance_meters_sum = 0.0;
        let mut edge_hazards = Vec::new();
        let mut exceeds_thresholds = false;
        let mut max_hazard_ratio: f64 = 0.0;

        for edge_id in &path_edges {
            if let Some(ce) = edge_by_id.get(edge_id.as_str()) {
                distance_meters_sum += ce.distance_meters;
                if ce.fire > ce.fire_threshold || ce.smoke > ce.smoke_threshold {
                    exceeds_thresholds = true;
                }
                let r = ratio(ce.fire, ce.fire_threshold).max(ratio(ce.smoke, ce.smoke_threshold));
                if r > max_hazard_ratio {
                    max_hazard_ratio = r;
                }
                edge_hazards.push(EdgeHazardDetail {
                    edge_id: ce.id.clone(),
                    fire: ce.fire,
                    smoke: ce.smoke,
                    people: ce.people,
                });
            }
        }

        // §4.3: classified only by fire/smoke, not by people count.
        let hazard_level = if max_hazard_ratio >= 1.0 {
            HazardLevel::Critical
        } else if max_hazard_ratio >= 0.7 {
            HazardLevel::Moderate
        } else {
            HazardLevel::Safe
        };

        routes.push(ScreenRoute {
            start_node: start.clone(),
            exit_node,
            path: path_nodes,
            edges: path_edges,
            distance,
            distance_meters: distance_meters_sum,
            hazard_level,
            exceeds_thresholds,
            edge_hazards,
        });
    }

    DijkstraOutput { routes, timing, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evac_models::{EdgeCurrent, EdgeThresholds, NodeType};

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: id.into(),
            x,
            y,
            node_type: NodeType::Room,
        }
    }

    fn edge(id: &str, from: &str, to: &str, fire: f64, smoke: f64) -> Edge {
        Edge {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            weight: 1.0,
            thresholds: EdgeThresholds {
                people: 10.0,
                fire: 0.7,
                smoke: 0.6,
            },
            current: EdgeCurrent {
                people: 0.0,
                fire,
                smoke,
            },
        }
    }

    // S1: two-node graph A-B, B is the exit.
    #[test]
    fn s1_safe_direct_route() {
        let graph = GraphView {
            nodes: vec![node("A", 0.0, 0.0), node("B", 10.0, 0.0)],
            edges: vec![edge("E1", "A", "B", 0.0, 0.0)],
            scale: None,
        };
        let exits: HashSet<String> = ["B".to_string()].into_iter().collect();
        let out = shortest_paths(&graph, &["A".to_string()], &exits, &WeightParams::default());
        assert_eq!(out.routes.len(), 1);
        let r = &out.routes[0];
        assert_eq!(r.start_node, "A");
        assert_eq!(r.exit_node, "B");
        assert_eq!(r.path, vec!["A".to_string(), "B".to_string()]);
        assert!((r.distance_meters - 10.0).abs() < 1e-6);
        assert_eq!(r.hazard_level, HazardLevel::Safe);
        assert!(!r.exceeds_thresholds);
    }

    // S2: A-B-E and A-C-E, A-B on fire; expect the A-C-E detour.
    #[test]
    fn s2_avoids_fire_edge() {
        let graph = GraphView {
            nodes: vec![
                node("A", 0.0, 0.0),
                node("B", 10.0, 0.0),
                node("C", 0.0, 10.0),
                node("E", 10.0, 10.0),
            ],
            edges: vec![
                edge("AB", "A", "B", 0.9, 0.0),
                edge("BE", "B", "E", 0.0, 0.0),
                edge("AC", "A", "C", 0.0, 0.0),
                edge("CE", "C", "E", 0.0, 0.0),
            ],
            scale: None,
        };
        let exits: HashSet<String> = ["E".to_string()].into_iter().collect();
        let out = shortest_paths(&graph, &["A".to_string()], &exits, &WeightParams::default());
        let r = &out.routes[0];
        assert_eq!(r.path, vec!["A".to_string(), "C".to_string(), "E".to_string()]);
        assert_eq!(r.hazard_level, HazardLevel::Safe);
        assert!(!r.exceeds_thresholds);
    }

    // S3: both detours on fire/smoke; every route is critical.
    #[test]
    fn s3_no_safe_route_is_critical() {
        let graph = GraphView {
            nodes: vec![
                node("A", 0.0, 0.0),
                node("B", 10.0, 0.0),
                node("C", 0.0, 10.0),
                node("E", 10.0, 10.0),
            ],
            edges: vec![
                edge("AB", "A", "B", 0.9, 0.0),
                edge("BE", "B", "E", 0.0, 0.0),
                edge("AC", "A", "C", 0.9, 0.8),
                edge("CE", "C", "E", 0.0, 0.0),
            ],
            scale: None,
        };
        let exits: HashSet<String> = ["E".to_string()].into_iter().collect();
        let out = shortest_paths(&graph, &["A".to_string()], &exits, &WeightParams::default());
        let r = &out.routes[0];
        assert_eq!(r.hazard_level, HazardLevel::Critical);
        assert!(r.exceeds_thresholds);
    }

    #[test]
    fn unreachable_start_is_skipped_not_fatal() {
        let graph = GraphView {
            nodes: vec![node("A", 0.0, 0.0), node("B", 10.0, 0.0), node("Z", 999.0, 999.0)],
            edges: vec![edge("AB", "A", "B", 0.0, 0.0)],
            scale: None,
        };
        let exits: HashSet<String> = ["B".to_string()].into_iter().collect();
        let out = shortest_paths(
            &graph,
            &["A".to_string(), "Z".to_string()],
            &exits,
            &WeightParams::default(),
        );
        assert_eq!(out.routes.len(), 1);
        assert_eq!(out.routes[0].start_node, "A");
        assert!(matches!(out.errors.as_slice(), [GraphError::UnknownStart(s)] if s == "Z"));
    }

    #[test]
    fn empty_starts_or_exits_yields_no_routes() {
        let graph = GraphView {
            nodes: vec![node("A", 0.0, 0.0)],
            edges: vec![],
            scale: None,
        };
        let exits: HashSet<String> = HashSet::new();
        let out = shortest_paths(&graph, &["A".to_string()], &exits, &WeightParams::default());
        assert!(out.routes.is_empty());
        assert!(matches!(out.errors.as_slice(), [GraphError::NoExits]));
    }

    #[test]
    fn dangling_edge_endpoint_is_reported_and_treated_as_zero_distance() {
        let graph = GraphView {
            nodes: vec![node("A", 0.0, 0.0), node("B", 10.0, 0.0)],
            edges: vec![edge("AB", "A", "GHOST", 0.0, 0.0), edge("GB", "GHOST", "B", 0.0, 0.0)],
            scale: None,
        };
        let exits: HashSet<String> = ["B".to_string()].into_iter().collect();
        let out = shortest_paths(&graph, &["A".to_string()], &exits, &WeightParams::default());
        let dangling: Vec<&GraphError> = out
            .errors
            .iter()
            .filter(|e| matches!(e, GraphError::DanglingEdgeEndpoint { .. }))
            .collect();
        assert_eq!(dangling.len(), 2);
    }
}
