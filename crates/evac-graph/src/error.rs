use thiserror::Error;

/// Classification for the graph-shaped failures `shortest_paths` detects.
/// Per §4.3/§7 none of these abort a run: the affected start (or edge) is
/// skipped and logged, and `shortest_paths` returns every occurrence in
/// `DijkstraOutput::errors` for the caller to inspect or log further.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("[GRAPH_UNKNOWN_START]: start node not present in floor graph: {0}")]
    UnknownStart(String),

    #[error("[GRAPH_DANGLING_EDGE]: edge {edge_id} references unknown node {node_id}")]
    DanglingEdgeEndpoint { edge_id: String, node_id: String },

    #[error("[GRAPH_NO_EXITS]: floor has no exit points configured")]
    NoExits,
}
