//! Pure graph math for evacuation routing: pixel-to-meter distance scaling,
//! the hazard-weighted edge cost function, and a single-source
//! multi-target Dijkstra engine. Nothing here touches I/O; the
//! orchestrator crate owns building a `GraphView` from the floor store and
//! persisting whatever comes back.

pub mod dijkstra;
pub mod error;
pub mod hazard;
pub mod scale;

pub use dijkstra::{shortest_paths, DijkstraOutput, GraphView, RouteTiming};
pub use error::GraphError;
pub use hazard::{edge_weight, EdgeWeight, WeightParams};
pub use scale::distance_meters;
