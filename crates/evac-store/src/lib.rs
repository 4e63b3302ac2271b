//! Local persistence (libSQL) for floors, image records, route documents
//! and settings, plus the independent cloud replicator.

pub mod client;
pub mod errors;
pub mod replication;
pub mod repositories;
pub mod schema;

pub use client::StoreClient;
pub use errors::StoreError;
pub use replication::{spawn_replication_loop, CloudReplicator, ReplicationSummary};
pub use repositories::{FloorRepository, ImageRepository, RouteRepository, SettingsRepository};
