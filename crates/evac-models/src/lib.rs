//! Shared domain entities and wire DTOs for the evacuation backend. No
//! behavior lives here beyond small derivations (e.g. `Envelope::new`); the
//! pipeline, graph engine and store crates own all of the logic that acts
//! on these types.

pub mod camera;
pub mod events;
pub mod floor;
pub mod image_record;
pub mod route;
pub mod screen;
pub mod settings;

pub use camera::{Camera, CameraStatus};
pub use events::{Envelope, PushEvent, RegistrationConfirmed, RegistrationError};
pub use floor::{Edge, EdgeCurrent, EdgeThresholds, Floor, FloorStatus, MapImage, MapScale, Node, NodeType};
pub use image_record::ImageRecord;
pub use route::{EdgeHazardDetail, HazardLevel, RouteDocument, ScreenRoute};
pub use screen::{Screen, ScreenStatus};
pub use settings::{CloudProcessing, CloudSync, Settings, SyncStatus};
