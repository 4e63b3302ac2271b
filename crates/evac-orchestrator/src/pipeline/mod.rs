pub mod acquire;
pub mod cycle;
pub mod fuser;
pub mod health;
pub mod storage;

pub use acquire::{acquire_frame, FrameSource, HttpFrameSource};
pub use cycle::{run_floor_cycle, CycleCollaborators};
pub use fuser::{fuse_hazard_readings, DetectorFields, DetectorRequest, FusedSnapshot, HazardDetector, HttpHazardDetector};
pub use health::{record_failure, record_success};
pub use storage::{place_frame, upload_frame, CloudUploader, HttpCloudUploader, PlacedFrame, UploadResult};
