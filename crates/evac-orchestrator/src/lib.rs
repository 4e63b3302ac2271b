pub mod config;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod pipeline;
pub mod scheduler;
pub mod state;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use kernel::OrchestratorKernel;
pub use state::AppState;
