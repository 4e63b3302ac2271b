pub mod push;
pub mod radio;
pub mod selector;

pub use push::{establish_uplink, EventBus};
pub use radio::{RadioFramer, RadioOutcome};
pub use selector::{dispatch, DispatchOutcome};
