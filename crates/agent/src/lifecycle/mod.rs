mod controller;
mod error;
mod state;

pub use controller::MonitorController;
pub use error::LifecycleError;
pub use state::{MonitorRegistration, MonitorSettings, MonitorState};
