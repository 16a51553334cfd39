mod engine;
mod observation;
mod outcome;

pub use engine::{
    Reconciler, ReconcilerSettings, MONITOR_FAILURE_CODE, MONITOR_HEALTH_PROPERTY,
};
pub use observation::Observation;
pub use outcome::Outcome;
