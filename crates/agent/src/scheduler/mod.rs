mod jitter;
mod task;

pub use jitter::spread_interval;
pub use task::MonitorTask;
