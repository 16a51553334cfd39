mod context;
mod disk;
mod traits;

pub use context::PassContext;
pub use disk::{
    DiskSampler, DiskSpaceMonitor, DiskThresholds, DiskUsage, SystemDiskSampler,
    DISK_SPACE_ERROR_CODE, DISK_SPACE_PROPERTY, DISK_SPACE_WARNING_CODE,
};
pub use traits::{Monitor, MonitorError};
