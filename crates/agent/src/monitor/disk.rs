use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use sysinfo::Disks;

use super::context::PassContext;
use super::traits::{Monitor, MonitorError};
use vigil_common::{normalize, EntityKind, EntityRef};

pub const DISK_SPACE_PROPERTY: &str = "DiskSpacePercent";
pub const DISK_SPACE_WARNING_CODE: &str = "DiskSpaceWarn";
pub const DISK_SPACE_ERROR_CODE: &str = "DiskSpaceError";

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    pub fn used_percent(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        Some(used as f64 / self.total_bytes as f64 * 100.0)
    }
}

pub trait DiskSampler: Send + Sync {
    fn sample(&self) -> Result<Vec<DiskUsage>, MonitorError>;
}

#[derive(Debug, Default)]
pub struct SystemDiskSampler;

impl DiskSampler for SystemDiskSampler {
    fn sample(&self) -> Result<Vec<DiskUsage>, MonitorError> {
        let disks = Disks::new_with_refreshed_list();
        let usage: Vec<DiskUsage> = disks
            .iter()
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();
        if usage.is_empty() {
            return Err(MonitorError::Sample("no mounted disks found".into()));
        }
        Ok(usage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskThresholds {
    pub warning_percent: f64,
    pub error_percent: f64,
}

impl Default for DiskThresholds {
    fn default() -> Self {
        Self {
            warning_percent: 85.0,
            error_percent: 95.0,
        }
    }
}

/// Reports `DiskSpacePercent` per mounted disk.
pub struct DiskSpaceMonitor {
    source_id: String,
    thresholds: DiskThresholds,
    sampler: Arc<dyn DiskSampler>,
}

impl DiskSpaceMonitor {
    pub fn new(source_id: impl Into<String>, thresholds: DiskThresholds) -> Self {
        Self::with_sampler(source_id, thresholds, Arc::new(SystemDiskSampler))
    }

    pub fn with_sampler(
        source_id: impl Into<String>,
        thresholds: DiskThresholds,
        sampler: Arc<dyn DiskSampler>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            thresholds,
            sampler,
        }
    }

    async fn evaluate_disk(&self, ctx: PassContext, usage: DiskUsage) -> Result<(), MonitorError> {
        let Some(percent) = usage.used_percent() else {
            return Ok(());
        };
        let entity = EntityRef::disk(usage.mount_point.clone());
        let message = format!("{} is {percent:.1}% full", usage.mount_point);

        if percent >= self.thresholds.error_percent {
            ctx.error(entity, DISK_SPACE_PROPERTY, DISK_SPACE_ERROR_CODE, message)
                .await?;
        } else if percent >= self.thresholds.warning_percent {
            ctx.warning(entity, DISK_SPACE_PROPERTY, DISK_SPACE_WARNING_CODE, message)
                .await?;
        } else {
            ctx.ok(entity, DISK_SPACE_PROPERTY, message).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Monitor for DiskSpaceMonitor {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn run_pass(&self, ctx: PassContext) -> Result<(), MonitorError> {
        let sampler = self.sampler.clone();
        let disks = tokio::task::spawn_blocking(move || sampler.sample())
            .await
            .map_err(|e| MonitorError::Sample(format!("disk sampler task failed: {e}")))??;

        let mut seen = HashSet::new();
        for usage in &disks {
            if let Ok(entity) = normalize(&EntityRef::disk(usage.mount_point.clone())) {
                seen.insert(entity);
            }
        }

        let results = join_all(
            disks
                .into_iter()
                .map(|usage| self.evaluate_disk(ctx.clone(), usage)),
        )
        .await;
        let mut first_error = results.into_iter().find_map(Result::err);

        // Disks that were unmounted since they were raised.
        for tuple in ctx.owned() {
            if tuple.entity.kind == EntityKind::Disk
                && tuple.property == DISK_SPACE_PROPERTY
                && !seen.contains(&tuple.entity)
            {
                let message = format!("{} is no longer mounted", tuple.entity.identifier);
                if let Err(e) = ctx.ok(tuple.entity, DISK_SPACE_PROPERTY, message).await {
                    first_error.get_or_insert(e.into());
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
