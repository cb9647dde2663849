//! Local system statistics: CPU, memory and NAS storage

use crate::to_slide_data;
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// One sysinfo::System shared by every system slide
static SHARED_SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    info!("Creating shared sysinfo::System instance");
    Mutex::new(System::new())
});

#[derive(Debug, Serialize)]
struct CpuStats {
    percent: f64,
    per_core: Vec<f64>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct MemoryStats {
    used: u64,
    total: u64,
    available: u64,
    percent: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct DiskStats {
    path: String,
    total: u64,
    used: u64,
    free: u64,
    percent: f64,
}

#[derive(Debug, Serialize)]
struct SystemStats {
    cpu: CpuStats,
    memory: MemoryStats,
    disks: Vec<DiskStats>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

/// Index of the mount point that contains `path`, preferring the deepest
pub(crate) fn best_mount<'a>(mount_points: impl IntoIterator<Item = &'a Path>, path: &Path) -> Option<usize> {
    mount_points
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| path.starts_with(mount))
        .max_by_key(|(_, mount)| mount.as_os_str().len())
        .map(|(i, _)| i)
}

pub(crate) fn disk_stats(path: &str, total: u64, available: u64) -> DiskStats {
    let used = total.saturating_sub(available);
    DiskStats {
        path: path.to_string(),
        total,
        used,
        free: available,
        percent: percent(used, total),
    }
}

/// Usage of each accessible NAS mount, or of `/` when none are
fn collect_disks(nas_mounts: &[PathBuf]) -> Vec<DiskStats> {
    let disks = Disks::new_with_refreshed_list();
    let usage_of = |path: &Path| {
        best_mount(disks.list().iter().map(|d| d.mount_point()), path).map(|i| {
            let disk = &disks.list()[i];
            disk_stats(&path.to_string_lossy(), disk.total_space(), disk.available_space())
        })
    };

    let mut stats: Vec<DiskStats> = nas_mounts
        .iter()
        .filter(|mount| mount.exists())
        .filter_map(|mount| usage_of(mount.as_path()))
        .collect();

    if stats.is_empty() {
        debug!("No NAS mounts accessible, reporting root filesystem");
        stats.extend(usage_of(Path::new("/")));
    }
    stats
}

fn sample_cpu_and_memory() -> (CpuStats, MemoryStats) {
    let mut sys = SHARED_SYSTEM.lock().unwrap_or_else(|p| p.into_inner());
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let cpu = CpuStats {
        percent: round1(sys.global_cpu_usage() as f64),
        per_core: sys.cpus().iter().map(|c| round1(c.cpu_usage() as f64)).collect(),
        count: sys.cpus().len(),
    };
    let total = sys.total_memory();
    let available = sys.available_memory();
    let memory = MemoryStats {
        used: sys.used_memory(),
        total,
        available,
        percent: percent(total.saturating_sub(available), total),
    };
    (cpu, memory)
}

/// Run filesystem and sysinfo work on the blocking pool.
///
/// A hung NAS mount then stalls a blocking thread, not a runtime worker, and
/// the collector's fetch timeout can still fire.
pub(crate) async fn off_runtime<T, F>(work: F) -> Result<T, CollectorError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CollectorError::Other(format!("system sampling task failed: {}", e)))
}

/// Collector for the machine the HUD runs on
pub struct SystemCollector {
    nas_mounts: Vec<PathBuf>,
    poll_interval: Duration,
}

impl SystemCollector {
    pub fn new(nas_mounts: Vec<String>, poll_interval_secs: u64) -> Self {
        Self {
            nas_mounts: nas_mounts.into_iter().map(PathBuf::from).collect(),
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }
}

#[async_trait]
impl DataCollector for SystemCollector {
    fn name(&self) -> &str {
        "system"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        // CPU usage is a delta between two refreshes
        off_runtime(|| {
            SHARED_SYSTEM
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .refresh_cpu_all();
        })
        .await?;
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;

        let nas_mounts = self.nas_mounts.clone();
        let stats = off_runtime(move || {
            let (cpu, memory) = sample_cpu_and_memory();
            SystemStats {
                cpu,
                memory,
                disks: collect_disks(&nas_mounts),
            }
        })
        .await?;
        Ok(Some(to_slide_data(&stats)?))
    }
}
