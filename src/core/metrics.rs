/// Host metric snapshots and the sysinfo-backed metric source
///
/// A single `System` is kept alive between samples: sysinfo computes CPU
/// usage from the delta between two refreshes.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use sysinfo::{Disks, System};

use crate::core::sampler::{SampleError, SystemSource};
use crate::utils::{clamp_percent, percent_of};

/// Independently polled metric classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricClass {
    Cpu,
    Memory,
    Swap,
    Disk,
    Containers,
    ContainerStats,
}

impl MetricClass {
    pub fn label(&self) -> &'static str {
        match self {
            MetricClass::Cpu => "cpu",
            MetricClass::Memory => "memory",
            MetricClass::Swap => "swap",
            MetricClass::Disk => "disk",
            MetricClass::Containers => "containers",
            MetricClass::ContainerStats => "container stats",
        }
    }
}

impl fmt::Display for MetricClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Latest reading for memory, swap or disk
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub total_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
    pub used_percent: f64,
}

impl MetricSnapshot {
    pub fn from_bytes(total: u64, free: u64) -> Self {
        let free = free.min(total);
        Self {
            total_bytes: Some(total),
            free_bytes: Some(free),
            used_percent: percent_of(total - free, total),
        }
    }

    pub fn used_bytes(&self) -> Option<u64> {
        match (self.total_bytes, self.free_bytes) {
            (Some(total), Some(free)) => Some(total.saturating_sub(free)),
            _ => None,
        }
    }
}

/// Per-core CPU usage plus the all-core aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuSnapshot {
    pub per_core: Vec<f64>,
    pub overall: f64,
}

impl CpuSnapshot {
    pub fn new(per_core: Vec<f64>, overall: f64) -> Self {
        Self {
            per_core: per_core.into_iter().map(clamp_percent).collect(),
            overall: clamp_percent(overall),
        }
    }
}

/// sysinfo-backed implementation of the OS metric calls
pub struct HostMetrics {
    system: Mutex<System>,
    disk_path: PathBuf,
}

impl HostMetrics {
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        // First refresh only establishes the CPU baseline
        system.refresh_cpu();

        Self {
            system: Mutex::new(system),
            disk_path: disk_path.into(),
        }
    }

    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }

    fn lock(&self, class: MetricClass) -> Result<MutexGuard<'_, System>, SampleError> {
        self.system
            .lock()
            .map_err(|_| SampleError::failed(class, "system handle poisoned by a panicked sampler"))
    }
}

impl SystemSource for HostMetrics {
    fn cpu(&self) -> Result<CpuSnapshot, SampleError> {
        let mut system = self.lock(MetricClass::Cpu)?;
        system.refresh_cpu();

        let per_core = system
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage() as f64)
            .collect::<Vec<_>>();

        if per_core.is_empty() {
            return Err(SampleError::failed(MetricClass::Cpu, "no CPUs reported"));
        }

        Ok(CpuSnapshot::new(per_core, system.global_cpu_info().cpu_usage() as f64))
    }

    fn memory(&self) -> Result<MetricSnapshot, SampleError> {
        let mut system = self.lock(MetricClass::Memory)?;
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(SampleError::failed(MetricClass::Memory, "memory information unavailable"));
        }

        Ok(MetricSnapshot::from_bytes(total, system.available_memory()))
    }

    fn swap(&self) -> Result<MetricSnapshot, SampleError> {
        let mut system = self.lock(MetricClass::Swap)?;
        system.refresh_memory();

        // A host without swap reports 0/0, which is a valid reading
        Ok(MetricSnapshot::from_bytes(system.total_swap(), system.free_swap()))
    }

    fn disk(&self) -> Result<MetricSnapshot, SampleError> {
        let disks = Disks::new_with_refreshed_list();

        let index = best_mount(disks.list().iter().map(|d| d.mount_point()), &self.disk_path)
            .ok_or_else(|| {
                SampleError::failed(
                    MetricClass::Disk,
                    format!("no mounted filesystem contains {}", self.disk_path.display()),
                )
            })?;

        let disk = &disks.list()[index];
        Ok(MetricSnapshot::from_bytes(disk.total_space(), disk.available_space()))
    }
}

/// Index of the mount point with the longest prefix of `target`
fn best_mount<'a, I>(mounts: I, target: &Path) -> Option<usize>
where
    I: IntoIterator<Item = &'a Path>,
{
    mounts
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| target.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_bytes() {
        let snapshot = MetricSnapshot::from_bytes(1000, 250);
        assert_eq!(snapshot.total_bytes, Some(1000));
        assert_eq!(snapshot.free_bytes, Some(250));
        assert_eq!(snapshot.used_bytes(), Some(750));
        assert_eq!(snapshot.used_percent, 75.0);
    }

    #[test]
    fn test_snapshot_without_capacity() {
        let snapshot = MetricSnapshot::from_bytes(0, 0);
        assert_eq!(snapshot.used_percent, 0.0);

        // free larger than total must not underflow
        let snapshot = MetricSnapshot::from_bytes(100, 400);
        assert_eq!(snapshot.used_percent, 0.0);
        assert_eq!(snapshot.used_bytes(), Some(0));
    }

    #[test]
    fn test_cpu_snapshot_clamps() {
        let snapshot = CpuSnapshot::new(vec![-1.0, 50.0, 140.0], 101.0);
        assert_eq!(snapshot.per_core, vec![0.0, 50.0, 100.0]);
        assert_eq!(snapshot.overall, 100.0);
    }

    #[test]
    fn test_best_mount_prefers_longest_prefix() {
        let mounts = [Path::new("/"), Path::new("/var"), Path::new("/var/lib/docker"), Path::new("/home")];
        assert_eq!(best_mount(mounts, Path::new("/var/lib/docker/volumes")), Some(2));
        assert_eq!(best_mount(mounts, Path::new("/var/log")), Some(1));
        assert_eq!(best_mount(mounts, Path::new("/")), Some(0));
        assert_eq!(best_mount(mounts, Path::new("/variable")), Some(0));
    }

    #[test]
    fn test_best_mount_without_match() {
        let mounts = [Path::new("/mnt/data")];
        assert_eq!(best_mount(mounts, Path::new("/srv")), None);
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(MetricClass::Cpu.to_string(), "cpu");
        assert_eq!(MetricClass::ContainerStats.to_string(), "container stats");
    }

    #[test]
    fn test_host_memory_reading_in_range() {
        let host = HostMetrics::new("/");
        if let Ok(memory) = host.memory() {
            assert!(memory.total_bytes.unwrap_or(0) > 0);
            assert!((0.0..=100.0).contains(&memory.used_percent));
        }
    }
}
