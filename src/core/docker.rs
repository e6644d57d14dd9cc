/// Docker integration
///
/// Lists containers and reads per-container CPU/memory usage through the
/// Docker Engine API.

use anyhow::{Context, Result};
use bollard::container::{ListContainersOptions, Stats, StatsOptions};
use bollard::models::ContainerSummary;
use bollard::Docker;
use futures::future::{join_all, BoxFuture};
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::metrics::MetricClass;
use crate::core::sampler::{ContainerSource, SampleError};
use crate::utils::percent_of;

/// One row of the container list, taken verbatim from the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    pub state: String,
}

impl From<ContainerSummary> for ContainerRecord {
    fn from(summary: ContainerSummary) -> Self {
        Self {
            id: summary.id.unwrap_or_default(),
            image: summary.image.unwrap_or_default(),
            state: summary.state.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl From<&Stats> for ContainerStats {
    fn from(stats: &Stats) -> Self {
        let cpu_delta = stats
            .cpu_stats
            .cpu_usage
            .total_usage
            .saturating_sub(stats.precpu_stats.cpu_usage.total_usage);
        let system_delta = stats
            .cpu_stats
            .system_cpu_usage
            .unwrap_or(0)
            .saturating_sub(stats.precpu_stats.system_cpu_usage.unwrap_or(0));
        let num_cpus = stats.cpu_stats.online_cpus.unwrap_or(1) as u64;

        let memory_usage = stats.memory_stats.usage.unwrap_or(0);
        let memory_limit = stats.memory_stats.limit.unwrap_or(0);

        Self {
            cpu_percent: cpu_percent(cpu_delta, system_delta, num_cpus),
            memory_percent: percent_of(memory_usage, memory_limit),
        }
    }
}

/// Docker's CPU formula: share of the host delta scaled by online CPUs
fn cpu_percent(cpu_delta: u64, system_delta: u64, num_cpus: u64) -> f64 {
    if system_delta == 0 {
        return 0.0;
    }
    (cpu_delta as f64 / system_delta as f64) * num_cpus.max(1) as f64 * 100.0
}

#[derive(Clone)]
pub struct DockerManager {
    docker: Docker,
    memory_total: Option<u64>,
}

impl DockerManager {
    /// Connect and verify the daemon answers within `deadline`
    pub async fn connect(deadline: Duration) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon. Is Docker running?")?;

        let info = tokio::time::timeout(deadline, docker.info())
            .await
            .context("Docker daemon did not answer in time")?
            .context("Failed to connect to Docker daemon. Is Docker running?")?;

        let memory_total = info.mem_total.and_then(|bytes| u64::try_from(bytes).ok());
        info!(
            server_version = info.server_version.as_deref().unwrap_or("unknown"),
            memory_total = memory_total.unwrap_or(0),
            "connected to Docker daemon"
        );

        Ok(Self {
            docker,
            memory_total,
        })
    }

    /// Memory available to the Docker daemon, in bytes
    pub fn memory_total(&self) -> Option<u64> {
        self.memory_total
    }

    /// List all containers, including stopped ones
    pub async fn list_containers(&self) -> Result<Vec<ContainerRecord>, bollard::errors::Error> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });

        let containers = self.docker.list_containers(options).await?;
        Ok(containers.into_iter().map(ContainerRecord::from).collect())
    }

    /// Get container stats
    pub async fn get_container_stats(&self, id: &str) -> Result<Option<ContainerStats>, bollard::errors::Error> {
        // one_shot=false lets the daemon fill precpu_stats so the CPU delta is meaningful
        let mut stats_stream = self.docker.stats(
            id,
            Some(StatsOptions {
                stream: false,
                one_shot: false,
            }),
        );

        match stats_stream.next().await {
            Some(Ok(stats)) => Ok(Some(ContainerStats::from(&stats))),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

impl ContainerSource for DockerManager {
    fn list(&self) -> BoxFuture<'static, Result<Vec<ContainerRecord>, SampleError>> {
        let manager = self.clone();
        async move {
            manager
                .list_containers()
                .await
                .map_err(|e| SampleError::failed(MetricClass::Containers, e))
        }
        .boxed()
    }

    fn stats(&self, ids: Vec<String>) -> BoxFuture<'static, Result<HashMap<String, ContainerStats>, SampleError>> {
        let manager = self.clone();
        async move {
            let requests = ids.iter().map(|id| {
                let manager = manager.clone();
                async move { (id.clone(), manager.get_container_stats(id).await) }
            });

            let mut stats_map = HashMap::new();
            let mut first_error = None;
            for (id, result) in join_all(requests).await {
                match result {
                    Ok(Some(stats)) => {
                        stats_map.insert(id, stats);
                    }
                    Ok(None) => debug!(container = %id, "no stats returned"),
                    Err(e) => {
                        debug!(container = %id, error = %e, "stats request failed");
                        first_error.get_or_insert(e);
                    }
                }
            }

            // Partial results are still useful; only report total failure
            match first_error {
                Some(e) if stats_map.is_empty() => Err(SampleError::failed(MetricClass::ContainerStats, e)),
                _ => Ok(stats_map),
            }
        }
        .boxed()
    }
}
