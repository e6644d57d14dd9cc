/// Metric sampling
///
/// A sampler performs exactly one collection call per request and converts
/// the outcome into a message for the event queue. It never retries; the
/// owning reducer decides whether the class gets polled again.

use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{trace, warn};

use crate::core::docker::{ContainerRecord, ContainerStats};
use crate::core::message::{Msg, Sample, SampleRequest};
use crate::core::metrics::{CpuSnapshot, MetricClass, MetricSnapshot};
use crate::utils::Timeouts;

/// Blocking OS metric calls
#[cfg_attr(test, mockall::automock)]
pub trait SystemSource: Send + Sync {
    fn cpu(&self) -> Result<CpuSnapshot, SampleError>;
    fn memory(&self) -> Result<MetricSnapshot, SampleError>;
    fn swap(&self) -> Result<MetricSnapshot, SampleError>;
    fn disk(&self) -> Result<MetricSnapshot, SampleError>;
}

/// Container runtime calls
#[cfg_attr(test, mockall::automock)]
pub trait ContainerSource: Send + Sync {
    fn list(&self) -> BoxFuture<'static, Result<Vec<ContainerRecord>, SampleError>>;
    fn stats(&self, ids: Vec<String>) -> BoxFuture<'static, Result<HashMap<String, ContainerStats>, SampleError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    #[error("{class} sampling timed out after {after:?}")]
    Timeout { class: MetricClass, after: Duration },

    #[error("{class} sampling failed: {message}")]
    Source { class: MetricClass, message: String },

    #[error("{class} sampler aborted: {message}")]
    Aborted { class: MetricClass, message: String },

    #[error("{class} sampling skipped: previous call still running")]
    Busy { class: MetricClass },
}

impl SampleError {
    pub fn failed(class: MetricClass, err: impl std::fmt::Display) -> Self {
        SampleError::Source {
            class,
            message: err.to_string(),
        }
    }

    pub fn class(&self) -> MetricClass {
        match self {
            SampleError::Timeout { class, .. }
            | SampleError::Source { class, .. }
            | SampleError::Aborted { class, .. }
            | SampleError::Busy { class } => *class,
        }
    }
}

type Running = Arc<Mutex<HashSet<MetricClass>>>;

/// Marks a class as having a blocking call on the pool until dropped
struct InFlight {
    running: Running,
    class: MetricClass,
}

impl InFlight {
    fn acquire(running: &Running, class: MetricClass) -> Option<Self> {
        let mut classes = running.lock().unwrap_or_else(PoisonError::into_inner);
        classes.insert(class).then(|| Self {
            running: Arc::clone(running),
            class,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut classes = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        classes.remove(&self.class);
    }
}

pub struct Sampler {
    system: Arc<dyn SystemSource>,
    containers: Arc<dyn ContainerSource>,
    timeouts: Timeouts,
    running: Running,
}

impl Sampler {
    pub fn new(system: Arc<dyn SystemSource>, containers: Arc<dyn ContainerSource>, timeouts: Timeouts) -> Self {
        Self {
            system,
            containers,
            timeouts,
            running: Running::default(),
        }
    }

    /// Run one collection and wrap the outcome as an event
    pub async fn sample(&self, request: SampleRequest) -> Msg {
        let class = request.class();
        match self.collect(request).await {
            Ok(sample) => {
                trace!(%class, "sample collected");
                Msg::Sampled(sample)
            }
            Err(e) => {
                warn!(%class, error = %e, "sample failed");
                Msg::SampleFailed(e)
            }
        }
    }

    pub async fn collect(&self, request: SampleRequest) -> Result<Sample, SampleError> {
        let class = request.class();
        match request {
            SampleRequest::Cpu => self.blocking(class, |source| source.cpu()).await.map(Sample::Cpu),
            SampleRequest::Memory => self.blocking(class, |source| source.memory()).await.map(Sample::Memory),
            SampleRequest::Swap => self.blocking(class, |source| source.swap()).await.map(Sample::Swap),
            SampleRequest::Disk => self.blocking(class, |source| source.disk()).await.map(Sample::Disk),
            SampleRequest::Containers => self
                .deadline(class, self.containers.list())
                .await?
                .map(Sample::Containers),
            SampleRequest::ContainerStats(selected) => {
                let ids = selected.snapshot();
                if ids.is_empty() {
                    return Ok(Sample::ContainerStats(HashMap::new()));
                }
                self.deadline(class, self.containers.stats(ids))
                    .await?
                    .map(Sample::ContainerStats)
            }
        }
    }

    /// Run a blocking OS call on the blocking pool.
    ///
    /// A deadline abandons the wait but cannot stop the call, so at most one
    /// call per class is kept on the pool; requests arriving while it still
    /// runs fail with `Busy`.
    async fn blocking<T, F>(&self, class: MetricClass, call: F) -> Result<T, SampleError>
    where
        F: FnOnce(&dyn SystemSource) -> Result<T, SampleError> + Send + 'static,
        T: Send + 'static,
    {
        let guard = InFlight::acquire(&self.running, class).ok_or(SampleError::Busy { class })?;
        let source = Arc::clone(&self.system);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            call(source.as_ref())
        });

        self.deadline(class, task)
            .await?
            .map_err(|e| SampleError::Aborted {
                class,
                message: e.to_string(),
            })?
    }

    /// Apply the class deadline, if it has one
    async fn deadline<F: Future>(&self, class: MetricClass, call: F) -> Result<F::Output, SampleError> {
        match self.timeouts.for_class(class) {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SampleError::Timeout { class, after: limit }),
            None => Ok(call.await),
        }
    }
}
