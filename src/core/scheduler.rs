/// Poll scheduling
///
/// Each metric class runs on its own one-shot timer. The scheduler only
/// turns `Command`s into timers; whether a class is polled again is decided
/// by the reducer that receives the result, using `PollPolicy`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::core::message::{Command, Msg, SampleRequest};
use crate::core::metrics::MetricClass;
use crate::core::sampler::Sampler;
use crate::utils::{AppConfig, FailurePolicy, Intervals};

/// Re-arm rules shared by all sub-displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollPolicy {
    pub intervals: Intervals,
    pub on_failure: FailurePolicy,
}

impl PollPolicy {
    pub fn new(intervals: Intervals, on_failure: FailurePolicy) -> Self {
        Self {
            intervals,
            on_failure,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.intervals.clone(), config.on_failure)
    }

    /// First poll of a class at startup. CPU waits one interval so sysinfo
    /// has a baseline; everything else fires immediately.
    pub fn initial(&self, request: SampleRequest) -> Command {
        let after = match request.class() {
            MetricClass::Cpu => self.intervals.cpu,
            _ => Duration::ZERO,
        };
        Command::schedule(request, after)
    }

    /// Poll the class again at its regular interval
    pub fn rearm(&self, request: SampleRequest) -> Command {
        let after = self.intervals.for_class(request.class());
        Command::schedule(request, after)
    }

    /// Follow-up for a failed poll
    pub fn after_failure(&self, request: SampleRequest) -> Option<Command> {
        match self.on_failure {
            FailurePolicy::Retry => Some(self.rearm(request)),
            FailurePolicy::Stop => {
                debug!(class = %request.class(), "polling stopped after failure");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct Scheduler {
    sampler: Arc<Sampler>,
    events: UnboundedSender<Msg>,
}

impl Scheduler {
    pub fn new(sampler: Sampler, events: UnboundedSender<Msg>) -> Self {
        Self {
            sampler: Arc::new(sampler),
            events,
        }
    }

    /// Arm a one-shot timer; on expiry sample and post the result
    pub fn schedule(&self, request: SampleRequest, after: Duration) -> JoinHandle<()> {
        let sampler = Arc::clone(&self.sampler);
        let events = self.events.clone();
        trace!(class = %request.class(), ?after, "timer armed");

        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let msg = sampler.sample(request).await;
            if events.send(msg).is_err() {
                // Event loop is gone, the process is exiting
                trace!("event queue closed, dropping sample");
            }
        })
    }

    /// Execute a reducer's command batch. Breaks on `Quit`.
    pub fn dispatch(&self, commands: Vec<Command>) -> ControlFlow<()> {
        trace!(
            polls = ?commands.iter().filter_map(Command::polls).collect::<Vec<_>>(),
            "dispatching commands"
        );
        for command in commands {
            match command {
                Command::Schedule { request, after } => {
                    self.schedule(request, after);
                }
                Command::Quit => return ControlFlow::Break(()),
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docker::ContainerRecord;
    use crate::core::message::{Sample, SelectedIds};
    use crate::core::metrics::{CpuSnapshot, MetricSnapshot};
    use crate::core::sampler::{ContainerSource, SampleError, SystemSource};
    use crate::utils::Timeouts;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::unbounded_channel;

    #[derive(Default)]
    struct CountingSource {
        memory_calls: AtomicUsize,
    }

    impl SystemSource for CountingSource {
        fn cpu(&self) -> Result<CpuSnapshot, SampleError> {
            Ok(CpuSnapshot::new(vec![10.0, 30.0], 20.0))
        }
        fn memory(&self) -> Result<MetricSnapshot, SampleError> {
            self.memory_calls.fetch_add(1, Ordering::SeqCst);
            Ok(MetricSnapshot::from_bytes(100, 50))
        }
        fn swap(&self) -> Result<MetricSnapshot, SampleError> {
            Err(SampleError::failed(MetricClass::Swap, "swap unreadable"))
        }
        fn disk(&self) -> Result<MetricSnapshot, SampleError> {
            Ok(MetricSnapshot::from_bytes(100, 90))
        }
    }

    struct NoContainers;

    impl ContainerSource for NoContainers {
        fn list(&self) -> BoxFuture<'static, Result<Vec<ContainerRecord>, SampleError>> {
            futures::future::ready(Ok(Vec::new())).boxed()
        }
        fn stats(&self, _ids: Vec<String>) -> BoxFuture<'static, Result<HashMap<String, crate::core::docker::ContainerStats>, SampleError>> {
            futures::future::ready(Ok(HashMap::new())).boxed()
        }
    }

    /// Records the ids of every stats call
    #[derive(Default)]
    struct RecordingContainers {
        stats_calls: std::sync::Mutex<Vec<Vec<String>>>,
    }

    impl ContainerSource for RecordingContainers {
        fn list(&self) -> BoxFuture<'static, Result<Vec<ContainerRecord>, SampleError>> {
            futures::future::ready(Ok(Vec::new())).boxed()
        }
        fn stats(&self, ids: Vec<String>) -> BoxFuture<'static, Result<HashMap<String, crate::core::docker::ContainerStats>, SampleError>> {
            self.stats_calls.lock().unwrap().push(ids);
            futures::future::ready(Ok(HashMap::new())).boxed()
        }
    }

    fn scheduler(source: Arc<CountingSource>) -> (Scheduler, tokio::sync::mpsc::UnboundedReceiver<Msg>) {
        let (tx, rx) = unbounded_channel();
        let sampler = Sampler::new(source, Arc::new(NoContainers), Timeouts::default());
        (Scheduler::new(sampler, tx), rx)
    }

    #[test]
    fn test_policy_rearms_at_class_interval() {
        let policy = PollPolicy::default();
        assert_eq!(
            policy.rearm(SampleRequest::Disk),
            Command::schedule(SampleRequest::Disk, Duration::from_secs(30))
        );
        assert_eq!(
            policy.rearm(SampleRequest::Cpu),
            Command::schedule(SampleRequest::Cpu, Duration::from_millis(800))
        );
    }

    #[test]
    fn test_policy_initial_delays() {
        let policy = PollPolicy::default();
        assert_eq!(
            policy.initial(SampleRequest::Cpu),
            Command::schedule(SampleRequest::Cpu, Duration::from_millis(800))
        );
        assert_eq!(
            policy.initial(SampleRequest::Containers),
            Command::schedule(SampleRequest::Containers, Duration::ZERO)
        );
    }

    #[test]
    fn test_policy_after_failure() {
        let retry = PollPolicy::new(Intervals::default(), FailurePolicy::Retry);
        let stop = PollPolicy::new(Intervals::default(), FailurePolicy::Stop);

        assert_eq!(
            retry.after_failure(SampleRequest::Containers),
            Some(Command::schedule(SampleRequest::Containers, Duration::from_secs(10)))
        );
        assert_eq!(stop.after_failure(SampleRequest::Containers), None);
    }

    #[tokio::test]
    async fn test_timer_posts_sample_after_delay() {
        let source = Arc::new(CountingSource::default());
        let (scheduler, mut rx) = scheduler(Arc::clone(&source));

        let started = tokio::time::Instant::now();
        scheduler
            .schedule(SampleRequest::Memory, Duration::from_millis(30))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(
            rx.recv().await,
            Some(Msg::Sampled(Sample::Memory(MetricSnapshot::from_bytes(100, 50))))
        );
        assert_eq!(source.memory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_posted_not_retried() {
        let source = Arc::new(CountingSource::default());
        let (scheduler, mut rx) = scheduler(source);

        scheduler.schedule(SampleRequest::Swap, Duration::ZERO).await.unwrap();

        match rx.recv().await {
            Some(Msg::SampleFailed(e)) => assert_eq!(e.class(), MetricClass::Swap),
            other => panic!("unexpected message {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_classes_fire_independently() {
        let source = Arc::new(CountingSource::default());
        let (scheduler, mut rx) = scheduler(source);

        let flow = scheduler.dispatch(vec![
            Command::schedule(SampleRequest::Disk, Duration::from_millis(60)),
            Command::schedule(SampleRequest::Cpu, Duration::from_millis(5)),
        ]);
        assert_eq!(flow, ControlFlow::Continue(()));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, Msg::Sampled(Sample::Cpu(_))));
        assert!(matches!(second, Msg::Sampled(Sample::Disk(_))));
    }

    #[tokio::test]
    async fn test_dispatched_stats_poll_reads_selection_on_expiry() {
        let containers = Arc::new(RecordingContainers::default());
        let (tx, mut rx) = unbounded_channel();
        let sampler = Sampler::new(
            Arc::new(CountingSource::default()),
            containers.clone(),
            Timeouts::default(),
        );
        let scheduler = Scheduler::new(sampler, tx);

        let selected = SelectedIds::default();
        let flow = scheduler.dispatch(vec![Command::schedule(
            SampleRequest::ContainerStats(selected.clone()),
            Duration::from_millis(30),
        )]);
        assert_eq!(flow, ControlFlow::Continue(()));

        selected.replace(&["c1".to_string()].into_iter().collect());

        assert!(matches!(rx.recv().await, Some(Msg::Sampled(Sample::ContainerStats(_)))));
        assert_eq!(*containers.stats_calls.lock().unwrap(), vec![vec!["c1".to_string()]]);
    }

    #[tokio::test]
    async fn test_dispatch_stops_on_quit() {
        let source = Arc::new(CountingSource::default());
        let (scheduler, mut rx) = scheduler(Arc::clone(&source));

        let flow = scheduler.dispatch(vec![
            Command::Quit,
            Command::schedule(SampleRequest::Memory, Duration::ZERO),
        ]);

        assert_eq!(flow, ControlFlow::Break(()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(source.memory_calls.load(Ordering::SeqCst), 0);
    }
}
