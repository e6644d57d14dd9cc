pub mod docker;
pub mod message;
pub mod metrics;
pub mod report;
pub mod sampler;
pub mod scheduler;

pub use docker::{ContainerRecord, ContainerStats, DockerManager};
pub use message::{Command, Key, Msg, Sample, SampleRequest, SelectedIds};
pub use metrics::{CpuSnapshot, HostMetrics, MetricClass, MetricSnapshot};
pub use report::HostReport;
pub use sampler::{ContainerSource, SampleError, Sampler, SystemSource};
pub use scheduler::{PollPolicy, Scheduler};
