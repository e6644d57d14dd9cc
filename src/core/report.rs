/// One-shot host report for the `snapshot` command

use serde::Serialize;

use crate::core::docker::ContainerRecord;
use crate::core::message::{Sample, SampleRequest};
use crate::core::metrics::{CpuSnapshot, MetricSnapshot};
use crate::core::sampler::Sampler;
use crate::utils::constants::{GAUGE_WIDTH, IMAGE_MAX_LEN, LABEL_WIDTH, SHORT_ID_LEN};
use crate::utils::{format_bytes, short_id, truncate_string};
use crate::widgets::bar_gauge;

#[derive(Debug, Default, Serialize)]
pub struct HostReport {
    /// Local time the collection started, RFC 3339
    pub taken_at: String,
    pub cpu: Option<CpuSnapshot>,
    pub memory: Option<MetricSnapshot>,
    pub swap: Option<MetricSnapshot>,
    pub disk: Option<MetricSnapshot>,
    pub containers: Option<Vec<ContainerRecord>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl HostReport {
    /// Sample every class once. Failures are recorded, not returned.
    pub async fn collect(sampler: &Sampler) -> Self {
        let mut report = Self {
            taken_at: chrono::Local::now().to_rfc3339(),
            ..Self::default()
        };
        for request in [
            SampleRequest::Cpu,
            SampleRequest::Memory,
            SampleRequest::Swap,
            SampleRequest::Disk,
            SampleRequest::Containers,
        ] {
            match sampler.collect(request).await {
                Ok(sample) => report.record(sample),
                Err(e) => report.errors.push(e.to_string()),
            }
        }
        report
    }

    pub fn record(&mut self, sample: Sample) {
        match sample {
            Sample::Cpu(cpu) => self.cpu = Some(cpu),
            Sample::Memory(memory) => self.memory = Some(memory),
            Sample::Swap(swap) => self.swap = Some(swap),
            Sample::Disk(disk) => self.disk = Some(disk),
            Sample::Containers(containers) => self.containers = Some(containers),
            Sample::ContainerStats(_) => {}
        }
    }

    /// Plain-text table for terminal output
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        if !self.taken_at.is_empty() {
            out.push_str(&format!("Snapshot taken {}\n\n", self.taken_at));
        }

        out.push_str(&row("CPU", self.cpu.as_ref().map(|c| (c.overall, String::new()))));
        for (label, snapshot) in [("RAM", &self.memory), ("SWAP", &self.swap), ("DISK", &self.disk)] {
            out.push_str(&row(label, snapshot.as_ref().map(|s| (s.used_percent, usage(s)))));
        }

        out.push('\n');
        match &self.containers {
            Some(containers) if containers.is_empty() => out.push_str("No containers\n"),
            Some(containers) => {
                out.push_str(&format!("{:<12} {:<20} {:<10}\n", "ID", "IMAGE", "STATE"));
                for c in containers {
                    out.push_str(&format!(
                        "{:<12} {:<20} {:<10}\n",
                        short_id(&c.id, SHORT_ID_LEN),
                        truncate_string(&c.image, IMAGE_MAX_LEN),
                        c.state
                    ));
                }
            }
            None => out.push_str("Containers unavailable\n"),
        }

        for e in &self.errors {
            out.push_str(&format!("error: {}\n", e));
        }

        out
    }
}

fn row(label: &str, reading: Option<(f64, String)>) -> String {
    match reading {
        Some((percent, detail)) => {
            let line = format!(
                "{:<width$}{} {:5.1}%  {}",
                label,
                bar_gauge(percent, GAUGE_WIDTH),
                percent,
                detail,
                width = LABEL_WIDTH
            );
            format!("{}\n", line.trim_end())
        }
        None => format!("{:<width$}n/a\n", label, width = LABEL_WIDTH),
    }
}

fn usage(snapshot: &MetricSnapshot) -> String {
    match (snapshot.used_bytes(), snapshot.total_bytes) {
        (Some(used), Some(total)) => format!("{} / {}", format_bytes(used), format_bytes(total)),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::MetricClass;
    use crate::core::sampler::{MockContainerSource, MockSystemSource, SampleError};
    use crate::utils::Timeouts;
    use futures::FutureExt;
    use std::sync::Arc;

    #[test]
    fn test_record_keeps_latest_per_class() {
        let mut report = HostReport::default();
        report.record(Sample::Disk(MetricSnapshot::from_bytes(100, 90)));
        report.record(Sample::Disk(MetricSnapshot::from_bytes(100, 10)));

        assert_eq!(report.disk.unwrap().used_percent, 90.0);
        assert!(report.memory.is_none());
    }

    #[test]
    fn test_render_table() {
        let mut report = HostReport::default();
        report.record(Sample::Memory(MetricSnapshot::from_bytes(2048, 1024)));
        report.record(Sample::Containers(Vec::new()));
        report.errors.push("swap sampling failed: denied".to_string());

        let table = report.render_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "CPU   n/a");
        assert_eq!(
            lines[1],
            format!("RAM   [{}{}]  50.0%  1.00 KB / 2.00 KB", "█".repeat(10), " ".repeat(10))
        );
        assert!(table.contains("No containers"));
        assert!(table.ends_with("error: swap sampling failed: denied\n"));
    }

    #[test]
    fn test_json_skips_empty_errors() {
        let json = serde_json::to_value(HostReport::default()).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json["cpu"].is_null());
    }

    #[tokio::test]
    async fn test_collect_records_failures() {
        let mut system = MockSystemSource::new();
        system.expect_cpu().returning(|| Ok(CpuSnapshot::new(vec![10.0], 10.0)));
        system.expect_memory().returning(|| Ok(MetricSnapshot::from_bytes(10, 5)));
        system
            .expect_swap()
            .returning(|| Err(SampleError::failed(MetricClass::Swap, "denied")));
        system.expect_disk().returning(|| Ok(MetricSnapshot::from_bytes(10, 1)));

        let mut containers = MockContainerSource::new();
        containers
            .expect_list()
            .returning(|| futures::future::ready(Ok(Vec::new())).boxed());

        let sampler = Sampler::new(Arc::new(system), Arc::new(containers), Timeouts::default());
        let report = HostReport::collect(&sampler).await;

        assert!(report.cpu.is_some());
        assert!(report.swap.is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.taken_at).is_ok());
        assert_eq!(report.containers, Some(Vec::new()));
        assert_eq!(report.errors, vec!["swap sampling failed: denied".to_string()]);
    }
}
