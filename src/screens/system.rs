/// System resources panel: CPU, memory, swap and disk gauges

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use crate::core::{
    Command, CpuSnapshot, Key, MetricClass, MetricSnapshot, Msg, PollPolicy, Sample, SampleError,
    SampleRequest,
};
use crate::screens::error_line;
use crate::utils::constants::{DETAIL_MIN_WIDTH, GAUGE_WIDTH, LABEL_WIDTH, PERCENT_WIDTH};
use crate::utils::format_bytes;
use crate::widgets::{bar_gauge, gauge_color};

#[derive(Debug, Clone)]
pub struct SystemDisplay {
    policy: PollPolicy,
    pub cpu: CpuSnapshot,
    pub memory: MetricSnapshot,
    pub swap: MetricSnapshot,
    pub disk: MetricSnapshot,
    pub last_error: Option<SampleError>,
}

/// Request that polls `class`, for the classes this panel owns
fn owned_request(class: MetricClass) -> Option<SampleRequest> {
    match class {
        MetricClass::Cpu => Some(SampleRequest::Cpu),
        MetricClass::Memory => Some(SampleRequest::Memory),
        MetricClass::Swap => Some(SampleRequest::Swap),
        MetricClass::Disk => Some(SampleRequest::Disk),
        MetricClass::Containers | MetricClass::ContainerStats => None,
    }
}

impl SystemDisplay {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            cpu: CpuSnapshot::default(),
            memory: MetricSnapshot::default(),
            swap: MetricSnapshot::default(),
            disk: MetricSnapshot::default(),
            last_error: None,
        }
    }

    pub fn init(&self) -> Vec<Command> {
        [
            SampleRequest::Cpu,
            SampleRequest::Memory,
            SampleRequest::Swap,
            SampleRequest::Disk,
        ]
        .into_iter()
        .map(|request| self.policy.initial(request))
        .collect()
    }

    pub fn update(mut self, msg: &Msg) -> (Self, Option<Command>) {
        let command = match msg {
            Msg::Sampled(sample) => self.apply(sample),
            Msg::SampleFailed(e) => match owned_request(e.class()) {
                Some(request) => {
                    self.last_error = Some(e.clone());
                    self.policy.after_failure(request)
                }
                None => None,
            },
            Msg::Key(Key::Esc) => {
                self.last_error = None;
                None
            }
            _ => None,
        };
        (self, command)
    }

    fn apply(&mut self, sample: &Sample) -> Option<Command> {
        let request = match sample {
            Sample::Cpu(cpu) => {
                self.cpu = cpu.clone();
                SampleRequest::Cpu
            }
            Sample::Memory(memory) => {
                self.memory = memory.clone();
                SampleRequest::Memory
            }
            Sample::Swap(swap) => {
                self.swap = swap.clone();
                SampleRequest::Swap
            }
            Sample::Disk(disk) => {
                self.disk = disk.clone();
                SampleRequest::Disk
            }
            Sample::Containers(_) | Sample::ContainerStats(_) => return None,
        };

        // a fresh reading supersedes the error it was retrying
        if self.last_error.as_ref().map(SampleError::class) == Some(request.class()) {
            self.last_error = None;
        }

        Some(self.policy.rearm(request))
    }

    pub fn view(&self, width: u16) -> Text<'static> {
        let detailed = width >= DETAIL_MIN_WIDTH;
        let mut lines = Vec::new();

        let cores = if self.cpu.per_core.is_empty() {
            String::new()
        } else {
            format!("{} cores", self.cpu.per_core.len())
        };
        lines.push(metric_row("CPU", self.cpu.overall, detailed.then_some(cores)));
        lines.push(metric_row("RAM", self.memory.used_percent, detailed.then(|| usage_detail(&self.memory))));
        lines.push(metric_row("SWAP", self.swap.used_percent, detailed.then(|| usage_detail(&self.swap))));
        lines.push(metric_row("DISK", self.disk.used_percent, detailed.then(|| usage_detail(&self.disk))));

        if detailed && self.cpu.per_core.len() > 1 {
            lines.push(per_core_line(&self.cpu.per_core, width as usize));
        }

        if let Some(e) = &self.last_error {
            lines.push(Line::default());
            lines.push(error_line(e));
        }

        Text::from(lines)
    }
}

fn metric_row(label: &'static str, percent: f64, detail: Option<String>) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("{:<width$}", label, width = LABEL_WIDTH),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(bar_gauge(percent, GAUGE_WIDTH), Style::default().fg(gauge_color(percent))),
        Span::raw(format!("{:>width$}", format!("{:5.1}%", percent), width = PERCENT_WIDTH)),
    ];

    if let Some(detail) = detail.filter(|d| !d.is_empty()) {
        spans.push(Span::styled(format!("  {}", detail), Style::default().fg(Color::Gray)));
    }

    Line::from(spans)
}

fn usage_detail(snapshot: &MetricSnapshot) -> String {
    match (snapshot.used_bytes(), snapshot.total_bytes) {
        (Some(used), Some(total)) if total > 0 => {
            format!("{} / {}", format_bytes(used), format_bytes(total))
        }
        _ => String::new(),
    }
}

/// Per-core usage, cut to the panel width
fn per_core_line(per_core: &[f64], width: usize) -> Line<'static> {
    let mut text = format!("{:<width$}", "CORES", width = LABEL_WIDTH);
    for percent in per_core {
        let cell = format!("{:>4.0}%", percent);
        if text.chars().count() + cell.chars().count() > width {
            break;
        }
        text.push_str(&cell);
    }
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}
