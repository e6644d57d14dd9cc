/// Containers panel: selectable list of Docker containers with live stats

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};
use std::collections::{BTreeSet, HashMap};

use crate::core::{
    Command, ContainerRecord, ContainerStats, Key, MetricClass, Msg, PollPolicy, Sample, SampleError,
    SampleRequest, SelectedIds,
};
use crate::screens::error_line;
use crate::utils::constants::{IMAGE_MAX_LEN, SHORT_ID_LEN};
use crate::utils::{bytes_to_gb, short_id, truncate_string, ContainerState};

/// Cursor position and checked containers.
///
/// Selection is keyed by container id so it survives list reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub cursor: usize,
    pub selected: BTreeSet<String>,
}

impl Selection {
    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Check or uncheck a container
    pub fn toggle(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Fit the selection to a freshly listed set of containers
    pub fn reconcile(&mut self, containers: &[ContainerRecord]) {
        self.selected
            .retain(|id| containers.iter().any(|c| &c.id == id));
        self.cursor = self.cursor.min(containers.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone)]
pub struct ContainersDisplay {
    policy: PollPolicy,
    pub containers: Vec<ContainerRecord>,
    pub stats: HashMap<String, ContainerStats>,
    pub selection: Selection,
    /// Selection as seen by the armed stats poll
    watched: SelectedIds,
    /// Memory the daemon reports, fixed at connect time
    pub docker_memory: Option<u64>,
    pub last_error: Option<SampleError>,
}

impl ContainersDisplay {
    pub fn new(policy: PollPolicy, docker_memory: Option<u64>) -> Self {
        Self {
            policy,
            containers: Vec::new(),
            stats: HashMap::new(),
            selection: Selection::default(),
            watched: SelectedIds::default(),
            docker_memory,
            last_error: None,
        }
    }

    pub fn init(&self) -> Vec<Command> {
        vec![
            self.policy.initial(SampleRequest::Containers),
            self.policy.initial(self.stats_request()),
        ]
    }

    pub fn update(mut self, msg: &Msg) -> (Self, Option<Command>) {
        let command = match msg {
            Msg::Sampled(Sample::Containers(containers)) => {
                self.containers = containers.clone();
                self.selection.reconcile(&self.containers);
                self.clear_error(MetricClass::Containers);
                Some(self.policy.rearm(SampleRequest::Containers))
            }
            Msg::Sampled(Sample::ContainerStats(stats)) => {
                self.stats = stats.clone();
                self.clear_error(MetricClass::ContainerStats);
                Some(self.policy.rearm(self.stats_request()))
            }
            Msg::SampleFailed(e) if e.class() == MetricClass::Containers => {
                self.last_error = Some(e.clone());
                self.policy.after_failure(SampleRequest::Containers)
            }
            Msg::SampleFailed(e) if e.class() == MetricClass::ContainerStats => {
                self.last_error = Some(e.clone());
                self.policy.after_failure(self.stats_request())
            }
            Msg::Key(key) => {
                self.handle_key(*key);
                None
            }
            _ => None,
        };
        self.watched.replace(&self.selection.selected);
        (self, command)
    }

    fn handle_key(&mut self, key: Key) {
        match key {
            Key::Up | Key::Char('k') => self.selection.move_up(),
            Key::Down | Key::Char('j') => self.selection.move_down(self.containers.len()),
            Key::Enter | Key::Space => {
                if let Some(container) = self.containers.get(self.selection.cursor) {
                    self.selection.toggle(&container.id);
                }
            }
            Key::Esc => self.last_error = None,
            _ => {}
        }
    }

    /// Stats poll for whatever is checked when the timer fires
    fn stats_request(&self) -> SampleRequest {
        SampleRequest::ContainerStats(self.watched.clone())
    }

    fn clear_error(&mut self, class: MetricClass) {
        if self.last_error.as_ref().map(SampleError::class) == Some(class) {
            self.last_error = None;
        }
    }

    pub fn view(&self, _width: u16) -> Text<'static> {
        let mut lines = Vec::new();

        let memory = match self.docker_memory {
            Some(bytes) => format!("{} GB", bytes_to_gb(bytes)),
            None => "unknown".to_string(),
        };
        lines.push(Line::from(vec![
            Span::raw("System memory assigned to Docker: "),
            Span::styled(memory, Style::default().add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::default());

        if self.containers.is_empty() {
            lines.push(Line::from(Span::styled(
                "[ No containers running. ]",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("      {:<12} {:<20} {:<10}", "ID", "IMAGE", "STATE"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));

            // the list may have shrunk since the cursor last moved
            let cursor = self.selection.cursor.min(self.containers.len() - 1);
            for (i, container) in self.containers.iter().enumerate() {
                lines.push(self.container_row(container, i == cursor));
                if self.selection.is_selected(&container.id) {
                    lines.push(self.stats_row(&container.id));
                }
            }
        }

        if let Some(e) = &self.last_error {
            lines.push(Line::default());
            lines.push(error_line(e));
        }

        lines.push(Line::default());
        for help in [
            "[up/k] [down/j] to move cursor | [enter/space] to select",
            "[esc] dismiss error | [ctrl+c] or [q] to quit",
        ] {
            lines.push(Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))));
        }

        Text::from(lines)
    }

    fn container_row(&self, container: &ContainerRecord, under_cursor: bool) -> Line<'static> {
        let pointer = if under_cursor { ">" } else { " " };
        let check = if self.selection.is_selected(&container.id) { "x" } else { " " };
        let state = ContainerState::from(container.state.as_str());

        let row_style = if under_cursor {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::styled(format!("{} [{}] ", pointer, check), row_style),
            Span::styled(
                format!(
                    "{:<12} {:<20} ",
                    short_id(&container.id, SHORT_ID_LEN),
                    truncate_string(&container.image, IMAGE_MAX_LEN)
                ),
                row_style,
            ),
            Span::styled(format!("{:<10}", container.state), row_style.fg(state.color())),
        ])
    }

    fn stats_row(&self, id: &str) -> Line<'static> {
        let text = match self.stats.get(id) {
            Some(stats) => format!(
                "      - CPU: {:.1}% | MEM: {:.1}%",
                stats.cpu_percent, stats.memory_percent
            ),
            None => "      - CPU: -- | MEM: --".to_string(),
        };
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }
}
