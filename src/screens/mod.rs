pub mod containers;
pub mod dashboard;
pub mod orchestration;
pub mod system;

// The dashboard is one screen made of three stacked panels:
// - System: CPU, memory, swap and disk gauges
// - Containers: Docker container list with per-container stats
// - Orchestration: cluster status
//
// Each panel is a reducer with `init`, `update` and `view`; `Dashboard`
// broadcasts messages to them and composes their views.

pub use containers::{ContainersDisplay, Selection};
pub use dashboard::Dashboard;
pub use orchestration::OrchestrationDisplay;
pub use system::SystemDisplay;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::core::SampleError;

/// Panel error line with its dismiss hint
pub(crate) fn error_line(error: &SampleError) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("Status: {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" (press esc to dismiss)", Style::default().fg(Color::DarkGray)),
    ])
}

/// Unstyled content of each line, for assertions
#[cfg(test)]
pub(crate) fn plain_lines(text: &ratatui::text::Text) -> Vec<String> {
    text.lines
        .iter()
        .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
        .collect()
}
