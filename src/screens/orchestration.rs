/// Cluster orchestration panel
///
/// No cluster backend is wired up yet, so the panel reports a fixed status
/// and ignores every message.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span, Text},
};

use crate::core::{Command, Msg};

#[derive(Debug, Clone, Default)]
pub struct OrchestrationDisplay;

impl OrchestrationDisplay {
    pub fn new() -> Self {
        Self
    }

    pub fn init(&self) -> Vec<Command> {
        Vec::new()
    }

    pub fn update(self, _msg: &Msg) -> (Self, Option<Command>) {
        (self, None)
    }

    pub fn view(&self, _width: u16) -> Text<'static> {
        Text::from(vec![
            Line::from(vec![
                Span::raw("Kubernetes status: "),
                Span::styled("down", Style::default().fg(Color::Red)),
            ]),
            Line::from(Span::styled(
                "No cluster configured",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    }
}
