/// Main dashboard screen
///
/// Root of the reducer tree. Owns the terminal size and the three panels,
/// forwards every message to each panel in a fixed order and stacks their
/// views vertically.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::{Command, Key, Msg, PollPolicy};
use crate::screens::{ContainersDisplay, OrchestrationDisplay, SystemDisplay};

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub width: u16,
    pub height: u16,
    pub system: SystemDisplay,
    pub containers: ContainersDisplay,
    pub orchestration: OrchestrationDisplay,
}

impl Dashboard {
    pub fn new(policy: PollPolicy, docker_memory: Option<u64>) -> Self {
        Self {
            width: 0,
            height: 0,
            system: SystemDisplay::new(policy.clone()),
            containers: ContainersDisplay::new(policy, docker_memory),
            orchestration: OrchestrationDisplay::new(),
        }
    }

    /// Startup commands of every panel
    pub fn init(&self) -> Vec<Command> {
        let mut commands = self.system.init();
        commands.extend(self.containers.init());
        commands.extend(self.orchestration.init());
        commands
    }

    pub fn update(mut self, msg: Msg) -> (Self, Vec<Command>) {
        match msg {
            Msg::Key(Key::Char('q')) | Msg::Key(Key::Interrupt) => return (self, vec![Command::Quit]),
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
            _ => {}
        }

        let mut commands = Vec::new();

        let (system, command) = self.system.update(&msg);
        self.system = system;
        commands.extend(command);

        let (containers, command) = self.containers.update(&msg);
        self.containers = containers;
        commands.extend(command);

        let (orchestration, command) = self.orchestration.update(&msg);
        self.orchestration = orchestration;
        commands.extend(command);

        (self, commands)
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();
        // before the first resize arrives, use whatever the frame offers
        let width = match self.width {
            0 => area.width,
            width => width.min(area.width),
        };
        let inner_width = width.saturating_sub(2);

        let panels = [
            (" System ", self.system.view(inner_width)),
            (" Containers ", self.containers.view(inner_width)),
            (" Orchestration ", self.orchestration.view(inner_width)),
        ];

        let constraints: Vec<Constraint> = panels
            .iter()
            .map(|(_, text)| Constraint::Length(text.height() as u16 + 2))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(Rect { width, ..area });

        for ((title, text), chunk) in panels.into_iter().zip(chunks.iter()) {
            frame.render_widget(panel(title, text), *chunk);
        }
    }
}

fn panel(title: &'static str, text: Text<'static>) -> Paragraph<'static> {
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    Paragraph::new(text).block(block)
}
