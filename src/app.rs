/// Main TUI application

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{error, info};

use crate::core::{DockerManager, HostMetrics, Key, Msg, PollPolicy, Sampler, Scheduler};
use crate::screens::Dashboard;
use crate::utils::AppConfig;

/// How long the input thread blocks before checking for shutdown
const INPUT_POLL: Duration = Duration::from_millis(100);

pub struct App {
    config: AppConfig,
    docker: DockerManager,
    host: Arc<HostMetrics>,
}

impl App {
    /// Connect to the Docker daemon and prepare the host sampler.
    /// An unreachable daemon is fatal.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let docker = DockerManager::connect(config.timeouts.containers).await?;
        let host = Arc::new(HostMetrics::new(&config.disk_path));
        info!(disk = %host.disk_path().display(), on_failure = ?config.on_failure, "sampler ready");

        Ok(Self { config, docker, host })
    }

    pub async fn run(self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop<B: Backend>(self, terminal: &mut Terminal<B>) -> Result<()> {
        let (events_tx, mut events_rx) = unbounded_channel();

        let size = terminal.size()?;
        let _ = events_tx.send(Msg::Resize {
            width: size.width,
            height: size.height,
        });
        spawn_input_reader(events_tx.clone());

        let sampler = Sampler::new(
            self.host.clone(),
            Arc::new(self.docker.clone()),
            self.config.timeouts.clone(),
        );
        let scheduler = Scheduler::new(sampler, events_tx);

        let mut dashboard = Dashboard::new(PollPolicy::from_config(&self.config), self.docker.memory_total());
        let _ = scheduler.dispatch(dashboard.init());
        terminal.draw(|f| dashboard.render(f))?;

        while let Some(msg) = events_rx.recv().await {
            let (next, commands) = dashboard.update(msg);
            dashboard = next;

            if scheduler.dispatch(commands).is_break() {
                info!("quit requested");
                break;
            }

            terminal.draw(|f| dashboard.render(f))?;
        }

        Ok(())
    }
}

/// Read terminal events on a dedicated thread and post them to the queue
fn spawn_input_reader(events: UnboundedSender<Msg>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        let msg = match event::poll(INPUT_POLL).and_then(|ready| ready.then(event::read).transpose()) {
            Ok(Some(Event::Key(key))) if key.kind == KeyEventKind::Press => Msg::Key(Key::from(key)),
            Ok(Some(Event::Resize(width, height))) => Msg::Resize { width, height },
            Ok(_) => {
                if events.is_closed() {
                    break;
                }
                continue;
            }
            Err(e) => {
                // without input the user could never quit
                error!(error = %e, "terminal input failed, shutting down");
                let _ = events.send(Msg::Key(Key::Interrupt));
                break;
            }
        };

        if events.send(msg).is_err() {
            break;
        }
    })
}
