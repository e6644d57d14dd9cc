use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use hostwatch::app::App;
use hostwatch::cli::{Cli, Commands, ConfigCommands, VERSION_WITH_BUILD};
use hostwatch::core::{DockerManager, HostMetrics, HostReport, Sampler};
use hostwatch::utils::constants::CPU_BASELINE_DELAY;
use hostwatch::utils::{logging, AppConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None => {
            // No command - run interactive TUI
            let config = cli.load_config()?;
            logging::init_file(&config.log_path())?;
            info!(version = VERSION_WITH_BUILD, "starting dashboard");

            let app = App::new(config).await?;
            app.run().await?;
        }
        Some(Commands::Snapshot { json }) => {
            logging::init_stderr()?;
            let config = cli.load_config()?;
            handle_snapshot(&config, *json).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(&cli, command)?;
        }
    }

    Ok(())
}

async fn handle_snapshot(config: &AppConfig, json: bool) -> Result<()> {
    let docker = DockerManager::connect(config.timeouts.containers).await?;
    let host = Arc::new(HostMetrics::new(&config.disk_path));

    // CPU usage is a delta, give sysinfo something to compare against
    tokio::time::sleep(CPU_BASELINE_DELAY).await;

    let sampler = Sampler::new(host, Arc::new(docker), config.timeouts.clone());
    let report = HostReport::collect(&sampler).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_table());
    }

    Ok(())
}

fn handle_config(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    let path = cli.config_path()?;

    match command {
        ConfigCommands::View => {
            let config = cli.load_config()?;
            println!("{}", format!("# {}", path.display()).dimmed());
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{} {} already exists (use --force to overwrite)",
                    "!".yellow().bold(),
                    path.display()
                );
                return Ok(());
            }
            AppConfig::default().save_to(&path)?;
            println!("{} Wrote default config to {}", "✓".green().bold(), path.display());
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}
