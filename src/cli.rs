/// CLI argument parsing

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::{AppConfig, FailurePolicy};

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/hostwatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do after a failed poll
    #[arg(long, value_enum, global = true)]
    pub on_failure: Option<FailurePolicy>,

    /// Filesystem whose mount is reported as disk usage
    #[arg(long, global = true)]
    pub disk_path: Option<PathBuf>,

    /// Write the dashboard log here instead of the cache directory
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Sample every metric once and print it
    Snapshot {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration
    View,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

impl Cli {
    /// Config file to read, honoring --config
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => AppConfig::config_path(),
        }
    }

    /// Load the config file and layer command-line flags on top
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config_path()?)?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(policy) = self.on_failure {
            config.on_failure = policy;
        }
        if let Some(path) = &self.disk_path {
            config.disk_path = path.clone();
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_runs_dashboard() {
        let cli = Cli::try_parse_from(["hostwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.on_failure.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hostwatch", "snapshot", "--json", "--on-failure", "stop"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Snapshot { json: true }));
        assert_eq!(cli.on_failure, Some(FailurePolicy::Stop));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["hostwatch", "--on-failure", "sometimes"]).is_err());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = Cli::try_parse_from([
            "hostwatch",
            "--on-failure",
            "stop",
            "--disk-path",
            "/var",
            "--log-file",
            "/tmp/hw.log",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.on_failure, FailurePolicy::Stop);
        assert_eq!(config.disk_path, Path::new("/var"));
        assert_eq!(config.log_file.as_deref(), Some(Path::new("/tmp/hw.log")));
    }

    #[test]
    fn test_load_config_from_flag_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "on_failure = \"stop\"\n").unwrap();

        let cli = Cli::try_parse_from(["hostwatch", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.on_failure, FailurePolicy::Stop);
    }
}
