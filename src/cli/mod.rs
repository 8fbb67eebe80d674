// CLI module - User-facing command-line interface

mod output;

use crate::actor::{Actor, LOG_NOW_ACTION};
use crate::clock::LocalClock;
use crate::config::RunnerConfig;
use crate::logger::DataLogger;
use crate::reader::read_last_rows;
use crate::scheduler::TaskRunner;
use crate::sensors::SystemSensors;
use crate::storage::{FsStorage, Storage};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

type SystemLogger = DataLogger<FsStorage, SystemSensors, LocalClock>;

/// sensorlog - Periodic sensor data logger writing CSV files
#[derive(Parser)]
#[command(name = "sensorlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Runner settings file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage root directory (overrides the runner settings)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the logger until interrupted
    Run {
        /// Scheduler tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Show or change the logger settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Take one sample immediately
    LogNow,

    /// Show the last rows of the data file
    Tail {
        /// Number of rows to display
        #[arg(short = 'n', long, default_value = "10")]
        lines: usize,
    },

    /// Print the logger's actor description as JSON
    Describe,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current settings
    Show,
    /// Replace the settings with a JSON document
    Set {
        /// Settings JSON, e.g. '{"fileName":"a.csv","enabled":true,"samplingPeriod":5000}'
        json: String,

        /// Apply without writing the settings file
        #[arg(long)]
        no_save: bool,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let runner_config = self.runner_config()?;
        init_tracing(&runner_config.log_level);

        let mut logger = build_logger(&runner_config);

        let started = if self.is_read_only() {
            logger.load_settings()
        } else {
            logger.begin()
        };

        if let Err(e) = started {
            // A broken settings file can still be replaced with `config set`
            if !matches!(self.command, Commands::Config { command: ConfigCommands::Set { .. } }) {
                return Err(e).context("Failed to start logger");
            }
            output::print_warning(&format!("Existing settings ignored: {}", e));
        }

        match &self.command {
            Commands::Run { .. } => {
                if !logger.config().enabled {
                    output::print_info(
                        "Logging is disabled; enable it with `sensorlog config set`",
                    );
                }
                output::print_info(&format!(
                    "Logging to {} (Ctrl-C to stop)",
                    runner_config.root.join(logger.data_path().trim_start_matches('/')).display()
                ));

                let logger = Arc::new(Mutex::new(logger));
                let runner = TaskRunner::new(runner_config.tick());
                runner
                    .run(logger, async {
                        if let Err(e) = tokio::signal::ctrl_c().await {
                            tracing::error!("Failed to listen for Ctrl-C: {}", e);
                        }
                    })
                    .await?;

                output::print_success_msg("Logger stopped");
                Ok(())
            }

            Commands::Config { command } => match command {
                ConfigCommands::Show => {
                    let free_space = logger.storage().free_space().ok();
                    output::print_config(logger.config(), logger.data_path(), free_space);
                    Ok(())
                }
                ConfigCommands::Set { json, no_save } => {
                    logger
                        .set_config(json, !no_save)
                        .context("Failed to apply settings")?;
                    output::print_success_msg("Settings updated");
                    output::print_config(logger.config(), logger.data_path(), None);
                    Ok(())
                }
            },

            Commands::LogNow => {
                let response = logger
                    .handle_action(LOG_NOW_ACTION, "")
                    .context("Failed to log sample")?;
                output::print_success_msg(&format!("Sample logged: {}", response));
                Ok(())
            }

            Commands::Tail { lines } => {
                let tail = read_last_rows(logger.storage(), logger.data_path(), *lines)
                    .context("Failed to read data file")?;
                output::print_rows(&tail);
                Ok(())
            }

            Commands::Describe => {
                let description = serde_json::to_string_pretty(&logger.description())?;
                println!("{}", description);
                Ok(())
            }
        }
    }

    /// Commands that only inspect the settings or the data file
    fn is_read_only(&self) -> bool {
        matches!(
            self.command,
            Commands::Config {
                command: ConfigCommands::Show
            } | Commands::Tail { .. }
                | Commands::Describe
        )
    }

    /// Load the runner settings and apply command-line overrides
    fn runner_config(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => RunnerConfig::default(),
        };

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Commands::Run { tick_ms: Some(tick_ms) } = self.command {
            config.tick_ms = tick_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Build a logger over the local filesystem and system sensors
fn build_logger(config: &RunnerConfig) -> SystemLogger {
    let mut storage = FsStorage::new(&config.root);
    if let Some(limit) = config.free_space_limit {
        storage = storage.with_free_space(limit);
    }

    DataLogger::new(storage, SystemSensors::new(), LocalClock)
}

/// Install the tracing subscriber, preferring RUST_LOG when set
fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .try_init();
}
