use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dodger_core::DodgerSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod replay;
mod scenario;

#[derive(Debug, Parser)]
#[command(name = "dodger-cli")]
pub(crate) struct Args {
    #[command(subcommand)]
    command: Command,

    #[clap(long, default_value = "info")]
    log_level: String,

    /// Also write JSON logs to this file
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded scenario and print the key events
    Replay(replay::ReplayArgs),
    /// Write a settings file with the default values
    InitSettings {
        path: PathBuf,

        #[clap(long, default_value = "false")]
        front_only: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match tracing::Level::from_str(&args.log_level) {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Invalid log level: {}", args.log_level);
            std::process::exit(1);
        }
    };

    // Keep the guard alive so the file writer flushes on exit
    let mut _guard = None;
    let logfile_layer = match &args.log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);
            _guard = Some(guard);
            Some(
                fmt::Layer::default()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking_appender),
            )
        }
        None => None,
    };

    let stdout_layer = fmt::Subscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    stdout_layer
        .with(logfile_layer)
        .try_init()
        .context("Unable to set global tracing subscriber")?;

    if let Some(path) = &args.log_file {
        tracing::info!("Saving logs to {}", path.display());
    }

    match args.command {
        Command::Replay(replay_args) => replay::run(replay_args).await,
        Command::InitSettings { path, front_only } => {
            let settings = if front_only {
                DodgerSettings::front_only()
            } else {
                DodgerSettings::default()
            };
            settings.store(&path)?;
            println!("Wrote settings to {}", path.display());
            Ok(())
        }
    }
}
