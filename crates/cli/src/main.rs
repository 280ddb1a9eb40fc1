//! MediScreen CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Interactive patient intake session (default)
//! - `lookup` : Query the patient archive directly
//! - `onboard`: Write a default config file
//! - `doctor` : Diagnose configuration and environment

use clap::{Parser, Subcommand};
use mediscreen_config::AppConfig;
use std::path::{Path, PathBuf};

mod commands;

#[derive(Parser)]
#[command(
    name = "mediscreen",
    about = "MediScreen — AI clinical intake and triage",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging (on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config.toml (default: ~/.mediscreen/config.toml)
    #[arg(short, long, global = true, env = "MEDISCREEN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive intake session
    Run,

    /// Print the archived history for a patient
    Lookup {
        /// Patient identifier, e.g. PT-1004
        patient_id: String,
    },

    /// Write a default configuration file
    Onboard,

    /// Diagnose configuration and environment
    Doctor,
}

pub(crate) fn load_config(
    path: Option<&Path>,
) -> Result<AppConfig, mediscreen_config::ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout belongs to the patient conversation
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config =
                load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
            commands::run::run(config).await?
        }
        Commands::Lookup { patient_id } => {
            let config =
                load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
            commands::lookup::run(&config, &patient_id).await?
        }
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
