//! # Mobile Check CLI
//!
//! Runs the checklist upload service and manages its configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

mod commands;
mod config;

use commands::ServeArgs;

#[derive(Parser)]
#[command(name = "mobile-check")]
#[command(version)]
#[command(about = "Upload checklists and share them as mobile-friendly pages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the checklist server
    Serve(ServeArgs),

    /// Display version and build info
    Version,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set the base URL used in upload links
    SetPublicUrl {
        /// Base URL, e.g. https://checks.example.com
        url: String,
    },

    /// Clear the base URL (links use the request host)
    ClearPublicUrl,

    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize logging
    let telemetry_config = mobile_check_telemetry::TelemetryConfig::new("mobile-check")
        .with_log_level(&cli.log_level);

    let telemetry_config = if cli.json_logs {
        telemetry_config.with_json_logs()
    } else {
        telemetry_config
    };

    mobile_check_telemetry::init_logging(&telemetry_config);

    let config_file = cli.config.as_deref();
    let config_path = config::Config::resolve_path(config_file);

    match cli.command {
        Commands::Serve(args) => {
            let cfg = config::Config::load(config_file);
            commands::serve(args, cfg).await?;
        },

        Commands::Version => {
            commands::version();
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                config::show_config(config_file);
            },
            ConfigAction::SetPublicUrl { url } => {
                let mut cfg = config::Config::load(config_file);
                match cfg.set_public_url(&url, &config_path) {
                    Ok(()) => {
                        println!("Public URL set to: {}", url);
                        println!("Config saved to: {}", config_path.display());
                    },
                    Err(e) => {
                        eprintln!("Failed to save config: {}", e);
                    },
                }
            },
            ConfigAction::ClearPublicUrl => {
                let mut cfg = config::Config::load(config_file);
                match cfg.clear_public_url(&config_path) {
                    Ok(()) => {
                        println!("Public URL cleared.");
                    },
                    Err(e) => {
                        eprintln!("Failed to save config: {}", e);
                    },
                }
            },
            ConfigAction::Path => {
                println!("{}", config_path.display());
            },
        },
    }

    Ok(())
}
