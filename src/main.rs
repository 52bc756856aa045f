//! orform - Structured OR records from dictated transcripts
//!
//! Entry point for the orform CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use orform::cli::{Cli, Commands};
use orform::config::Settings;

fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            orform::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            let level = if cli.verbose {
                "debug"
            } else {
                settings.general.log_level.as_str()
            };
            init_logging(level);

            // Execute command
            match command {
                Commands::Extract {
                    input,
                    predictions,
                    compact,
                } => {
                    orform::cli::commands::extract_command(&settings, input, predictions, compact)
                        .await?;
                }
                Commands::Align {
                    input,
                    predictions,
                    json,
                } => {
                    orform::cli::commands::align_command(input, &predictions, json)?;
                }
                Commands::Corrections(corrections_cmd) => {
                    orform::cli::commands::corrections_command(&settings, corrections_cmd)?;
                }
                Commands::Model(model_cmd) => {
                    orform::cli::commands::model_command(&settings, model_cmd)?;
                }
                Commands::Config(config_cmd) => {
                    orform::cli::commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
