//! Main entry point for the Language Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use language_translator::cli::commands::{self, Commands};
use language_translator::MarianEngine;

/// Language Translator - translate text with pretrained Marian models
#[derive(Parser, Debug)]
#[command(name = "language-translator", version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON or YAML)
    #[arg(short, long, env = "TRANSLATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("language_translator={0},tower_http={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = commands::resolve_config(args.config.as_ref())?;

    // Execute command
    match args.command {
        Some(Commands::Serve { host, port }) => {
            commands::handle_serve(config, host, port, &MarianEngine::loader).await?;
        }
        None => {
            commands::handle_serve(config, None, None, &MarianEngine::loader).await?;
        }
        Some(Commands::Languages) => {
            commands::handle_languages(&config)?;
        }
        Some(Commands::Translate { lang, text }) => {
            commands::handle_translate(&config, lang, text, &MarianEngine::loader).await?;
        }
    }

    Ok(())
}
