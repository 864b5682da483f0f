//! beacon - client telemetry pipeline CLI
//!
//! Replays recorded events through a telemetry client and prints what the
//! pipeline did with them, or shows the effective configuration.

mod cli;
mod display;
mod error;
mod replay;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use beacon_config::Config;
use clap::Parser;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting beacon v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: file (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.command)?;

    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Replay {
            file,
            base,
            access_token,
            ..
        } => {
            let summary = replay::run(&config, &file, base, access_token).await?;
            renderer.render_replay(&summary)?;
        }
        Commands::Config { show_path } => {
            let path = match cli.global.config {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let toml = config.to_toml_string()?;
            renderer.render_config(&config, &toml, &path, show_path)?;
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, command: &Commands) -> Result<(), CliError> {
    if let Commands::Replay {
        endpoint,
        api_key,
        min_level,
        ..
    } = command
    {
        if let Some(endpoint) = endpoint {
            if endpoint.trim().is_empty() {
                return Err(CliError::InvalidArguments(
                    "--endpoint must not be empty".to_string(),
                ));
            }
            config.sink.endpoint = Some(endpoint.clone());
        }
        if let Some(api_key) = api_key {
            config.sink.api_key = Some(api_key.clone());
        }
        if let Some(level) = min_level {
            config.client.min_level = *level;
        }
    }

    config.validate()?;
    Ok(())
}

fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,beacon=debug"
    } else {
        "warn,beacon=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr so JSON output on stdout stays parseable.
    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
