//! Command line interface definition

use beacon_types::{Level, Value};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// beacon - client telemetry pipeline
#[derive(Parser)]
#[command(name = "beacon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replay and inspect client telemetry through the beacon pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Track every event of a JSON-lines file, then shut down and report
    Replay {
        /// File with one JSON event object per line
        file: PathBuf,

        /// Deliver to this `log_event` endpoint instead of the log
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,

        /// API key sent in the `apikey` header
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Bearer token sent with every request
        #[arg(long, value_name = "TOKEN")]
        access_token: Option<String>,

        /// Base context entry; VALUE is parsed as JSON, falling back to a string
        #[arg(long = "base", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        base: Vec<(String, Value)>,

        /// Drop events below this level
        #[arg(long, value_enum)]
        min_level: Option<Level>,
    },

    /// Print the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        show_path: bool,
    },
}

/// Parse a `KEY=VALUE` pair for `--base`.
pub fn parse_key_val(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
