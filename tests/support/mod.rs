//! Shared helpers for the end-to-end tests

#![allow(dead_code)]

use beacon_client::TelemetryClient;
use beacon_config::Config;
use beacon_sink::{ChannelSink, EventReceiver};
use beacon_types::{ContextMap, TelemetryEvent, Value};
use std::io::Write;
use tempfile::NamedTempFile;

/// Write `toml` to a temp file and load it the way the CLI does.
pub async fn config_from_file(toml: &str) -> (Config, NamedTempFile) {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(toml.as_bytes()).expect("write temp config");
    let config = Config::load_from_file(file.path())
        .await
        .expect("load temp config");
    (config, file)
}

/// A client delivering into a channel.
pub fn channel_client(config: Config, base: ContextMap) -> (TelemetryClient, EventReceiver) {
    let (sink, rx) = ChannelSink::pair();
    let client = TelemetryClient::builder(sink)
        .config(config)
        .base_context(base)
        .build();
    (client, rx)
}

/// Everything currently sitting in the channel.
pub fn drain(rx: &mut EventReceiver) -> Vec<TelemetryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn object(value: Value) -> ContextMap {
    value.as_object().cloned().unwrap_or_default()
}
