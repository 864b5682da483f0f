//! Replay a JSON-lines event file through a telemetry client

use beacon_client::{Config, TelemetryClient, TelemetryStats};
use beacon_sink::{HttpSink, HttpSinkConfig, Sink, StaticToken, TracingSink};
use beacon_types::{ContextMap, EventInput, Uuid, Value};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CliError;

/// A delivery failure, flattened for output.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEvent {
    pub event_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub file: PathBuf,
    pub sink: String,
    pub lines: u64,
    pub invalid_json: u64,
    pub stats: TelemetryStats,
    /// Failures of the final drain; earlier passes only show up in `stats`.
    pub failures: Vec<FailedEvent>,
}

/// Sink for the replay: HTTP when an endpoint is configured, the log otherwise.
pub fn build_sink(config: &Config, access_token: Option<String>) -> Result<Arc<dyn Sink>, CliError> {
    let Some(http) = HttpSinkConfig::from_sink_config(&config.sink) else {
        return Ok(Arc::new(TracingSink::new()));
    };
    let mut sink = HttpSink::new(http.with_timeout(config.client.sink_timeout()))?;
    if let Some(token) = access_token {
        sink = sink.with_session_provider(Arc::new(StaticToken(token)));
    }
    Ok(Arc::new(sink))
}

/// Track every non-blank line. Returns `(lines, invalid_json)`.
pub fn track_lines(client: &TelemetryClient, contents: &str) -> (u64, u64) {
    let mut lines = 0;
    let mut invalid = 0;
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines += 1;
        match serde_json::from_str::<EventInput>(line) {
            Ok(input) => {
                let admission = client.track(input);
                debug!(line = number + 1, ?admission, "tracked line");
            }
            Err(e) => {
                invalid += 1;
                debug!(line = number + 1, error = %e, "skipping invalid JSON line");
            }
        }
    }
    (lines, invalid)
}

pub async fn run(
    config: &Config,
    file: &Path,
    base: Vec<(String, Value)>,
    access_token: Option<String>,
) -> Result<ReplaySummary, CliError> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| beacon_errors::Error::io_with_path(&e, file))?;
    let sink = build_sink(config, access_token)?;
    let sink_name = sink.name().to_string();

    let client = TelemetryClient::builder(sink)
        .config(config.clone())
        .base_context(base.into_iter().collect::<ContextMap>())
        .build();

    let (lines, invalid_json) = track_lines(&client, &contents);
    info!(file = %file.display(), lines, invalid_json, "replay tracked, draining");

    let report = client.shutdown().await;
    Ok(ReplaySummary {
        file: file.to_path_buf(),
        sink: sink_name,
        lines,
        invalid_json,
        stats: client.stats(),
        failures: report
            .failures
            .into_iter()
            .map(|f| FailedEvent {
                event_id: f.event_id,
                error: f.error.to_string(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_sink::ChannelSink;
    use beacon_types::json;
    use std::io::Write;

    const SAMPLE: &str = r#"
{"category": "ui_flow", "level": "info", "message": "app opened"}
not json at all
{"category": "ui_flow", "level": "info"}

{"category": "network", "level": "error", "message": "upload failed", "context": {"status": 502}}
"#;

    #[test]
    fn track_lines_counts_invalid_json_separately() {
        let (sink, _rx) = ChannelSink::pair();
        let client = TelemetryClient::builder(sink).build();
        let (lines, invalid) = track_lines(&client, SAMPLE);
        assert_eq!(lines, 4);
        assert_eq!(invalid, 1);
        assert_eq!(client.stats().accepted, 2);
        assert_eq!(client.stats().malformed, 1);
    }

    #[test]
    fn tracing_sink_without_endpoint() {
        let sink = build_sink(&Config::default(), None).unwrap();
        assert_eq!(sink.name(), "tracing");
    }

    #[tokio::test]
    async fn run_replays_file_with_base_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let summary = run(
            &Config::default(),
            file.path(),
            vec![("platform".into(), json!("android"))],
            None,
        )
        .await
        .unwrap();
        assert_eq!(summary.sink, "tracing");
        assert_eq!(summary.stats.delivered, 2);
        assert!(summary.failures.is_empty());
    }

    #[tokio::test]
    async fn run_reports_unreadable_file_with_path() {
        let missing = Path::new("/nonexistent/events.jsonl");
        let err = run(&Config::default(), missing, Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            CliError::Core(beacon_errors::Error::Io { path: Some(p), .. }) if p == missing
        ));
        assert!(err.to_string().contains("/nonexistent/events.jsonl"));
    }
}
