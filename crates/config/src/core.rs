//! Configuration sections shared by the pipeline crates

use beacon_types::Level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Batching and flush scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_max_queue_len")]
    pub max_queue_len: usize, // 0 = unbounded
    #[serde(default = "default_sink_timeout_ms")]
    pub sink_timeout_ms: u64,
    #[serde(default = "default_min_level")]
    pub min_level: Level,
}

impl ClientConfig {
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    #[must_use]
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval_ms: 5_000,
            max_queue_len: 1_000,
            sink_timeout_ms: 10_000,
            min_level: Level::Debug,
        }
    }
}

/// Field length limits applied at intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_max_identifier_chars")]
    pub max_identifier_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 500,
            max_identifier_chars: 128,
        }
    }
}

/// Per-category keep probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_sample_rates")]
    pub rates: BTreeMap<String, f64>,
    /// Fixed RNG seed; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rates: default_sample_rates(),
            seed: None,
        }
    }
}

/// How the per-minute ceiling is counted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One counter shared by every level.
    #[default]
    Global,
    /// An independent counter for each level.
    PerLevel,
}

impl std::str::FromStr for RateLimitScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "per_level" | "per-level" => Ok(Self::PerLevel),
            other => Err(format!("unknown rate limit scope: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_per_minute")]
    pub per_minute: u32,
    #[serde(default)]
    pub scope: RateLimitScope,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 40,
            scope: RateLimitScope::Global,
        }
    }
}

/// What goes into a dedup fingerprint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicyKind {
    /// Category, level and message.
    #[default]
    Message,
    /// Message fields plus a truncated canonical rendering of the context.
    Context,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_window_ms")]
    pub window_ms: u64,
    #[serde(default)]
    pub policy: DedupPolicyKind,
    #[serde(default = "default_dedup_context_chars")]
    pub context_chars: usize,
    #[serde(default = "default_dedup_max_entries")]
    pub max_entries: usize,
}

impl DedupConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_ms: 3_000,
            policy: DedupPolicyKind::Message,
            context_chars: 256,
            max_entries: 1_000,
        }
    }
}

/// PII scrubbing bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_string_chars")]
    pub max_string_chars: usize,
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,
    /// Additional key fragments to redact on top of the built-in list.
    #[serde(default)]
    pub extra_denied_keys: Vec<String>,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_string_chars: 256,
            max_array_len: 50,
            extra_denied_keys: Vec::new(),
        }
    }
}

/// HTTP delivery target
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SinkConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

// Default value functions for serde
fn default_batch_size() -> usize {
    10
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_max_queue_len() -> usize {
    1_000
}

fn default_sink_timeout_ms() -> u64 {
    10_000
}

fn default_min_level() -> Level {
    Level::Debug
}

fn default_max_message_chars() -> usize {
    500
}

fn default_max_identifier_chars() -> usize {
    128
}

fn default_sample_rates() -> BTreeMap<String, f64> {
    BTreeMap::from([("performance".to_string(), 0.2)])
}

fn default_rate_limit_per_minute() -> u32 {
    40
}

fn default_dedup_window_ms() -> u64 {
    3_000
}

fn default_dedup_context_chars() -> usize {
    256
}

fn default_dedup_max_entries() -> usize {
    1_000
}

fn default_max_depth() -> usize {
    4
}

fn default_max_string_chars() -> usize {
    256
}

fn default_max_array_len() -> usize {
    50
}
