//! Environment variables recognised by [`crate::Config::merge_env`]

pub const ENV_BATCH_SIZE: &str = "BEACON_BATCH_SIZE";
pub const ENV_FLUSH_INTERVAL_MS: &str = "BEACON_FLUSH_INTERVAL_MS";
pub const ENV_MIN_LEVEL: &str = "BEACON_MIN_LEVEL";
pub const ENV_RATE_LIMIT_PER_MINUTE: &str = "BEACON_RATE_LIMIT_PER_MINUTE";
pub const ENV_RATE_LIMIT_SCOPE: &str = "BEACON_RATE_LIMIT_SCOPE";
pub const ENV_SAMPLE_SEED: &str = "BEACON_SAMPLE_SEED";
pub const ENV_SINK_ENDPOINT: &str = "BEACON_SINK_ENDPOINT";
pub const ENV_SINK_API_KEY: &str = "BEACON_SINK_API_KEY";

/// Every variable above, for tests and diagnostics.
pub const ALL_ENV_VARS: [&str; 8] = [
    ENV_BATCH_SIZE,
    ENV_FLUSH_INTERVAL_MS,
    ENV_MIN_LEVEL,
    ENV_RATE_LIMIT_PER_MINUTE,
    ENV_RATE_LIMIT_SCOPE,
    ENV_SAMPLE_SEED,
    ENV_SINK_ENDPOINT,
    ENV_SINK_API_KEY,
];
