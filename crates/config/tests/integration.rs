//! Integration tests for config

#[cfg(test)]
mod tests {
    use beacon_config::constants::*;
    use beacon_config::*;
    use beacon_errors::ConfigError;
    use beacon_types::Level;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in ALL_ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client.batch_size, 10);
        assert_eq!(config.client.flush_interval_ms, 5_000);
        assert_eq!(config.rate_limit.per_minute, 40);
        assert_eq!(config.rate_limit.scope, RateLimitScope::Global);
        assert_eq!(config.limits.max_message_chars, 500);
        assert_eq!(config.sampling.rates.get("performance"), Some(&0.2));
        assert_eq!(config.dedup.policy, DedupPolicyKind::Message);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[client]
batch_size = 25
flush_interval_ms = 1000
min_level = "info"

[sampling]
seed = 7

[sampling.rates]
performance = 0.5
ui_flow = 1.0

[rate_limit]
per_minute = 100
scope = "per_level"

[dedup]
policy = "context"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.client.batch_size, 25);
        assert_eq!(config.client.min_level, Level::Info);
        // Unset fields in a present section keep their defaults
        assert_eq!(config.client.max_queue_len, 1_000);
        assert_eq!(config.sampling.seed, Some(7));
        assert_eq!(config.sampling.rates.get("performance"), Some(&0.5));
        assert_eq!(config.rate_limit.scope, RateLimitScope::PerLevel);
        assert_eq!(config.dedup.policy, DedupPolicyKind::Context);
        assert_eq!(config.dedup.window_ms, 3_000);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/beacon.toml")).await;
        assert!(matches!(
            result,
            Err(beacon_errors::Error::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_io_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from_file(dir.path()).await;
        match result {
            Err(beacon_errors::Error::Io { path, .. }) => {
                assert_eq!(path.as_deref(), Some(dir.path()));
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_out_of_range_sample_rate() {
        let result = Config::from_toml_str("[sampling.rates]\nperformance = 1.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = Config::from_toml_str("[client]\nbatch_size = 0\n");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rate_limit.per_minute = 12;
        config.sink.endpoint = Some("https://example.com/functions/v1/log-event".into());
        config.save_to_file(&path).await.unwrap();

        let reloaded = Config::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.rate_limit.per_minute, 12);
        assert_eq!(reloaded.sink.endpoint, config.sink.endpoint);
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_BATCH_SIZE, "3");
        std::env::set_var(ENV_RATE_LIMIT_SCOPE, "per_level");
        std::env::set_var(ENV_MIN_LEVEL, "warn");
        std::env::set_var(ENV_SINK_ENDPOINT, "http://localhost:54321/log");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.client.batch_size, 3);
        assert_eq!(config.rate_limit.scope, RateLimitScope::PerLevel);
        assert_eq!(config.client.min_level, Level::Warn);
        assert_eq!(
            config.sink.endpoint.as_deref(),
            Some("http://localhost:54321/log")
        );

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_RATE_LIMIT_PER_MINUTE, "many");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(matches!(
            result,
            Err(beacon_errors::Error::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == ENV_RATE_LIMIT_PER_MINUTE
        ));

        clear_env();
    }
}
