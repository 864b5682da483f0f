//! Integration tests for error types

#[cfg(test)]
mod tests {
    use beacon_errors::*;

    #[test]
    fn test_error_conversion() {
        let sink_err = SinkError::Timeout { millis: 250 };
        let err: Error = sink_err.into();
        assert!(matches!(err, Error::Sink(_)));
        assert_eq!(err.user_code(), Some("sink.timeout"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SinkError::rejected(503, "unavailable");
        assert_eq!(
            err.to_string(),
            "sink rejected event with status 503: unavailable"
        );
    }

    #[test]
    fn test_rejection_retryability() {
        assert!(SinkError::rejected(500, "boom").is_retryable());
        assert!(SinkError::rejected(429, "slow down").is_retryable());
        assert!(!SinkError::rejected(400, "bad payload").is_retryable());
        assert!(!SinkError::Closed.is_retryable());
    }

    #[test]
    fn test_auth_rejection_has_hint() {
        let err = SinkError::rejected(401, "jwt expired");
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_env_config_error_hint() {
        let err = ConfigError::InvalidValue {
            field: "BEACON_BATCH_SIZE".into(),
            value: "lots".into(),
        };
        assert_eq!(
            err.user_hint(),
            Some("Fix or unset the environment variable noted in the error message.")
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(&io_err, "/etc/beacon/config.toml");
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(err.user_message(), "/etc/beacon/config.toml: denied");
        assert_eq!(err.user_code(), Some("error.io"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_interrupted_io_is_retryable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr");
        assert!(Error::io_with_path(&io_err, "events.jsonl").is_retryable());
    }
}
