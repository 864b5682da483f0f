//! Integration tests for sink crate

#[cfg(test)]
mod tests {
    use beacon_errors::UserFacingError;
    use beacon_sink::*;
    use beacon_types::{json, Category, Level, TelemetryEvent, Uuid};
    use chrono::Utc;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn event(message: &str) -> TelemetryEvent {
        TelemetryEvent {
            event_id: Uuid::new_v4(),
            category: Category::UI_FLOW,
            level: Level::Info,
            message: message.to_string(),
            context: json!({"screen": "Wallet"}).as_object().cloned().unwrap(),
            request_id: None,
            session_id: Some("s-1".into()),
            trace_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::pair();
        for msg in ["a", "b", "c"] {
            sink.log_event(&event(msg)).await.unwrap();
        }
        let got: Vec<String> = (0..3).map(|_| rx.try_recv().unwrap().message).collect();
        assert_eq!(got, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::pair();
        drop(rx);
        let err = sink.log_event(&event("lost")).await.unwrap_err();
        assert_eq!(err, SinkError::Closed);
        assert_eq!(err.user_code(), Some("sink.closed"));
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_every_level() {
        let sink = TracingSink::new();
        for level in Level::ALL {
            let mut e = event("level check");
            e.level = level;
            sink.log_event(&e).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_http_sink_posts_event_with_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/functions/v1/log_event")
                    .header("apikey", "anon-key")
                    .header("authorization", "Bearer session-token")
                    .header("content-type", "application/json")
                    .body_contains("\"message\":\"opened wallet\"")
                    .body_contains("\"session_id\":\"s-1\"");
                then.status(200);
            })
            .await;

        let config = HttpSinkConfig::new(server.url("/functions/v1/log_event"))
            .with_api_key("anon-key");
        let sink = HttpSink::new(config)
            .unwrap()
            .with_session_provider(Arc::new(StaticToken("session-token".into())));

        sink.log_event(&event("opened wallet")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_sink_maps_non_success_to_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/log_event");
                then.status(503).body("overloaded");
            })
            .await;

        let sink = HttpSink::new(HttpSinkConfig::new(server.url("/log_event"))).unwrap();
        let err = sink.log_event(&event("x")).await.unwrap_err();
        assert_eq!(err, SinkError::rejected(503, "overloaded"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_http_sink_keeps_only_body_prefix() {
        let server = MockServer::start_async().await;
        let body = format!("{}{}", "é".repeat(300), "x".repeat(100_000));
        server
            .mock_async(|when, then| {
                when.method(POST).path("/log_event");
                then.status(400).body(body.as_str());
            })
            .await;

        let sink = HttpSink::new(HttpSinkConfig::new(server.url("/log_event"))).unwrap();
        let err = sink.log_event(&event("big")).await.unwrap_err();
        match err {
            SinkError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.chars().count(), 512);
                assert!(message.starts_with(&"é".repeat(300)));
                assert!(message.ends_with('x'));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_sink_without_session_sends_no_bearer() {
        let server = MockServer::start_async().await;
        let with_auth = server
            .mock_async(|when, then| {
                when.method(POST).path("/log_event").header_exists("authorization");
                then.status(401);
            })
            .await;
        let without_auth = server
            .mock_async(|when, then| {
                when.method(POST).path("/log_event");
                then.status(204);
            })
            .await;

        let sink = HttpSink::new(HttpSinkConfig::new(server.url("/log_event"))).unwrap();
        sink.log_event(&event("anon")).await.unwrap();
        with_auth.assert_hits_async(0).await;
        without_auth.assert_async().await;
    }

    #[test]
    fn test_http_config_from_sink_section() {
        let section = beacon_config::SinkConfig {
            endpoint: Some("  ".into()),
            api_key: Some("k".into()),
        };
        assert!(HttpSinkConfig::from_sink_config(&section).is_none());

        let section = beacon_config::SinkConfig {
            endpoint: Some("https://example.test/log_event".into()),
            api_key: Some("k".into()),
        };
        let config = HttpSinkConfig::from_sink_config(&section).unwrap();
        assert_eq!(config.endpoint, "https://example.test/log_event");
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_fanout_attempts_all_and_returns_first_error() {
        let (ok_sink, mut rx) = ChannelSink::pair();
        let (closed_sink, closed_rx) = ChannelSink::pair();
        drop(closed_rx);

        let fanout = FanoutSink::default()
            .with(Arc::new(closed_sink))
            .with(Arc::new(ok_sink));
        let err = fanout.log_event(&event("both")).await.unwrap_err();
        assert_eq!(err, SinkError::Closed);
        assert_eq!(rx.try_recv().unwrap().message, "both");
        assert_eq!(fanout.len(), 2);
    }
}
