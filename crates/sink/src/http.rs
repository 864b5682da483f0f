//! HTTP sink for a remote `log_event` endpoint

use async_trait::async_trait;
use beacon_config::SinkConfig;
use beacon_errors::SinkError;
use beacon_types::TelemetryEvent;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::Sink;

/// Most of a rejection body kept in the error.
const MAX_BODY_CHARS: usize = 512;

/// Supplies the bearer token of the current user session, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// A session provider returning a fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl SessionProvider for StaticToken {
    async fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// HTTP sink configuration
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl HttpSinkConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("beacon/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Build from the `[sink]` config section. `None` when no endpoint is set.
    #[must_use]
    pub fn from_sink_config(config: &SinkConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        Some(Self {
            api_key: config.api_key.clone(),
            ..Self::new(endpoint)
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Posts each event as JSON.
///
/// Sends the `apikey` header when configured and a bearer token when a
/// [`SessionProvider`] yields one. Any non-2xx response is a
/// [`SinkError::Rejected`].
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    config: HttpSinkConfig,
    session: Option<Arc<dyn SessionProvider>>,
}

impl HttpSink {
    /// Create a new HTTP sink
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: HttpSinkConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: None,
        })
    }

    #[must_use]
    pub fn with_session_provider(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.config.endpoint)
            .field("api_key", &self.config.api_key.as_ref().map(|_| "***"))
            .field("session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

/// Read at most `MAX_BODY_CHARS` characters of the body, stopping early.
async fn body_prefix(mut response: reqwest::Response) -> String {
    // Enough bytes for MAX_BODY_CHARS characters of any width.
    let byte_limit = MAX_BODY_CHARS * 4;
    let mut buf = Vec::new();
    while buf.len() < byte_limit {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    buf.truncate(byte_limit);
    String::from_utf8_lossy(&buf)
        .chars()
        .take(MAX_BODY_CHARS)
        .collect()
}

#[async_trait]
impl Sink for HttpSink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        let mut request = self.client.post(&self.config.endpoint).json(event);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("apikey", api_key);
        }
        if let Some(session) = &self.session {
            if let Some(token) = session.access_token().await {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SinkError::Timeout {
                    millis: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                SinkError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(event_id = %event.event_id, status = status.as_u16(), "event delivered");
            return Ok(());
        }

        let body = body_prefix(response).await;
        Err(SinkError::rejected(status.as_u16(), body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
