//! Delivery errors reported by telemetry sinks

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("sink rejected event with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("sink call timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("sink is closed")]
    Closed,

    #[error("sink panicked: {0}")]
    Panicked(String),

    #[error("failed to encode event: {0}")]
    Encode(String),
}

impl SinkError {
    /// Build a rejection from an HTTP status and response body
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl UserFacingError for SinkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Rejected { status: 401 | 403, .. } => {
                Some("Check the sink API key and the session access token.")
            }
            Self::Rejected { status: 404, .. } => Some("Check the sink endpoint URL."),
            Self::Transport(_) | Self::Timeout { .. } => {
                Some("The telemetry endpoint is unreachable; events were dropped.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Rejected { .. } => "sink.rejected",
            Self::Transport(_) => "sink.transport",
            Self::Timeout { .. } => "sink.timeout",
            Self::Closed => "sink.closed",
            Self::Panicked(_) => "sink.panicked",
            Self::Encode(_) => "sink.encode",
        })
    }
}
