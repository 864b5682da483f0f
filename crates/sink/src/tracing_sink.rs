//! Structured logging sink
//!
//! Writes each event as a `tracing` record under the `beacon::event` target,
//! at the level matching the event. `fatal` maps to `ERROR`.

use async_trait::async_trait;
use beacon_errors::SinkError;
use beacon_types::{Level, TelemetryEvent};
use tracing::{debug, error, info, warn};

use crate::Sink;

macro_rules! emit {
    ($macro:ident, $event:expr, $context:expr) => {
        $macro!(
            target: "beacon::event",
            event_id = %$event.event_id,
            category = %$event.category,
            level = $event.level.as_str(),
            request_id = ?$event.request_id,
            session_id = ?$event.session_id,
            trace_id = ?$event.trace_id,
            created_at = %$event.created_at.to_rfc3339(),
            context = %$context,
            "{}",
            $event.message
        )
    };
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sink for TracingSink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        let context = serde_json::to_string(&event.context)?;
        match event.level {
            Level::Debug => emit!(debug, event, context),
            Level::Info => emit!(info, event, context),
            Level::Warn => emit!(warn, event, context),
            Level::Error | Level::Fatal => emit!(error, event, context),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
