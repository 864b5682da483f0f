//! Delivery to several sinks at once

use async_trait::async_trait;
use beacon_errors::SinkError;
use beacon_types::TelemetryEvent;
use std::sync::Arc;

use crate::Sink;

/// Delivers each event to every inner sink, in order.
///
/// All sinks are attempted even when one fails; the first failure is
/// returned.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanoutSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Sink for FanoutSink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.log_event(event).await {
                tracing::debug!(sink = sink.name(), error = %err, "fanout member failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn name(&self) -> &str {
        "fanout"
    }
}
