//! In-process channel sink

use async_trait::async_trait;
use beacon_errors::SinkError;
use beacon_types::TelemetryEvent;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::Sink;

/// Sending half of a telemetry channel
pub type EventSender = UnboundedSender<TelemetryEvent>;

/// Receiving half of a telemetry channel
pub type EventReceiver = UnboundedReceiver<TelemetryEvent>;

/// Create a new telemetry channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Forwards every event to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: EventSender,
}

impl ChannelSink {
    #[must_use]
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }

    /// A sink together with the receiver that observes it.
    #[must_use]
    pub fn pair() -> (Self, EventReceiver) {
        let (tx, rx) = channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        self.sender
            .send(event.clone())
            .map_err(|_| SinkError::Closed)
    }

    fn name(&self) -> &str {
        "channel"
    }
}
