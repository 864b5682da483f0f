#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Delivery targets for telemetry events
//!
//! A [`Sink`] receives admitted events one at a time, in queue order. Sinks
//! report failures through [`SinkError`]; the flush scheduler records them and
//! moves on, so a sink never needs to retry or buffer on its own.
//!
//! - [`ChannelSink`] forwards to an in-process channel (tests, UI overlays)
//! - [`TracingSink`] writes structured `tracing` records
//! - [`HttpSink`] posts JSON to a remote `log_event` endpoint
//! - [`FanoutSink`] delivers to several sinks

pub mod channel;
pub mod fanout;
pub mod http;
pub mod tracing_sink;

pub use beacon_errors::SinkError;
pub use channel::{channel, ChannelSink, EventReceiver, EventSender};
pub use fanout::FanoutSink;
pub use http::{HttpSink, HttpSinkConfig, SessionProvider, StaticToken};
pub use tracing_sink::TracingSink;

use async_trait::async_trait;
use beacon_types::TelemetryEvent;
use std::sync::Arc;

/// Destination for admitted events.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the event could not be delivered. The
    /// caller drops the event after recording the failure.
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError>;

    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        (**self).log_event(event).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Box<S> {
    async fn log_event(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        (**self).log_event(event).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
