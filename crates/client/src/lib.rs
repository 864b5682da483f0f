#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Client-side telemetry pipeline
//!
//! [`TelemetryClient::track`] takes an [`EventInput`] through
//!
//! 1. intake: required fields, level floor, length limits
//! 2. context merge (base, provider snapshot, per-call) and PII scrubbing
//! 3. admission: sampling, per-minute rate limit, deduplication
//! 4. the queue, from which the scheduler flushes batches to a [`Sink`]
//!
//! Nothing on this path panics or returns an error to the caller. Rejections
//! are ordinary [`Admission`] outcomes and delivery failures end up in a
//! [`FlushReport`].
//!
//! ```no_run
//! # async fn demo() {
//! use beacon_client::TelemetryClient;
//! use beacon_sink::TracingSink;
//! use beacon_types::{EventInput, Level};
//!
//! let client = TelemetryClient::builder(TracingSink::new()).build();
//! client.track(EventInput::new("ui_flow", Level::Info, "wallet opened"));
//! let report = client.shutdown().await;
//! assert!(report.is_clean());
//! # }
//! ```

mod client;
pub mod clock;
pub mod intake;
pub mod provider;
pub mod report;
mod scheduler;

pub use client::{TelemetryClient, TelemetryClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use intake::{Admission, Intake, RejectReason, Validated};
pub use provider::ContextProvider;
pub use report::{DeliveryFailure, FlushReport, TelemetryStats};
pub use scheduler::SchedulerState;

pub use beacon_config::Config;
pub use beacon_sink::Sink;
pub use beacon_types::EventInput;
