#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the beacon telemetry pipeline
//!
//! This crate provides the event shapes shared by every stage: the loose
//! [`EventInput`] accepted at intake, the admitted [`TelemetryEvent`] handed
//! to sinks, and the [`Level`] / [`Category`] vocabulary that drives
//! sampling, rate limiting and flush urgency.

pub mod category;
pub mod context;
pub mod event;
pub mod level;

pub use category::Category;
pub use context::{merge_shallow, ContextMap};
pub use event::{EventInput, TelemetryEvent};
pub use level::Level;
pub use uuid::Uuid;

/// Re-exported so callers can build context values without a direct
/// `serde_json` dependency.
pub use serde_json::{json, Value};
