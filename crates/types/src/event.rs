//! Event shapes: loose intake input and admitted telemetry events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Category, ContextMap, Level};

/// Placeholder stored when a caller-supplied context value cannot be serialized.
pub const UNSERIALIZABLE: &str = "[unserializable]";

/// Candidate event as supplied by a caller.
///
/// Every field is optional so that malformed records (from JSON, from
/// untyped bridges) reach intake validation and get dropped there instead of
/// failing somewhere upstream. Unknown level strings deserialize to `None`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventInput {
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_level")]
    pub level: Option<Level>,
    pub message: Option<String>,
    pub context: ContextMap,
    pub request_id: Option<String>,
    pub session_id: Option<String>,
    pub trace_id: Option<String>,
}

impl EventInput {
    /// Create an input with all required fields present.
    #[must_use]
    pub fn new(category: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            level: Some(level),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach any serializable value; values that fail to serialize are
    /// stored as [`UNSERIALIZABLE`] rather than failing the event.
    #[must_use]
    pub fn with_serialized_context<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String(UNSERIALIZABLE.to_string()));
        self.context.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// An admitted event, as queued and handed to sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryEvent {
    pub event_id: Uuid,
    pub category: Category,
    pub level: Level,
    pub message: String,
    #[serde(default)]
    pub context: ContextMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Assigned at admission; never touched again.
    pub created_at: DateTime<Utc>,
}

impl TelemetryEvent {
    /// Whether this event forces an immediate flush.
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.level.is_urgent()
    }
}
