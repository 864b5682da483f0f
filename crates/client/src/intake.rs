//! Event intake: validation, normalization and event construction

use beacon_admission::DropReason;
use beacon_config::{Config, LimitsConfig};
use beacon_scrub::{truncate_chars, Scrubber};
use beacon_types::{merge_shallow, Category, ContextMap, EventInput, Level, TelemetryEvent, Uuid};
use chrono::{DateTime, Utc};
use std::fmt;

/// Why [`TelemetryClient::track`](crate::TelemetryClient::track) did not queue an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Missing or blank category, level or message.
    Malformed,
    BelowMinLevel,
    /// The client has been shut down.
    Stopped,
    SampledOut,
    RateLimited,
    Deduplicated,
    QueueFull,
}

impl RejectReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BelowMinLevel => "below_min_level",
            Self::Stopped => "stopped",
            Self::SampledOut => "sampled_out",
            Self::RateLimited => "rate_limited",
            Self::Deduplicated => "deduplicated",
            Self::QueueFull => "queue_full",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DropReason> for RejectReason {
    fn from(reason: DropReason) -> Self {
        match reason {
            DropReason::SampledOut => Self::SampledOut,
            DropReason::RateLimited => Self::RateLimited,
            DropReason::Deduplicated => Self::Deduplicated,
        }
    }
}

/// Outcome of tracking one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted { event_id: Uuid },
    Rejected(RejectReason),
}

impl Admission {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    #[must_use]
    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub category: Category,
    pub level: Level,
    pub message: String,
    pub context: ContextMap,
    pub request_id: Option<String>,
    pub session_id: Option<String>,
    pub trace_id: Option<String>,
}

/// Validates raw input and turns it into a scrubbed [`TelemetryEvent`].
#[derive(Debug, Clone)]
pub struct Intake {
    limits: LimitsConfig,
    min_level: Level,
    scrubber: Scrubber,
}

impl Intake {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            limits: config.limits.clone(),
            min_level: config.client.min_level,
            scrubber: Scrubber::new(&config.scrub),
        }
    }

    /// Check required fields and the level floor.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::Malformed`] when category, level or message is
    /// missing or blank, and [`RejectReason::BelowMinLevel`] for levels under
    /// the configured floor.
    pub fn validate(&self, input: EventInput) -> Result<Validated, RejectReason> {
        let category = non_blank(input.category).ok_or(RejectReason::Malformed)?;
        let level = input.level.ok_or(RejectReason::Malformed)?;
        let message = non_blank(input.message).ok_or(RejectReason::Malformed)?;
        if level < self.min_level {
            return Err(RejectReason::BelowMinLevel);
        }

        let max_id = self.limits.max_identifier_chars;
        let identifier = |raw: Option<String>| non_blank(raw).map(|id| truncate_chars(&id, max_id));

        Ok(Validated {
            category: Category::from(category),
            level,
            message,
            context: input.context,
            request_id: identifier(input.request_id),
            session_id: identifier(input.session_id),
            trace_id: identifier(input.trace_id),
        })
    }

    /// Merge context (base, then provider snapshot, then per-call), scrub,
    /// and stamp the event.
    #[must_use]
    pub fn build(
        &self,
        validated: Validated,
        base: &ContextMap,
        snapshot: ContextMap,
        now: DateTime<Utc>,
    ) -> TelemetryEvent {
        let mut context = base.clone();
        merge_shallow(&mut context, snapshot);
        merge_shallow(&mut context, validated.context);

        // Scrub before truncating so a cut never splits a pattern match.
        let message = truncate_chars(
            &self.scrubber.scrub_text(&validated.message),
            self.limits.max_message_chars,
        );

        TelemetryEvent {
            event_id: Uuid::new_v4(),
            category: validated.category,
            level: validated.level,
            message,
            context: self.scrubber.scrub(&context),
            request_id: validated.request_id,
            session_id: validated.session_id,
            trace_id: validated.trace_id,
            created_at: now,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}
