#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Admission control for telemetry events
//!
//! Three independent filters decide whether a validated event enters the
//! queue: the [`Sampler`], the per-minute [`RateLimiter`] and the
//! [`Deduplicator`]. [`AdmissionGate`] runs them in a fixed order so that a
//! dropped event never consumes rate-limit budget or a dedup slot.

pub mod dedup;
pub mod rate_limit;
pub mod sampler;

pub use dedup::{DedupPolicy, Deduplicator, Fingerprint};
pub use rate_limit::{MinuteKey, RateLimiter};
pub use sampler::Sampler;

use beacon_config::Config;
use beacon_types::TelemetryEvent;
use chrono::{DateTime, Utc};

/// Why the gate turned an event away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    SampledOut,
    RateLimited,
    Deduplicated,
}

impl DropReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SampledOut => "sampled_out",
            Self::RateLimited => "rate_limited",
            Self::Deduplicated => "deduplicated",
        }
    }
}

/// Outcome of [`AdmissionGate::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    Admit,
    Drop(DropReason),
}

impl Decision {
    #[must_use]
    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Sampler, rate limiter and deduplicator in admission order.
#[derive(Debug)]
pub struct AdmissionGate {
    sampler: Sampler,
    rate_limiter: RateLimiter,
    deduplicator: Deduplicator,
    policy: DedupPolicy,
}

impl AdmissionGate {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            sampler: Sampler::new(&config.sampling),
            rate_limiter: RateLimiter::new(&config.rate_limit),
            deduplicator: Deduplicator::new(&config.dedup),
            policy: DedupPolicy::from_config(&config.dedup),
        }
    }

    /// Run `event` through all three filters.
    ///
    /// Order: sample, check the rate ceiling, dedupe, then consume the
    /// rate slot. Only an admitted event is recorded by the limiter.
    pub fn admit(&mut self, event: &TelemetryEvent, now: DateTime<Utc>) -> Decision {
        if !self.sampler.keep(&event.category, event.level) {
            return Decision::Drop(DropReason::SampledOut);
        }
        if !self.rate_limiter.check(event.level, now) {
            return Decision::Drop(DropReason::RateLimited);
        }
        let fingerprint = self.policy.fingerprint(event);
        if self.deduplicator.should_dedupe(fingerprint, now) {
            return Decision::Drop(DropReason::Deduplicated);
        }
        self.rate_limiter.record(event.level, now);
        Decision::Admit
    }

    #[must_use]
    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }
}
