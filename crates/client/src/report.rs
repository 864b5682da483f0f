//! Flush outcomes and client counters

use beacon_errors::SinkError;
use beacon_types::Uuid;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::intake::RejectReason;

/// A single event the sink failed to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub event_id: Uuid,
    pub error: SinkError,
}

/// Result of one or more flush passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Sink calls made.
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl FlushReport {
    /// Whether every attempted event was delivered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: FlushReport) {
        self.attempted += other.attempted;
        self.delivered += other.delivered;
        self.failures.extend(other.failures);
    }
}

/// Point-in-time copy of the client counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub accepted: u64,
    pub malformed: u64,
    pub below_min_level: u64,
    pub stopped: u64,
    pub sampled_out: u64,
    pub rate_limited: u64,
    pub deduplicated: u64,
    pub queue_full: u64,
    pub delivered: u64,
    pub failed: u64,
    pub flush_passes: u64,
}

impl TelemetryStats {
    /// Total events turned away at intake or admission.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.malformed
            + self.below_min_level
            + self.stopped
            + self.sampled_out
            + self.rate_limited
            + self.deduplicated
            + self.queue_full
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    accepted: AtomicU64,
    malformed: AtomicU64,
    below_min_level: AtomicU64,
    stopped: AtomicU64,
    sampled_out: AtomicU64,
    rate_limited: AtomicU64,
    deduplicated: AtomicU64,
    queue_full: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    flush_passes: AtomicU64,
}

impl Counters {
    pub(crate) fn accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::Malformed => &self.malformed,
            RejectReason::BelowMinLevel => &self.below_min_level,
            RejectReason::Stopped => &self.stopped,
            RejectReason::SampledOut => &self.sampled_out,
            RejectReason::RateLimited => &self.rate_limited,
            RejectReason::Deduplicated => &self.deduplicated,
            RejectReason::QueueFull => &self.queue_full,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pass(&self, report: &FlushReport) {
        self.flush_passes.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TelemetryStats {
        TelemetryStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            below_min_level: self.below_min_level.load(Ordering::Relaxed),
            stopped: self.stopped.load(Ordering::Relaxed),
            sampled_out: self.sampled_out.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            queue_full: self.queue_full.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            flush_passes: self.flush_passes.load(Ordering::Relaxed),
        }
    }
}
