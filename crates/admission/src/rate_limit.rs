//! Per-minute admission ceiling

use beacon_config::{RateLimitConfig, RateLimitScope};
use beacon_types::Level;
use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Identifies one wall-clock minute (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteKey {
    date: NaiveDate,
    hour: u32,
    minute: u32,
}

impl MinuteKey {
    #[must_use]
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            date: at.date_naive(),
            hour: at.hour(),
            minute: at.minute(),
        }
    }
}

/// Counts admissions in the current minute bucket.
///
/// Rollover is detected lazily: every call compares the minute key of `now`
/// with the stored one, so idle periods never leave a stale counter behind.
/// The bucket only moves forward; a timestamp from an earlier minute is
/// counted against the current bucket.
#[derive(Debug)]
pub struct RateLimiter {
    ceiling: u32,
    scope: RateLimitScope,
    bucket: Option<MinuteKey>,
    counts: [u32; Level::ALL.len()],
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            ceiling: config.per_minute,
            scope: config.scope,
            bucket: None,
            counts: [0; Level::ALL.len()],
        }
    }

    /// Whether an event at `level` still fits in the bucket containing `now`.
    /// Does not consume a slot.
    pub fn check(&mut self, level: Level, now: DateTime<Utc>) -> bool {
        self.roll(now);
        self.counts[self.slot(level)] < self.ceiling
    }

    /// Consume one slot for `level`.
    pub fn record(&mut self, level: Level, now: DateTime<Utc>) {
        self.roll(now);
        let slot = self.slot(level);
        self.counts[slot] = self.counts[slot].saturating_add(1);
    }

    /// Check and consume in one step.
    pub fn try_acquire(&mut self, level: Level, now: DateTime<Utc>) -> bool {
        if self.check(level, now) {
            self.record(level, now);
            true
        } else {
            false
        }
    }

    /// Slots left for `level` in the bucket containing `now`.
    pub fn remaining(&mut self, level: Level, now: DateTime<Utc>) -> u32 {
        self.roll(now);
        self.ceiling.saturating_sub(self.counts[self.slot(level)])
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        let key = MinuteKey::of(now);
        match self.bucket {
            Some(current) if key <= current => {}
            Some(_) => {
                tracing::trace!(?key, "rate limit bucket rolled over");
                self.bucket = Some(key);
                self.counts = [0; Level::ALL.len()];
            }
            None => self.bucket = Some(key),
        }
    }

    fn slot(&self, level: Level) -> usize {
        match self.scope {
            RateLimitScope::Global => 0,
            RateLimitScope::PerLevel => level as usize,
        }
    }
}
