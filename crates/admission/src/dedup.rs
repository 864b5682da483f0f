//! Suppression of repeated events inside a short window

use beacon_config::{DedupConfig, DedupPolicyKind};
use beacon_types::TelemetryEvent;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::fmt;

/// Which parts of an event make up its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Category, level and message.
    Message,
    /// Message identity plus the first `max_chars` of the canonical context JSON.
    IncludeContext { max_chars: usize },
}

impl DedupPolicy {
    #[must_use]
    pub fn from_config(config: &DedupConfig) -> Self {
        match config.policy {
            DedupPolicyKind::Message => Self::Message,
            DedupPolicyKind::Context => Self::IncludeContext {
                max_chars: config.context_chars,
            },
        }
    }

    /// Identity of `event` under this policy.
    #[must_use]
    pub fn fingerprint(&self, event: &TelemetryEvent) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(event.category.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(event.level.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(event.message.as_bytes());

        if let Self::IncludeContext { max_chars } = *self {
            // serde_json maps are key-ordered, so this is canonical.
            let canonical = serde_json::to_string(&event.context).unwrap_or_default();
            let prefix: String = canonical.chars().take(max_chars).collect();
            hasher.update(&[0]);
            hasher.update(prefix.as_bytes());
        }

        Fingerprint(*hasher.finalize().as_bytes())
    }
}

/// Content hash identifying "the same" event.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Fingerprint({})", &hex[..12])
    }
}

/// Remembers when each fingerprint was last admitted.
#[derive(Debug)]
pub struct Deduplicator {
    window: TimeDelta,
    max_entries: usize,
    seen: HashMap<Fingerprint, DateTime<Utc>>,
    last_sweep: Option<DateTime<Utc>>,
}

impl Deduplicator {
    #[must_use]
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            window: TimeDelta::milliseconds(i64::try_from(config.window_ms).unwrap_or(i64::MAX)),
            max_entries: config.max_entries.max(1),
            seen: HashMap::new(),
            last_sweep: None,
        }
    }

    /// `true` when `fingerprint` was admitted less than one window before `now`.
    ///
    /// Otherwise the fingerprint is recorded as admitted at `now` and `false`
    /// is returned. A duplicate does not extend the window.
    pub fn should_dedupe(&mut self, fingerprint: Fingerprint, now: DateTime<Utc>) -> bool {
        self.maybe_sweep(now);

        if let Some(&last) = self.seen.get(&fingerprint) {
            if now.signed_duration_since(last) < self.window {
                return true;
            }
        }

        self.seen.insert(fingerprint, now);
        if self.seen.len() > self.max_entries {
            self.evict_oldest();
        }
        false
    }

    /// Number of fingerprints currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    // Sweeps at most once per window.
    fn maybe_sweep(&mut self, now: DateTime<Utc>) {
        let due = self
            .last_sweep
            .is_none_or(|last| now.signed_duration_since(last) >= self.window);
        if !due {
            return;
        }
        let window = self.window;
        let before = self.seen.len();
        self.seen
            .retain(|_, last| now.signed_duration_since(*last) < window);
        self.last_sweep = Some(now);
        if before != self.seen.len() {
            tracing::trace!(
                expired = before - self.seen.len(),
                remaining = self.seen.len(),
                "swept dedup entries"
            );
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self
            .seen
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(fp, _)| *fp)
        {
            self.seen.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::{json, Category, Level};
    use chrono::TimeZone;

    fn event(message: &str, context: serde_json::Value) -> TelemetryEvent {
        TelemetryEvent {
            event_id: beacon_types::Uuid::new_v4(),
            category: Category::NETWORK,
            level: Level::Error,
            message: message.to_string(),
            context: context.as_object().cloned().unwrap_or_default(),
            request_id: None,
            session_id: None,
            trace_id: None,
            created_at: Utc::now(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn dedup(window_ms: u64, max_entries: usize) -> Deduplicator {
        Deduplicator::new(&DedupConfig {
            window_ms,
            max_entries,
            ..DedupConfig::default()
        })
    }

    #[test]
    fn message_policy_ignores_context_and_metadata() {
        let a = event("timeout", json!({"attempt": 1}));
        let b = event("timeout", json!({"attempt": 2}));
        assert_eq!(
            DedupPolicy::Message.fingerprint(&a),
            DedupPolicy::Message.fingerprint(&b)
        );
        assert_ne!(
            DedupPolicy::Message.fingerprint(&a),
            DedupPolicy::Message.fingerprint(&event("refused", json!({})))
        );
    }

    #[test]
    fn context_policy_distinguishes_context() {
        let policy = DedupPolicy::IncludeContext { max_chars: 256 };
        let a = event("timeout", json!({"attempt": 1}));
        let b = event("timeout", json!({"attempt": 2}));
        assert_ne!(policy.fingerprint(&a), policy.fingerprint(&b));
    }

    #[test]
    fn context_policy_only_reads_the_prefix() {
        let policy = DedupPolicy::IncludeContext { max_chars: 8 };
        let a = event("timeout", json!({"a": "xxxxxxxxxx-one"}));
        let b = event("timeout", json!({"a": "xxxxxxxxxx-two"}));
        assert_eq!(policy.fingerprint(&a), policy.fingerprint(&b));
    }

    #[test]
    fn window_is_exclusive_and_not_extended_by_duplicates() {
        let mut d = dedup(3_000, 100);
        let fp = DedupPolicy::Message.fingerprint(&event("x", json!({})));
        assert!(!d.should_dedupe(fp, t0()));
        assert!(d.should_dedupe(fp, t0() + TimeDelta::milliseconds(2_999)));
        assert!(!d.should_dedupe(fp, t0() + TimeDelta::milliseconds(3_000)));
    }

    #[test]
    fn entries_are_bounded() {
        let mut d = dedup(60_000, 3);
        for i in 0..10 {
            let fp = DedupPolicy::Message.fingerprint(&event(&format!("m{i}"), json!({})));
            assert!(!d.should_dedupe(fp, t0() + TimeDelta::milliseconds(i)));
        }
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn expired_entries_are_swept() {
        let mut d = dedup(1_000, 100);
        for i in 0..5 {
            let fp = DedupPolicy::Message.fingerprint(&event(&format!("m{i}"), json!({})));
            d.should_dedupe(fp, t0());
        }
        assert_eq!(d.len(), 5);
        let fp = DedupPolicy::Message.fingerprint(&event("late", json!({})));
        d.should_dedupe(fp, t0() + TimeDelta::seconds(5));
        assert_eq!(d.len(), 1);
    }
}
