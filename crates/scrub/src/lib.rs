#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! PII scrubbing for telemetry context
//!
//! The [`Scrubber`] walks a context map and
//! - replaces values under denylisted keys with [`REDACTED`],
//! - rewrites emails, phone numbers, cards, tokens and IPs inside strings,
//! - truncates long strings and arrays,
//! - cuts nesting below the configured depth.
//!
//! It never fails: anything it cannot represent becomes a placeholder.
//! Output is a pure function of the input and the configuration.

pub mod patterns;

use beacon_config::ScrubConfig;
use beacon_types::ContextMap;
use serde_json::Value;

/// Replaces the value of any denylisted key.
pub const REDACTED: &str = "[redacted]";
/// Replaces objects and arrays nested deeper than `max_depth`.
pub const DEPTH_LIMIT: &str = "[depth-limit]";
/// Suffix of strings cut at `max_string_chars`.
pub const ELLIPSIS: char = '…';

/// Key fragments (normalized: lowercase alphanumerics) whose values are always redacted.
const DENIED_KEY_FRAGMENTS: &[&str] = &[
    "email",
    "phone",
    "password",
    "passwd",
    "secret",
    "token",
    "apikey",
    "authorization",
    "cookie",
    "ssn",
    "address",
    "firstname",
    "lastname",
    "fullname",
    "birth",
    "card",
    "iban",
    "referralcode",
];

#[derive(Debug, Clone)]
pub struct Scrubber {
    max_depth: usize,
    max_string_chars: usize,
    max_array_len: usize,
    denied: Vec<String>,
}

impl Scrubber {
    #[must_use]
    pub fn new(config: &ScrubConfig) -> Self {
        let broken = patterns::unhealthy_patterns();
        if !broken.is_empty() {
            tracing::warn!(patterns = ?broken, "scrub patterns failed to compile; matching disabled");
        }

        let mut denied: Vec<String> = DENIED_KEY_FRAGMENTS
            .iter()
            .map(|fragment| (*fragment).to_string())
            .collect();
        denied.extend(
            config
                .extra_denied_keys
                .iter()
                .map(|key| normalize_key(key))
                .filter(|key| !key.is_empty()),
        );

        Self {
            max_depth: config.max_depth.max(1),
            max_string_chars: config.max_string_chars.max(1),
            max_array_len: config.max_array_len,
            denied,
        }
    }

    /// Whether values under `key` are always redacted.
    #[must_use]
    pub fn is_denied_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.denied.iter().any(|fragment| key.contains(fragment.as_str()))
    }

    /// Scrub a whole context map.
    #[must_use]
    pub fn scrub(&self, context: &ContextMap) -> ContextMap {
        self.scrub_map(context, 1)
    }

    /// Apply value patterns to free text (used for event messages).
    /// Unlike context strings, text is not truncated here.
    #[must_use]
    pub fn scrub_text(&self, text: &str) -> String {
        patterns::redact(text).into_owned()
    }

    fn scrub_map(&self, map: &ContextMap, depth: usize) -> ContextMap {
        map.iter()
            .map(|(key, value)| {
                let value = if self.is_denied_key(key) {
                    Value::String(REDACTED.to_string())
                } else {
                    self.scrub_value(value, depth)
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn scrub_value(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::Object(_) | Value::Array(_) if depth >= self.max_depth => {
                Value::String(DEPTH_LIMIT.to_string())
            }
            Value::Object(map) => Value::Object(self.scrub_map(map, depth + 1)),
            Value::Array(items) => Value::Array(self.scrub_array(items, depth)),
            Value::String(s) => Value::String(self.scrub_string(s)),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        }
    }

    fn scrub_array(&self, items: &[Value], depth: usize) -> Vec<Value> {
        if items.len() <= self.max_array_len {
            return items
                .iter()
                .map(|item| self.scrub_value(item, depth + 1))
                .collect();
        }

        // Keep room for the marker so the output length stays within the limit.
        let keep = self.max_array_len.saturating_sub(1);
        let mut out: Vec<Value> = items[..keep]
            .iter()
            .map(|item| self.scrub_value(item, depth + 1))
            .collect();
        out.push(Value::String(format!("[+{} more]", items.len() - keep)));
        out
    }

    fn scrub_string(&self, s: &str) -> String {
        let redacted = patterns::redact(s);
        truncate_chars(&redacted, self.max_string_chars)
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new(&ScrubConfig::default())
    }
}

/// Cut `s` to at most `max` chars, the last of which is [`ELLIPSIS`] when cut.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> ContextMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn denied_keys_match_across_naming_styles() {
        let scrubber = Scrubber::default();
        assert!(scrubber.is_denied_key("email"));
        assert!(scrubber.is_denied_key("userEmail"));
        assert!(scrubber.is_denied_key("First-Name"));
        assert!(scrubber.is_denied_key("referral_code"));
        assert!(!scrubber.is_denied_key("route_name"));
        assert!(!scrubber.is_denied_key("app_version"));
    }

    #[test]
    fn redacts_denied_values_of_any_type() {
        let scrubber = Scrubber::default();
        let out = scrubber.scrub(&ctx(json!({
            "phone": 5551234567u64,
            "password": {"nested": true},
            "screen": "Wallet",
        })));
        assert_eq!(out["phone"], REDACTED);
        assert_eq!(out["password"], REDACTED);
        assert_eq!(out["screen"], "Wallet");
    }

    #[test]
    fn depth_limit_applies_to_containers_only() {
        let config = ScrubConfig {
            max_depth: 2,
            ..ScrubConfig::default()
        };
        let scrubber = Scrubber::new(&config);
        let out = scrubber.scrub(&ctx(json!({
            "a": {"b": {"c": 1}, "n": 3},
            "flat": 1,
        })));
        assert_eq!(out["a"]["b"], DEPTH_LIMIT);
        assert_eq!(out["a"]["n"], 3);
        assert_eq!(out["flat"], 1);
    }

    #[test]
    fn long_strings_and_arrays_are_cut() {
        let config = ScrubConfig {
            max_string_chars: 5,
            max_array_len: 3,
            ..ScrubConfig::default()
        };
        let scrubber = Scrubber::new(&config);
        let out = scrubber.scrub(&ctx(json!({
            "note": "abcdefghij",
            "items": [1, 2, 3, 4, 5, 6],
        })));
        assert_eq!(out["note"], "abcd…");
        assert_eq!(out["items"], json!([1, 2, "[+4 more]"]));
    }

    #[test]
    fn extra_denied_keys_are_normalized() {
        let config = ScrubConfig {
            extra_denied_keys: vec!["Device-ID".into()],
            ..ScrubConfig::default()
        };
        let scrubber = Scrubber::new(&config);
        assert!(scrubber.is_denied_key("device_id"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 6), "héllo…");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
