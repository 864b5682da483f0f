//! Free-form event context

use serde_json::{Map, Value};

/// Open mapping of string keys to JSON values attached to every event.
pub type ContextMap = Map<String, Value>;

/// Shallow merge: top-level keys from `overlay` replace those in `base`.
pub fn merge_shallow(base: &mut ContextMap, overlay: ContextMap) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
