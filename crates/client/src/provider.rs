//! Dynamic context sources

use beacon_types::ContextMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Supplies context that changes over the life of the app (current route,
/// connectivity, app version). Asked once per tracked event.
pub trait ContextProvider: Send + Sync {
    fn current_context(&self) -> ContextMap;
}

impl<F> ContextProvider for F
where
    F: Fn() -> ContextMap + Send + Sync,
{
    fn current_context(&self) -> ContextMap {
        self()
    }
}

/// Take a snapshot, degrading to an empty map if the provider panics.
pub(crate) fn snapshot(provider: &dyn ContextProvider) -> ContextMap {
    match catch_unwind(AssertUnwindSafe(|| provider.current_context())) {
        Ok(context) => context,
        Err(_) => {
            tracing::warn!("context provider panicked; using empty context");
            ContextMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::json;

    #[test]
    fn closures_are_providers() {
        let provider = || {
            let mut map = ContextMap::new();
            map.insert("route".into(), json!("Home"));
            map
        };
        assert_eq!(snapshot(&provider)["route"], "Home");
    }

    #[test]
    fn panicking_provider_yields_empty_snapshot() {
        let provider = || -> ContextMap { panic!("provider blew up") };
        assert!(snapshot(&provider).is_empty());
    }
}
