//! Event categories

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Functional area an event belongs to. Drives the sampling policy.
///
/// Categories are open-ended; the constants cover the ones the apps emit
/// today.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    pub const UI_FLOW: Self = Self::const_str("ui_flow");
    pub const PERFORMANCE: Self = Self::const_str("performance");
    pub const ERROR: Self = Self::const_str("error");
    pub const SUPPORT: Self = Self::const_str("support");
    pub const NAVIGATION: Self = Self::const_str("navigation");
    pub const NETWORK: Self = Self::const_str("network");

    const fn const_str(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Category {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}
