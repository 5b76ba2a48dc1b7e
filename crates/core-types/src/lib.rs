use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a logical tab. Stable across engine hot-swaps.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single navigation attempt within a tab.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of engine configurations a tab can run on.
///
/// The two variants differ in emulated client identity and injected
/// compatibility shims; their navigation contract is identical.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    /// Default mobile client identity, no extra shims.
    Standard,
    /// Desktop client identity plus viewport/compat shims.
    Desktop,
}

impl EngineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineVariant::Standard => "standard",
            EngineVariant::Desktop => "desktop",
        }
    }

    /// The other member of the two-variant set.
    pub fn toggled(&self) -> Self {
        match self {
            EngineVariant::Standard => EngineVariant::Desktop,
            EngineVariant::Desktop => EngineVariant::Standard,
        }
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a navigation attempt that did not finish normally.
///
/// None of these cross the adapter boundary as propagated errors; they are
/// folded into navigation-state transitions and surfaced only to diagnostics.
#[derive(Clone, Debug, Error, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoadError {
    /// Expected cancellation (superseded or user-stopped load). Silent.
    #[error("load cancelled")]
    Cancelled,
    /// Network/content failure. Stops the progress indicator, nothing more.
    #[error("load failed: {reason}")]
    Transient { reason: String },
    /// The watchdog force-terminated a stuck provisional load.
    #[error("load watchdog expired after {after_ms}ms")]
    WatchdogTimeout { after_ms: u64 },
}

impl LoadError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Cancellations take the silent path; everything else is a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_toggle_round_trips() {
        assert_eq!(EngineVariant::Standard.toggled(), EngineVariant::Desktop);
        assert_eq!(EngineVariant::Desktop.toggled().as_str(), "standard");
    }

    #[test]
    fn cancellation_is_the_only_silent_error() {
        assert!(LoadError::Cancelled.is_cancellation());
        assert!(!LoadError::transient("dns failure").is_cancellation());
        assert!(!LoadError::WatchdogTimeout { after_ms: 15_000 }.is_cancellation());
    }

    #[test]
    fn tab_ids_are_unique() {
        assert_ne!(TabId::new(), TabId::new());
    }
}
