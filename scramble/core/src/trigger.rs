//! Trigger Adapter
//!
//! Maps host activation signals to animator starts. `hover` and `click`
//! react to their matching signal every time; `auto` fires exactly once,
//! `auto_delay` after the instance is mounted (or after the trigger is
//! reconfigured), and ignores pointer signals.
//!
//! The adapter does not de-duplicate anything. Overlapping activations are
//! rejected by the animator's run guard.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an animator is activated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Start when the pointer enters the label
    #[default]
    Hover,
    /// Start when the label is clicked
    Click,
    /// Start once, after a delay from mount
    Auto,
}

impl TriggerMode {
    /// Whether `signal` activates this mode
    #[must_use]
    pub fn accepts(self, signal: TriggerSignal) -> bool {
        matches!(
            (self, signal),
            (Self::Hover, TriggerSignal::PointerEnter) | (Self::Click, TriggerSignal::Click)
        )
    }

    /// Whether hosts should show a click affordance for this label
    #[must_use]
    pub fn shows_pointer(self) -> bool {
        matches!(self, Self::Click)
    }

    /// Lowercase name as used in configuration
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Click => "click",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown trigger mode name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trigger mode '{0}' (expected hover, click or auto)")]
pub struct TriggerParseError(String);

impl FromStr for TriggerMode {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hover" => Ok(Self::Hover),
            "click" => Ok(Self::Click),
            "auto" => Ok(Self::Auto),
            other => Err(TriggerParseError(other.to_string())),
        }
    }
}

/// An activation signal from the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerSignal {
    /// Pointer moved onto the label
    PointerEnter,
    /// Label was clicked
    Click,
}

/// Per-instance trigger state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerAdapter {
    mode: TriggerMode,
    auto_delay: Duration,
    auto_due: Option<Duration>,
}

impl TriggerAdapter {
    /// Create an adapter for an instance mounted at `mounted_at`
    #[must_use]
    pub fn new(mode: TriggerMode, auto_delay: Duration, mounted_at: Duration) -> Self {
        let mut adapter = Self {
            mode,
            auto_delay,
            auto_due: None,
        };
        adapter.arm(mounted_at);
        adapter
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Whether `signal` should start a run
    #[must_use]
    pub fn accepts(&self, signal: TriggerSignal) -> bool {
        self.mode.accepts(signal)
    }

    /// When the pending auto activation fires, if any
    #[must_use]
    pub fn next_auto_deadline(&self) -> Option<Duration> {
        self.auto_due
    }

    /// Fire the auto activation if it is due
    ///
    /// Returns the instant it was due at, exactly once.
    pub fn poll_auto(&mut self, now: Duration) -> Option<Duration> {
        match self.auto_due {
            Some(due) if now >= due => {
                self.auto_due = None;
                Some(due)
            }
            _ => None,
        }
    }

    /// Drop any pending auto activation
    pub fn disarm(&mut self) {
        self.auto_due = None;
    }

    /// Reconfigure; a pending auto activation is replaced
    pub fn rearm(&mut self, mode: TriggerMode, auto_delay: Duration, now: Duration) {
        self.mode = mode;
        self.auto_delay = auto_delay;
        self.arm(now);
    }

    fn arm(&mut self, from: Duration) {
        self.auto_due = match self.mode {
            TriggerMode::Auto => Some(from.saturating_add(self.auto_delay)),
            TriggerMode::Hover | TriggerMode::Click => None,
        };
    }
}
