//! Trip-session configuration.
//!
//! Typically loaded from a JSON file by the application crate and passed to
//! `TripSession::new`.

use std::time::Duration;

// ── RepeatReroute ─────────────────────────────────────────────────────────────

/// Policy for re-emitting the off-route signal while the vehicle stays off
/// route and no reroute fetch was observed.
///
/// Serialized as whole seconds.  Any negative number deserializes to
/// `Disabled`; the exact negative value carries no meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i64", into = "i64"))]
pub enum RepeatReroute {
    /// Emit only on off-route edges (`false → true` and `true → false`).
    #[default]
    Disabled,
    /// Re-emit `true` every time this much time passes without a reroute
    /// fetch starting.
    After(Duration),
}

impl RepeatReroute {
    /// Interpret a seconds value: negative disables the retry window.
    pub fn from_secs(secs: i64) -> Self {
        if secs < 0 {
            RepeatReroute::Disabled
        } else {
            RepeatReroute::After(Duration::from_secs(secs as u64))
        }
    }

    /// The retry window, or `None` when retries are disabled.
    #[inline]
    pub fn delay(self) -> Option<Duration> {
        match self {
            RepeatReroute::Disabled => None,
            RepeatReroute::After(d) => Some(d),
        }
    }
}

impl From<i64> for RepeatReroute {
    fn from(secs: i64) -> Self {
        RepeatReroute::from_secs(secs)
    }
}

impl From<RepeatReroute> for i64 {
    fn from(policy: RepeatReroute) -> i64 {
        match policy {
            RepeatReroute::Disabled => -1,
            RepeatReroute::After(d) => d.as_secs() as i64,
        }
    }
}

// ── SessionConfig ─────────────────────────────────────────────────────────────

/// Top-level trip-session configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Reroute retry policy.  Default: disabled.
    pub repeat_reroute: RepeatReroute,

    /// Capacity of the command channel feeding the session's processor task.
    /// Producers wait when it is full.  Default: 256.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            repeat_reroute: RepeatReroute::Disabled,
            command_buffer: 256,
        }
    }
}

impl SessionConfig {
    /// Reject configurations the session cannot run with.
    pub fn validate(&self) -> crate::NavResult<()> {
        if self.command_buffer == 0 {
            return Err(crate::NavError::Config(
                "command_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
