//! View/write heartbeat throttling.
//!
//! - **Write**: always sent, regardless of file or recency.
//! - **View**: sent when the file differs from the last heartbeat's file, or
//!   when at least `cooldown` has elapsed since the last heartbeat.
//! - **First event**: always sent.
//!
//! `decide` is pure. State only moves forward through `record_sent`, which the
//! caller invokes after the heartbeat process was actually launched, so a
//! failed launch leaves the next event with a fresh chance.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::config::HeartbeatConfig;
use crate::types::HeartbeatEvent;

/// Why an event was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendReason {
    Write,
    FirstHeartbeat,
    FileChanged,
    CooldownElapsed,
}

impl SendReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::FirstHeartbeat => "first_heartbeat",
            Self::FileChanged => "file_changed",
            Self::CooldownElapsed => "cooldown_elapsed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Send(SendReason),
    /// Same file, still inside the cooldown window.
    Suppress { remaining: TimeDelta },
}

impl ThrottleDecision {
    pub fn should_send(&self) -> bool {
        matches!(self, Self::Send(_))
    }
}

/// Last successfully launched heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThrottleState {
    pub last_file_path: Option<String>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct HeartbeatThrottle {
    state: ThrottleState,
    cooldown: TimeDelta,
}

impl HeartbeatThrottle {
    pub fn new(cooldown: TimeDelta) -> Self {
        Self {
            state: ThrottleState::default(),
            cooldown,
        }
    }

    pub fn from_config(config: &HeartbeatConfig) -> Self {
        Self::new(config.cooldown())
    }

    pub fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    /// Decide whether `event` should produce a heartbeat. Does not mutate state.
    pub fn decide(&self, event: &HeartbeatEvent) -> ThrottleDecision {
        if event.is_write() {
            return ThrottleDecision::Send(SendReason::Write);
        }

        let (Some(last_file), Some(last_at)) = (
            self.state.last_file_path.as_deref(),
            self.state.last_heartbeat_at,
        ) else {
            return ThrottleDecision::Send(SendReason::FirstHeartbeat);
        };

        if last_file != event.file_path {
            return ThrottleDecision::Send(SendReason::FileChanged);
        }

        // A timestamp behind the last heartbeat (clock skew) counts as elapsed = 0.
        let elapsed = event
            .timestamp
            .signed_duration_since(last_at)
            .max(TimeDelta::zero());
        if elapsed >= self.cooldown {
            ThrottleDecision::Send(SendReason::CooldownElapsed)
        } else {
            ThrottleDecision::Suppress {
                remaining: self.cooldown - elapsed,
            }
        }
    }

    /// Record a heartbeat whose process launched successfully.
    ///
    /// `last_heartbeat_at` never moves backwards.
    pub fn record_sent(&mut self, event: &HeartbeatEvent) {
        let at = match self.state.last_heartbeat_at {
            Some(prev) if prev > event.timestamp => prev,
            _ => event.timestamp,
        };
        self.state.last_heartbeat_at = Some(at);
        self.state.last_file_path = Some(event.file_path.clone());
    }

    /// Forget all history (service teardown).
    pub fn reset(&mut self) {
        self.state = ThrottleState::default();
    }
}

impl Default for HeartbeatThrottle {
    fn default() -> Self {
        Self::from_config(&HeartbeatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeartbeatKind;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid datetime")
            + TimeDelta::seconds(secs)
    }

    fn view(path: &str, secs: i64) -> HeartbeatEvent {
        HeartbeatEvent {
            file_path: path.to_string(),
            kind: HeartbeatKind::View,
            timestamp: at(secs),
        }
    }

    fn write(path: &str, secs: i64) -> HeartbeatEvent {
        HeartbeatEvent {
            kind: HeartbeatKind::Write,
            ..view(path, secs)
        }
    }

    #[test]
    fn first_view_is_sent() {
        let throttle = HeartbeatThrottle::default();
        assert_eq!(
            throttle.decide(&view("/p/a.rs", 0)),
            ThrottleDecision::Send(SendReason::FirstHeartbeat)
        );
    }

    #[test]
    fn view_same_file_within_cooldown_suppressed() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 0));

        let decision = throttle.decide(&view("/p/a.rs", 60));
        assert_eq!(
            decision,
            ThrottleDecision::Suppress {
                remaining: TimeDelta::seconds(60)
            }
        );
        assert!(!decision.should_send());
    }

    #[test]
    fn view_same_file_exactly_at_cooldown_is_sent() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 0));
        assert_eq!(
            throttle.decide(&view("/p/a.rs", 120)),
            ThrottleDecision::Send(SendReason::CooldownElapsed)
        );
    }

    #[test]
    fn view_other_file_is_sent_immediately() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 0));
        assert_eq!(
            throttle.decide(&view("/p/b.rs", 1)),
            ThrottleDecision::Send(SendReason::FileChanged)
        );
    }

    #[test]
    fn write_bypasses_cooldown() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 0));
        assert_eq!(
            throttle.decide(&write("/p/a.rs", 1)),
            ThrottleDecision::Send(SendReason::Write)
        );
    }

    #[test]
    fn decide_does_not_mutate_state() {
        let throttle = HeartbeatThrottle::default();
        let _ = throttle.decide(&view("/p/a.rs", 0));
        assert_eq!(throttle.state(), &ThrottleState::default());
    }

    #[test]
    fn skewed_clock_stays_suppressed() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 100));
        assert_eq!(
            throttle.decide(&view("/p/a.rs", 10)),
            ThrottleDecision::Suppress {
                remaining: TimeDelta::seconds(120)
            }
        );
    }

    #[test]
    fn record_sent_is_monotonic() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 100));
        throttle.record_sent(&write("/p/b.rs", 50));
        assert_eq!(throttle.state().last_heartbeat_at, Some(at(100)));
        assert_eq!(throttle.state().last_file_path.as_deref(), Some("/p/b.rs"));
    }

    #[test]
    fn reset_clears_history() {
        let mut throttle = HeartbeatThrottle::default();
        throttle.record_sent(&view("/p/a.rs", 0));
        throttle.reset();
        assert_eq!(
            throttle.decide(&view("/p/a.rs", 1)),
            ThrottleDecision::Send(SendReason::FirstHeartbeat)
        );
    }

    #[test]
    fn custom_cooldown() {
        let mut throttle = HeartbeatThrottle::new(TimeDelta::seconds(10));
        throttle.record_sent(&view("/p/a.rs", 0));
        assert!(!throttle.decide(&view("/p/a.rs", 9)).should_send());
        assert!(throttle.decide(&view("/p/a.rs", 10)).should_send());
    }
}
