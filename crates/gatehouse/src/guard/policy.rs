//! Thresholds and penalty curve for the login guard.

use gatehouse_common::GatehouseError;
use gatehouse_common::constants::{
    CHALLENGE_THRESHOLD, COOLDOWN_THRESHOLD, COUNTDOWN_TICK_MS, MAX_PENALTY_CAP_SECS,
    PENALTY_BASE_SECS, PENALTY_CAP_SECS, PENALTY_STEP_SECS,
};
use serde::Deserialize;
use std::time::Duration;

/// Guard tuning, loaded from the `[guard]` config table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GuardPolicy {
    /// Failed attempts that arm the arithmetic challenge
    #[serde(default = "default_challenge_threshold")]
    pub challenge_threshold: u32,

    /// Failed attempts that start a cooldown
    #[serde(default = "default_cooldown_threshold")]
    pub cooldown_threshold: u32,

    /// Cooldown at the first cooldown-triggering failure
    #[serde(default = "default_penalty_base")]
    pub penalty_base_secs: u64,

    /// Cooldown added per further failure
    #[serde(default = "default_penalty_step")]
    pub penalty_step_secs: u64,

    /// Cooldown ceiling
    #[serde(default = "default_penalty_cap")]
    pub penalty_cap_secs: u64,

    /// Countdown refresh interval
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_challenge_threshold() -> u32 { CHALLENGE_THRESHOLD }
fn default_cooldown_threshold() -> u32 { COOLDOWN_THRESHOLD }
fn default_penalty_base() -> u64 { PENALTY_BASE_SECS }
fn default_penalty_step() -> u64 { PENALTY_STEP_SECS }
fn default_penalty_cap() -> u64 { PENALTY_CAP_SECS }
fn default_tick_interval() -> u64 { COUNTDOWN_TICK_MS }

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            challenge_threshold: default_challenge_threshold(),
            cooldown_threshold: default_cooldown_threshold(),
            penalty_base_secs: default_penalty_base(),
            penalty_step_secs: default_penalty_step(),
            penalty_cap_secs: default_penalty_cap(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl GuardPolicy {
    /// Reject tunings that would break the guard's invariants
    pub fn validate(&self) -> Result<(), GatehouseError> {
        if self.challenge_threshold == 0 || self.cooldown_threshold == 0 {
            return Err(GatehouseError::Config(
                "guard thresholds must be at least 1".to_string(),
            ));
        }
        // A zero-length cooldown would set cooldown_until to "now".
        if self.penalty_base_secs == 0 {
            return Err(GatehouseError::Config(
                "guard.penalty_base_secs must be positive".to_string(),
            ));
        }
        if self.penalty_cap_secs < self.penalty_base_secs {
            return Err(GatehouseError::Config(
                "guard.penalty_cap_secs must be >= guard.penalty_base_secs".to_string(),
            ));
        }
        if self.penalty_cap_secs > MAX_PENALTY_CAP_SECS {
            return Err(GatehouseError::Config(format!(
                "guard.penalty_cap_secs must be <= {MAX_PENALTY_CAP_SECS}"
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(GatehouseError::Config(
                "guard.tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether reaching `attempts` failures calls for a challenge
    pub fn arms_challenge(&self, attempts: u32) -> bool {
        attempts >= self.challenge_threshold
    }

    /// Cooldown length after the `attempts`-th failure, if any.
    ///
    /// With defaults: 5 → 30s, 6 → 45s, 7 → 60s, 8 → 75s, 9+ → 90s.
    pub fn penalty_secs(&self, attempts: u32) -> Option<u64> {
        if attempts < self.cooldown_threshold {
            return None;
        }
        let extra = u64::from(attempts - self.cooldown_threshold);
        let penalty = extra
            .saturating_mul(self.penalty_step_secs)
            .saturating_add(self.penalty_base_secs);
        Some(penalty.min(self.penalty_cap_secs))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_curve() {
        let policy = GuardPolicy::default();
        for attempts in 0..5 {
            assert_eq!(policy.penalty_secs(attempts), None);
        }
        assert_eq!(policy.penalty_secs(5), Some(30));
        assert_eq!(policy.penalty_secs(6), Some(45));
        assert_eq!(policy.penalty_secs(7), Some(60));
        assert_eq!(policy.penalty_secs(8), Some(75));
        for attempts in [9, 10, 25, u32::MAX] {
            assert_eq!(policy.penalty_secs(attempts), Some(90));
        }
    }

    #[test]
    fn test_challenge_threshold() {
        let policy = GuardPolicy::default();
        assert!(!policy.arms_challenge(2));
        assert!(policy.arms_challenge(3));
        assert!(policy.arms_challenge(40));
    }

    #[test]
    fn test_validate() {
        assert!(GuardPolicy::default().validate().is_ok());

        let zero_base = GuardPolicy {
            penalty_base_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero_base.validate(), Err(GatehouseError::Config(_))));

        let low_cap = GuardPolicy {
            penalty_cap_secs: 10,
            ..Default::default()
        };
        assert!(low_cap.validate().is_err());

        let huge_cap = GuardPolicy {
            penalty_base_secs: u64::MAX,
            penalty_cap_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(huge_cap.validate(), Err(GatehouseError::Config(_))));

        let day_cap = GuardPolicy {
            penalty_cap_secs: MAX_PENALTY_CAP_SECS,
            ..Default::default()
        };
        assert!(day_cap.validate().is_ok());

        let no_tick = GuardPolicy {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(no_tick.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let policy: GuardPolicy = serde_json::from_str(r#"{"penalty_cap_secs": 120}"#).unwrap();
        assert_eq!(policy.penalty_cap_secs, 120);
        assert_eq!(policy.challenge_threshold, 3);
        assert_eq!(policy.tick_interval(), Duration::from_millis(500));
    }
}
