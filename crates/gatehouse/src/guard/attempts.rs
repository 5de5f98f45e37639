//! Failed-attempt state machine for one login view.

use chrono::{DateTime, TimeDelta, Utc};
use gatehouse_common::{AttemptState, Challenge, Decision, GuardPhase};

use super::challenge::{OperandSource, arm_challenge};
use super::decision::evaluate_submission;
use super::policy::GuardPolicy;

/// What a failed authentication changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Failure count after this failure
    pub failed_attempts: u32,
    /// A challenge was armed by this failure
    pub challenge_armed: bool,
    /// Cooldown started by this failure
    pub penalty_secs: Option<u64>,
}

/// Attempt counter, challenge, and cooldown for one login view.
///
/// States: `Idle` → (3 failures) → `ChallengeArmed` → (5 failures) →
/// `Cooldown` → (expiry) → `Idle`; a successful login returns to `Idle`
/// from anywhere.
pub struct LoginGuard {
    policy: GuardPolicy,
    state: AttemptState,
    challenge: Option<Challenge>,
    operands: Box<dyn OperandSource>,
}

impl LoginGuard {
    pub fn new(policy: GuardPolicy, operands: Box<dyn OperandSource>) -> Self {
        Self {
            policy,
            state: AttemptState::default(),
            challenge: None,
            operands,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Whole seconds left in the cooldown, rounded up. Does not mutate.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let Some(until) = self.state.cooldown_until else {
            return 0;
        };
        let millis = (until - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis as u64).div_ceil(1000)
        }
    }

    pub fn phase(&self, now: DateTime<Utc>) -> GuardPhase {
        if self.remaining_seconds(now) > 0 {
            GuardPhase::Cooldown
        } else if self.challenge.is_some() {
            GuardPhase::ChallengeArmed
        } else {
            GuardPhase::Idle
        }
    }

    /// Screen a submission against the current state
    pub fn evaluate(
        &self,
        honeypot_value: &str,
        challenge_answer: &str,
        now: DateTime<Utc>,
    ) -> Decision {
        let remaining = self.remaining_seconds(now);
        evaluate_submission(
            honeypot_value,
            remaining > 0,
            remaining,
            self.challenge.as_ref(),
            challenge_answer,
        )
    }

    /// Record a credential rejection from the authentication API
    pub fn on_authentication_failure(&mut self, now: DateTime<Utc>) -> FailureOutcome {
        let next = self.state.failed_attempts.saturating_add(1);
        self.state.failed_attempts = next;

        let mut challenge_armed = false;
        if self.policy.arms_challenge(next) && self.challenge.is_none() {
            self.challenge = Some(arm_challenge(self.operands.as_mut()));
            challenge_armed = true;
        }

        let penalty_secs = self.policy.penalty_secs(next);
        if let Some(secs) = penalty_secs {
            let until = i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|penalty| now.checked_add_signed(penalty))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.state.cooldown_until = Some(until);
        }

        FailureOutcome {
            failed_attempts: next,
            challenge_armed,
            penalty_secs,
        }
    }

    /// Record a successful login: back to a clean slate
    pub fn on_authentication_success(&mut self) {
        self.reset();
    }

    /// Recompute the countdown.
    ///
    /// Once a running cooldown reaches zero the whole state is forgiven:
    /// counter, challenge, and cooldown are all cleared. Returns the
    /// remaining whole seconds.
    pub fn tick_cooldown(&mut self, now: DateTime<Utc>) -> u64 {
        let remaining = self.remaining_seconds(now);
        if remaining == 0 && self.state.cooldown_until.is_some() {
            self.reset();
        }
        remaining
    }

    fn reset(&mut self) {
        self.state = AttemptState::default();
        self.challenge = None;
    }
}
