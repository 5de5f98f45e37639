//! Core types shared across Gatehouse components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GatehouseError;
use crate::constants::messages;

/// Failed-attempt bookkeeping for one login view.
///
/// `cooldown_until`, when set, was strictly in the future at the moment it
/// was set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    /// Consecutive failed authentications since the last reset
    pub failed_attempts: u32,

    /// End of the current cooldown window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Arithmetic challenge shown after repeated failures.
///
/// The expected sum stays server-side; clients only get a [`ChallengePrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub operand_a: i64,
    pub operand_b: i64,
    pub expected_sum: i64,
}

impl Challenge {
    pub fn new(operand_a: i64, operand_b: i64) -> Self {
        Self {
            operand_a,
            operand_b,
            expected_sum: operand_a + operand_b,
        }
    }

    /// Check a user-entered answer.
    ///
    /// The answer is read like a lenient integer field: leading whitespace is
    /// skipped and the leading signed digit run is used, so `"9 apples"`
    /// counts as 9. No leading digits fails.
    pub fn accepts(&self, answer: &str) -> bool {
        leading_integer(answer).is_some_and(|value| value == self.expected_sum)
    }

    pub fn prompt(&self) -> ChallengePrompt {
        ChallengePrompt {
            operand_a: self.operand_a,
            operand_b: self.operand_b,
            question: format!("Quick check: what is {} + {}?", self.operand_a, self.operand_b),
            hint: messages::CHALLENGE_HINT.to_string(),
        }
    }
}

/// Parse the optionally signed base-10 digit run at the start of `input`
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let sign_len = trimmed.len() - unsigned.len();
    // Overflowing digit runs cannot match a small sum, so failing is fine.
    trimmed[..sign_len + digits].parse().ok()
}

/// Client-facing view of a [`Challenge`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengePrompt {
    pub operand_a: i64,
    pub operand_b: i64,
    pub question: String,
    pub hint: String,
}

/// Why a submission was stopped before reaching the authentication API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Honeypot field was non-empty
    Honeypot,
    /// A cooldown is running
    CooldownActive { remaining_seconds: u64 },
    /// Challenge armed and the answer was wrong
    ChallengeFailed,
}

/// Outcome of screening a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the credentials
    Proceed,
    /// Stop locally
    Reject(Rejection),
}

impl From<Rejection> for GatehouseError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Honeypot => Self::HoneypotTriggered,
            Rejection::CooldownActive { remaining_seconds } => {
                Self::CooldownActive { remaining_seconds }
            }
            Rejection::ChallengeFailed => Self::ChallengeFailed,
        }
    }
}

/// Guard state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPhase {
    /// No challenge, no cooldown
    #[default]
    Idle,
    /// Challenge must be answered with the next submission
    ChallengeArmed,
    /// Submissions refused until the countdown reaches zero
    Cooldown,
}

/// Snapshot of a login view, as rendered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatus {
    /// Login view identifier
    pub session_id: String,

    /// Current phase
    pub phase: GuardPhase,

    /// Consecutive failed authentications
    pub failed_attempts: u32,

    /// Whole seconds left in the cooldown (0 when none)
    pub remaining_seconds: u64,

    /// Challenge to answer with the next submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengePrompt>,

    /// Informational line for the login form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl LoginStatus {
    /// Notice text for a phase and attempt count
    pub fn notice_for(
        phase: GuardPhase,
        failed_attempts: u32,
        remaining_seconds: u64,
    ) -> Option<String> {
        match phase {
            GuardPhase::Cooldown => Some(format!(
                "Too many attempts. Try again in {remaining_seconds}s."
            )),
            _ if failed_attempts > 0 => Some(format!(
                "Failed attempts: {failed_attempts}. \
                 Make sure your email/username and password are correct."
            )),
            _ => None,
        }
    }
}

/// Counter snapshot for monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Login views currently open
    pub active_sessions: u64,

    /// Submissions forwarded to the authentication API
    pub forwarded: u64,

    /// Successful logins
    pub succeeded: u64,

    /// Failed authentications
    pub failed: u64,

    /// Submissions stopped by the honeypot
    pub rejected_honeypot: u64,

    /// Submissions stopped by a cooldown
    pub rejected_cooldown: u64,

    /// Submissions stopped by a wrong challenge answer
    pub rejected_challenge: u64,
}
