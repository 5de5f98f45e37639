//! Shared constants for Gatehouse components.

/// Default Gatehouse HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default base URL of the authentication API
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8000/api";

/// Login endpoint, relative to the authentication API base URL
pub const AUTH_LOGIN_PATH: &str = "/auth/login";

/// Default authentication request timeout (seconds)
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;

/// Failed attempts that arm the arithmetic challenge
pub const CHALLENGE_THRESHOLD: u32 = 3;

/// Failed attempts that start a cooldown
pub const COOLDOWN_THRESHOLD: u32 = 5;

/// Cooldown applied at the first cooldown-triggering failure (seconds)
pub const PENALTY_BASE_SECS: u64 = 30;

/// Cooldown added per further failure (seconds)
pub const PENALTY_STEP_SECS: u64 = 15;

/// Longest cooldown ever applied (seconds)
pub const PENALTY_CAP_SECS: u64 = 90;

/// Upper bound accepted for a configured cooldown cap (one day)
pub const MAX_PENALTY_CAP_SECS: u64 = 86_400;

/// Countdown refresh granularity (milliseconds)
pub const COUNTDOWN_TICK_MS: u64 = 500;

/// Smallest challenge operand
pub const OPERAND_MIN: i64 = 2;

/// Number of distinct challenge operand values, so operands span [2, 7]
pub const OPERAND_SPAN: i64 = 6;

/// Login view idle expiry (30 minutes)
pub const SESSION_IDLE_TTL_SECS: u64 = 1800;

/// How often idle login views are swept (seconds)
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// User-facing messages
pub mod messages {
    /// Shown for honeypot hits. Must not hint at why the request failed.
    pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

    /// Default message when the authentication API gives none
    pub const DEFAULT_AUTH_FAILURE: &str = "Invalid email/username or password";

    /// Wrong or unparseable challenge answer
    pub const CHALLENGE_FAILED: &str = "Verification answer is incorrect.";

    /// Explains why the challenge is shown
    pub const CHALLENGE_HINT: &str =
        "This check helps protect your account from automated login attempts.";
}

