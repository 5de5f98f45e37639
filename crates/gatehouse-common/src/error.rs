//! Common error types for Gatehouse components.

use thiserror::Error;

use crate::constants::messages;

/// Common errors across Gatehouse components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatehouseError {
    /// Honeypot field was filled in. Displays the generic failure text only.
    #[error("{}", messages::GENERIC_FAILURE)]
    HoneypotTriggered,

    /// Submission refused while a cooldown is running
    #[error("Wait {remaining_seconds}s before trying again.")]
    CooldownActive { remaining_seconds: u64 },

    /// Challenge answer missing, unparseable, or wrong
    #[error("{}", messages::CHALLENGE_FAILED)]
    ChallengeFailed,

    /// Authentication API rejected the credentials (or could not be reached)
    #[error("{message}")]
    AuthenticationFailed { message: String },

    /// No login view with this id
    #[error("Login session not found: {0}")]
    SessionNotFound(String),

    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatehouseError {
    /// Build an authentication failure, falling back to the default message
    pub fn authentication_failed(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| messages::DEFAULT_AUTH_FAILURE.to_string());
        Self::AuthenticationFailed { message }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::HoneypotTriggered => 401,
            Self::CooldownActive { .. } => 429,
            Self::ChallengeFailed => 422,
            Self::AuthenticationFailed { .. } => 401,
            Self::SessionNotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Config(_) => 500,
        }
    }

    /// Machine-readable error kind.
    ///
    /// Honeypot hits share `login_failed` with credential failures so a
    /// client cannot tell them apart.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HoneypotTriggered | Self::AuthenticationFailed { .. } => "login_failed",
            Self::CooldownActive { .. } => "cooldown_active",
            Self::ChallengeFailed => "challenge_failed",
            Self::SessionNotFound(_) => "session_not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "internal",
        }
    }
}
