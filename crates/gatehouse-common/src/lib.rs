//! # Gatehouse Common
//!
//! Shared types, errors, and constants used across Gatehouse components.
//!
//! ## Modules
//! - `types` - Guard data (AttemptState, Challenge, Decision, LoginStatus)
//! - `error` - Common error type
//! - `constants` - Thresholds, defaults, and user-facing messages

pub mod constants;
pub mod error;
pub mod types;

pub use error::GatehouseError;
pub use types::*;
