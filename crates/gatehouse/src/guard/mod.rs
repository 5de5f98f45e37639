//! Login attempt guard.
//!
//! Screens login submissions before they reach the authentication API:
//! a hidden honeypot field, an escalating cooldown after repeated failures,
//! and a small arithmetic challenge once failures pile up.
//!
//! These checks are a usability speed bump, not a security boundary. A
//! client that talks to the authentication API directly never meets them;
//! real throttling belongs to the authentication service.

mod attempts;
mod challenge;
mod decision;
mod policy;

pub use attempts::LoginGuard;
pub use challenge::{OperandSource, RngOperands};
pub use policy::GuardPolicy;

#[cfg(test)]
pub use challenge::ScriptedOperands;
