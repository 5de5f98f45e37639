//! Login views.
//!
//! A view is one client's login session. It owns a guard and, while a
//! cooldown runs, a countdown ticker. Nothing is shared between views and
//! nothing outlives them.

mod registry;
mod session;
mod ticker;

pub use registry::{SessionRegistry, random_operands, session_sweeper};
pub use session::LoginForm;
