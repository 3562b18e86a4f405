//! Domain types: targets, live sessions and the per-target state machine.

pub mod session;
pub mod state;
pub mod target;

pub use session::{Session, SessionInfo};
pub use state::TargetState;
pub use target::{IdCache, Target};
