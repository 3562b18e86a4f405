//! Watcher mode.
//!
//! Instead of recording, keeps an eye on a separate recorder machine: while
//! it is unreachable and one of the targets goes live, wake it over the LAN.

mod reachability;
mod service;
mod wake;

pub use reachability::{PingProbe, ReachabilityProbe};
pub use service::{TickOutcome, WAKE_POLL_DELAY, Watcher};
pub use wake::{MacAddress, MagicPacketSender, WakeSender};
