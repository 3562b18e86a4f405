//! Availability probing.
//!
//! Resolves channel names to platform ids and checks whether a channel is
//! live. Authentication failures refresh the shared token before the error
//! is reported, so the caller's next retry runs with a fresh token.

mod helix;
mod prober;

pub use helix::{HelixProber, PlatformApi};
pub use prober::{AvailabilityProber, LiveStatus, Resolution};
