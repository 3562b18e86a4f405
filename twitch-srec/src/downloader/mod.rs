//! Capture supervision.

mod capture;
mod streamlink;

pub use capture::{CaptureEngine, CaptureRequest};
pub use streamlink::{StreamlinkConfig, StreamlinkEngine};
