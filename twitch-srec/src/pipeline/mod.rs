//! Post-capture processing.

mod ffmpeg;
mod repair;

pub use ffmpeg::FfmpegRepair;
pub use repair::{RepairEngine, RepairOutcome, SweepReport, repair_recording, sweep_recorded};
