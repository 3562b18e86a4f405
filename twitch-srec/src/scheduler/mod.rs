//! Recorder mode: one supervised state machine per watched target.

mod actor;
mod restart_tracker;
mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use actor::{
    ActorOutcome, NOT_FOUND_BACKOFF, PROBE_ERROR_DELAY, RESOLVE_RETRY_DELAY, RecorderContext,
    RecorderSettings, TargetActor,
};
pub use restart_tracker::{RestartPolicy, RestartTracker};
pub use service::Scheduler;
