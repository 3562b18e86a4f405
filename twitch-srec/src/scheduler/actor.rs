//! Per-target state machine.
//!
//! A `TargetActor` owns everything about one watched channel: its resolved
//! id, the current session, the capture subprocess (through the capture
//! engine future) and its hold on sleep inhibition. Nothing in here is shared
//! with other targets except the read-mostly collaborators in
//! [`RecorderContext`].
//!
//! # Timing
//!
//! | Situation                        | Next step after     |
//! |----------------------------------|---------------------|
//! | channel not found                | 600 s               |
//! | resolve failed                   | 1 s                 |
//! | offline                          | `refresh`           |
//! | probe failed                     | 15 s                |
//! | capture could not start          | 15 s                |
//! | capture, relocation, repair done | immediately         |

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::domain::{IdCache, Session, Target, TargetState};
use crate::downloader::{CaptureEngine, CaptureRequest};
use crate::monitor::{AvailabilityProber, LiveStatus, Resolution};
use crate::pipeline::{RepairEngine, RepairOutcome, repair_recording};
use crate::power::{InhibitCounter, InhibitGuard};
use crate::storage::{Role, StorageLayout};

/// Wait after the platform reports no such channel.
pub const NOT_FOUND_BACKOFF: Duration = Duration::from_secs(600);
/// Wait after a failed id lookup.
pub const RESOLVE_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Wait after a failed live probe or a capture that never started.
pub const PROBE_ERROR_DELAY: Duration = Duration::from_secs(15);

/// Settings shared by every target in recorder mode.
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    /// Poll interval while offline.
    pub refresh: Duration,
    pub quality: String,
    /// Output container extension, without the dot.
    pub extension: String,
    pub repair_on_finish: bool,
}

/// Collaborators handed to every target actor.
#[derive(Clone)]
pub struct RecorderContext {
    pub prober: Arc<dyn AvailabilityProber>,
    pub capture: Arc<dyn CaptureEngine>,
    pub repair: Arc<dyn RepairEngine>,
    pub layout: StorageLayout,
    pub inhibit: InhibitCounter,
    pub ids: IdCache,
    pub settings: Arc<RecorderSettings>,
}

/// How an actor's run loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorOutcome {
    Cancelled,
}

pub struct TargetActor {
    target: Target,
    ctx: RecorderContext,
    state: TargetState,
    channel_id: Option<String>,
    session: Option<Session>,
    inhibit: Option<InhibitGuard>,
}

impl TargetActor {
    pub fn new(target: Target, ctx: RecorderContext) -> Self {
        Self {
            target,
            ctx,
            state: TargetState::default(),
            channel_id: None,
            session: None,
            inhibit: None,
        }
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Drive the state machine until `cancel` fires.
    ///
    /// Cancellation interrupts waits, probes and captures. Relocation and
    /// repair run to completion first.
    ///
    /// Every error the collaborators can produce is handled inside the step
    /// that hit it. An `Err` from here means the state machine itself is
    /// broken, e.g. an invalid transition.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<ActorOutcome> {
        info!("Watching {}", self.target);

        loop {
            let delay = if self.state.is_archiving() {
                // a finished capture is always moved out of the in-progress root
                self.step().await?
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    delay = self.step() => delay?,
                }
            };

            if delay.is_zero() {
                continue;
            }
            debug!(target_name = %self.target, state = %self.state, "waiting {:?}", delay);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if let Some(session) = self.session.take() {
            warn!(
                "Stopped {} mid-session, partial file left in {}: {}",
                self.target,
                Role::Recording,
                session.file_name
            );
        }
        info!("Stopped watching {}", self.target);
        Ok(ActorOutcome::Cancelled)
    }

    /// Run the current state's work and return how long to wait before the next step.
    async fn step(&mut self) -> Result<Duration> {
        match self.state {
            TargetState::ResolvingId => self.resolve_id().await,
            TargetState::Polling => self.poll().await,
            TargetState::LiveTransitioning => self.go_live(),
            TargetState::Recording => self.record().await,
            TargetState::Relocating => self.relocate().await,
            TargetState::Repairing => self.repair().await,
        }
    }

    fn transition(&mut self, next: TargetState) -> Result<()> {
        let next = self.state.transition_to(next)?;
        if next != self.state {
            debug!(target_name = %self.target, from = %self.state, to = %next, "state transition");
        }
        self.state = next;
        Ok(())
    }

    async fn resolve_id(&mut self) -> Result<Duration> {
        if let Some(id) = self.ctx.ids.get(&self.target.name) {
            self.channel_id = Some(id);
            self.transition(TargetState::Polling)?;
            return Ok(Duration::ZERO);
        }

        match self.ctx.prober.resolve(&self.target.name).await {
            Resolution::Found(id) => {
                info!("Resolved {} to channel id {}", self.target, id);
                self.ctx.ids.insert(&self.target.name, id.clone());
                self.channel_id = Some(id);
                self.transition(TargetState::Polling)?;
                Ok(Duration::ZERO)
            }
            Resolution::NotFound => {
                warn!(
                    "Channel {} not found, checking again in {:?}",
                    self.target, NOT_FOUND_BACKOFF
                );
                self.transition(TargetState::ResolvingId)?;
                Ok(NOT_FOUND_BACKOFF)
            }
            Resolution::Error(e) => {
                warn!("Could not resolve {}: {}", self.target, e);
                Ok(RESOLVE_RETRY_DELAY)
            }
        }
    }

    async fn poll(&mut self) -> Result<Duration> {
        let Some(id) = self.channel_id.as_deref() else {
            return Err(crate::Error::Other(format!(
                "{} is polling without a channel id",
                self.target
            )));
        };

        match self.ctx.prober.probe(id).await {
            LiveStatus::Offline => {
                info!(
                    "{} is offline, checking again in {:?}",
                    self.target, self.ctx.settings.refresh
                );
                self.transition(TargetState::Polling)?;
                Ok(self.ctx.settings.refresh)
            }
            LiveStatus::Error(e) => {
                warn!("Live check for {} failed: {}", self.target, e);
                Ok(PROBE_ERROR_DELAY)
            }
            LiveStatus::Online(info) => {
                let session = Session::new(
                    Local::now(),
                    &self.target.name,
                    info,
                    &self.ctx.settings.extension,
                );
                info!("{} is live: {}", self.target, session.title());
                self.session = Some(session);
                self.transition(TargetState::LiveTransitioning)?;
                Ok(Duration::ZERO)
            }
        }
    }

    fn go_live(&mut self) -> Result<Duration> {
        self.inhibit = Some(self.ctx.inhibit.acquire());
        self.transition(TargetState::Recording)?;
        Ok(Duration::ZERO)
    }

    async fn record(&mut self) -> Result<Duration> {
        let session = self.current_session()?;
        let request = CaptureRequest {
            target: self.target.clone(),
            title: session.title().to_string(),
            quality: self.ctx.settings.quality.clone(),
            output_path: self.ctx.layout.path(Role::Recording, &session.file_name),
        };

        info!(
            "Recording {} with {} to {}",
            self.target,
            self.ctx.capture.name(),
            request.output_path.display()
        );
        match self.ctx.capture.capture(&request).await {
            Ok(outcome) => {
                if !outcome.is_success() {
                    warn!("Capture of {} ended with {}", self.target, outcome);
                }
                info!("Recording of {} finished", self.target);
                self.transition(TargetState::Relocating)?;
                Ok(Duration::ZERO)
            }
            Err(e) => {
                error!("Could not start capture for {}: {}", self.target, e);
                self.end_session();
                self.transition(TargetState::Polling)?;
                Ok(PROBE_ERROR_DELAY)
            }
        }
    }

    async fn relocate(&mut self) -> Result<Duration> {
        let file_name = self.current_session()?.file_name.clone();

        match self
            .ctx
            .layout
            .relocate(&file_name, Role::Recording, Role::Recorded)
            .await
        {
            Ok(path) => {
                info!("Saved {}", path.display());
                if self.ctx.settings.repair_on_finish {
                    self.transition(TargetState::Repairing)?;
                } else {
                    self.end_session();
                    self.transition(TargetState::Polling)?;
                }
            }
            Err(e) => {
                warn!("Could not archive recording of {}: {}", self.target, e);
                self.end_session();
                self.transition(TargetState::Polling)?;
            }
        }
        Ok(Duration::ZERO)
    }

    async fn repair(&mut self) -> Result<Duration> {
        let file_name = self.current_session()?.file_name.clone();
        match repair_recording(&self.ctx.layout, self.ctx.repair.as_ref(), &file_name).await {
            RepairOutcome::Repaired { output } => {
                info!("Recording of {} repaired: {}", self.target, output.display());
            }
            RepairOutcome::Failed { reason } => {
                warn!(
                    "Keeping raw recording of {} in {} for the next startup sweep: {}",
                    self.target,
                    Role::Recorded,
                    reason
                );
            }
        }
        self.end_session();
        self.transition(TargetState::Polling)?;
        Ok(Duration::ZERO)
    }

    fn current_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| {
            crate::Error::Other(format!("{} is {} without a session", self.target, self.state))
        })
    }

    fn end_session(&mut self) {
        self.session = None;
        self.inhibit = None;
    }
}
