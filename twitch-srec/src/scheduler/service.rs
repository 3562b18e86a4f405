//! Recorder-mode scheduler.
//!
//! Spawns one [`TargetActor`] task per configured target into a `JoinSet`
//! and supervises them: an actor that returns an error or panics is logged
//! and restarted with backoff, while its siblings keep running untouched.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::{AbortHandle, Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::actor::{ActorOutcome, RecorderContext, TargetActor};
use super::restart_tracker::RestartTracker;
use crate::domain::Target;
use crate::pipeline::sweep_recorded;
use crate::{Error, Result};

pub struct Scheduler {
    targets: Vec<Target>,
    ctx: RecorderContext,
}

impl Scheduler {
    pub fn new(targets: Vec<Target>, ctx: RecorderContext) -> Self {
        Self { targets, ctx }
    }

    /// Create the role directories and, when repair is on, repair whatever a
    /// previous run left in `recorded/`.
    pub async fn prepare(&self) -> Result<()> {
        self.ctx.layout.ensure_dirs().await?;
        if self.ctx.settings.repair_on_finish {
            let report = sweep_recorded(&self.ctx.layout, self.ctx.repair.as_ref()).await?;
            if !report.failed.is_empty() {
                warn!("Could not repair: {}", report.failed.join(", "));
            }
        }
        Ok(())
    }

    /// Run every target until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::config("no targets configured"));
        }
        self.prepare().await?;

        let mut tasks = JoinSet::new();
        let mut running: HashMap<Id, Target> = HashMap::new();
        let mut tracker = RestartTracker::default();

        for target in &self.targets {
            let handle = self.spawn(&mut tasks, target.clone(), Duration::ZERO, &cancel);
            running.insert(handle.id(), target.clone());
        }
        info!("Watching {} target(s)", self.targets.len());

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, crash) = match joined {
                Ok((id, Ok(ActorOutcome::Cancelled))) => (id, None),
                Ok((id, Err(e))) => (id, Some(e.to_string())),
                Err(e) if e.is_panic() => (e.id(), Some("task panicked".to_string())),
                Err(e) => (e.id(), None),
            };
            let Some(target) = running.remove(&id) else {
                continue;
            };

            match crash {
                Some(reason) if !cancel.is_cancelled() => {
                    error!("Target {} crashed: {}", target, reason);
                    let delay = tracker.record_crash(&target.name);
                    let handle = self.spawn(&mut tasks, target.clone(), delay, &cancel);
                    running.insert(handle.id(), target);
                }
                _ => debug!("Target {} stopped", target),
            }
        }

        info!("All targets stopped");
        Ok(())
    }

    fn spawn(
        &self,
        tasks: &mut JoinSet<Result<ActorOutcome>>,
        target: Target,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> AbortHandle {
        let actor = TargetActor::new(target, self.ctx.clone());
        let cancel = cancel.clone();
        tasks.spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(ActorOutcome::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            actor.run(cancel).await
        })
    }
}
