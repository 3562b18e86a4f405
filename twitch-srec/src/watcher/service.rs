//! Watcher mode loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::reachability::ReachabilityProbe;
use super::wake::WakeSender;
use crate::Result;
use crate::domain::{IdCache, Target};
use crate::monitor::{AvailabilityProber, LiveStatus, Resolution};

/// Delay between reachability checks while waiting for a woken host.
pub const WAKE_POLL_DELAY: Duration = Duration::from_secs(1);

/// What one watcher tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The recorder host answered, nothing else was checked.
    HostAwake,
    /// Host asleep and no target live.
    NobodyLive,
    /// Host asleep, `target` live, wake sent and the host came up.
    WokeHost { target: String },
    Cancelled,
}

pub struct Watcher {
    targets: Vec<Target>,
    prober: Arc<dyn AvailabilityProber>,
    ids: IdCache,
    reachability: Arc<dyn ReachabilityProbe>,
    wake: Arc<dyn WakeSender>,
    refresh: Duration,
}

impl Watcher {
    pub fn new(
        targets: Vec<Target>,
        prober: Arc<dyn AvailabilityProber>,
        reachability: Arc<dyn ReachabilityProbe>,
        wake: Arc<dyn WakeSender>,
        refresh: Duration,
    ) -> Self {
        Self {
            targets,
            prober,
            ids: IdCache::new(),
            reachability,
            wake,
            refresh,
        }
    }

    /// Tick until `cancel` fires, waiting `refresh` after every tick that did not wake the host.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        if self.targets.is_empty() {
            return Err(crate::Error::config("no targets configured"));
        }
        info!(
            "Watching {} target(s) every {:?}",
            self.targets.len(),
            self.refresh
        );

        loop {
            let outcome = self.tick(&cancel).await;
            debug!(?outcome, "watcher tick");
            match outcome {
                TickOutcome::Cancelled => break,
                // the next tick finds the host awake and waits there
                TickOutcome::WokeHost { .. } => continue,
                TickOutcome::HostAwake | TickOutcome::NobodyLive => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.refresh) => {}
            }
        }
        info!("Watcher stopped");
        Ok(())
    }

    pub async fn tick(&self, cancel: &CancellationToken) -> TickOutcome {
        if self.reachability.is_reachable().await {
            debug!("recorder host is reachable");
            return TickOutcome::HostAwake;
        }

        for target in &self.targets {
            if cancel.is_cancelled() {
                return TickOutcome::Cancelled;
            }
            let Some(id) = self.channel_id(target).await else {
                continue;
            };
            match self.prober.probe(&id).await {
                LiveStatus::Online(info) => {
                    info!("{} is live ({}), waking recorder", target, info.title);
                    return self.wake_and_wait(target, cancel).await;
                }
                LiveStatus::Offline => debug!(target_name = %target, "offline"),
                LiveStatus::Error(e) => warn!("Live check for {} failed: {}", target, e),
            }
        }
        TickOutcome::NobodyLive
    }

    async fn wake_and_wait(&self, target: &Target, cancel: &CancellationToken) -> TickOutcome {
        if let Err(e) = self.wake.wake().await {
            warn!("Failed to send wake signal: {}", e);
        }

        info!("Waiting for the recorder to wake up...");
        while !self.reachability.is_reachable().await {
            tokio::select! {
                _ = cancel.cancelled() => return TickOutcome::Cancelled,
                _ = tokio::time::sleep(WAKE_POLL_DELAY) => {}
            }
        }
        info!("The recorder is awake");
        TickOutcome::WokeHost {
            target: target.name.clone(),
        }
    }

    async fn channel_id(&self, target: &Target) -> Option<String> {
        if let Some(id) = self.ids.get(&target.name) {
            return Some(id);
        }
        match self.prober.resolve(&target.name).await {
            Resolution::Found(id) => {
                self.ids.insert(&target.name, id.clone());
                Some(id)
            }
            Resolution::NotFound => {
                warn!("Channel {} not found", target);
                None
            }
            Resolution::Error(e) => {
                warn!("Could not resolve {}: {}", target, e);
                None
            }
        }
    }
}
