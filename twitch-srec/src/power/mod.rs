//! OS sleep inhibition while recordings are in progress.
//!
//! The OS switch is process-wide, so it is reference counted: the first
//! recording turns it on, the last one to finish turns it off. References are
//! RAII guards, which keeps the count right even when a target task panics.

use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::Result;
use crate::utils::process::tokio_command;

/// The OS-level on/off switch.
pub trait SleepInhibitor: Send + Sync + 'static {
    fn inhibit(&self) -> Result<()>;
    fn release(&self) -> Result<()>;
}

/// Inhibitor that does nothing, used when inhibition is disabled.
#[derive(Debug, Default)]
pub struct NoopInhibitor;

impl SleepInhibitor for NoopInhibitor {
    fn inhibit(&self) -> Result<()> {
        Ok(())
    }

    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Holds a long-running command while inhibited, e.g.
/// `systemd-inhibit --what=sleep:idle sleep infinity`, and kills it on release.
///
/// Neither edge blocks: the holder is spawned through tokio with
/// `kill_on_drop`, and release only signals it. Tokio reaps the exited child
/// in the background.
pub struct ProcessInhibitor {
    program: String,
    args: Vec<String>,
    child: Mutex<Option<tokio::process::Child>>,
}

impl ProcessInhibitor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: Mutex::new(None),
        }
    }

    /// `systemd-inhibit` blocking sleep and idle until released.
    pub fn systemd() -> Self {
        Self::new(
            "systemd-inhibit",
            [
                "--what=sleep:idle",
                "--who=twitch-srec",
                "--why=Recording stream",
                "--mode=block",
                "sleep",
                "infinity",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

impl SleepInhibitor for ProcessInhibitor {
    fn inhibit(&self) -> Result<()> {
        let mut child = self.child.lock();
        if child.is_some() {
            return Ok(());
        }
        let spawned = tokio_command(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| crate::Error::process(format!("Failed to spawn {}: {}", self.program, e)))?;
        debug!(pid = ?spawned.id(), "started {}", self.program);
        *child = Some(spawned);
        Ok(())
    }

    fn release(&self) -> Result<()> {
        if let Some(mut child) = self.child.lock().take() {
            if let Err(e) = child.start_kill() {
                debug!("inhibitor process already gone: {}", e);
            }
        }
        Ok(())
    }
}

struct CounterState {
    active: usize,
}

/// Reference-counted access to a [`SleepInhibitor`].
#[derive(Clone)]
pub struct InhibitCounter {
    inhibitor: Arc<dyn SleepInhibitor>,
    state: Arc<Mutex<CounterState>>,
}

impl InhibitCounter {
    pub fn new(inhibitor: Arc<dyn SleepInhibitor>) -> Self {
        Self {
            inhibitor,
            state: Arc::new(Mutex::new(CounterState { active: 0 })),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopInhibitor))
    }

    /// Number of outstanding guards.
    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Take a reference; the OS switch is turned on on 0 -> 1.
    pub fn acquire(&self) -> InhibitGuard {
        let mut state = self.state.lock();
        state.active += 1;
        if state.active == 1 {
            match self.inhibitor.inhibit() {
                Ok(()) => info!("Sleep inhibition enabled"),
                Err(e) => warn!("Failed to enable sleep inhibition: {}", e),
            }
        }
        InhibitGuard {
            counter: self.clone(),
        }
    }

    fn release_one(&self) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);
        if state.active == 0 {
            match self.inhibitor.release() {
                Ok(()) => info!("Sleep inhibition disabled"),
                Err(e) => warn!("Failed to disable sleep inhibition: {}", e),
            }
        }
    }
}

/// One recording's hold on sleep inhibition. Released on drop.
pub struct InhibitGuard {
    counter: InhibitCounter,
}

impl Drop for InhibitGuard {
    fn drop(&mut self) {
        self.counter.release_one();
    }
}
