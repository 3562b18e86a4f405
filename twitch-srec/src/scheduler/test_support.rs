//! Scripted collaborators for scheduler tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::domain::{IdCache, SessionInfo};
use crate::downloader::{CaptureEngine, CaptureRequest};
use crate::monitor::{AvailabilityProber, LiveStatus, Resolution};
use crate::pipeline::RepairEngine;
use crate::power::{InhibitCounter, SleepInhibitor};
use crate::scheduler::{RecorderContext, RecorderSettings};
use crate::storage::StorageLayout;
use crate::utils::process::ExitOutcome;

pub fn online(title: &str) -> LiveStatus {
    LiveStatus::Online(SessionInfo {
        id: "s1".into(),
        title: title.into(),
        category: None,
    })
}

/// Replays per-name scripts and cancels `cancel` once every script is used up.
pub struct ScriptedProber {
    start: Instant,
    cancel: CancellationToken,
    resolutions: Mutex<HashMap<String, VecDeque<Resolution>>>,
    statuses: Mutex<HashMap<String, VecDeque<LiveStatus>>>,
    pub resolve_calls: Mutex<Vec<(String, Duration)>>,
    pub probe_calls: Mutex<Vec<(String, Duration)>>,
    /// Probing this id panics the first time.
    panic_once_on: Mutex<Option<String>>,
}

impl ScriptedProber {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            start: Instant::now(),
            cancel,
            resolutions: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            resolve_calls: Mutex::new(Vec::new()),
            probe_calls: Mutex::new(Vec::new()),
            panic_once_on: Mutex::new(None),
        }
    }

    pub fn resolve_script(self, name: &str, script: Vec<Resolution>) -> Self {
        self.resolutions.lock().insert(name.to_string(), script.into());
        self
    }

    /// Statuses returned for the id `id-<name>`.
    pub fn probe_script(self, name: &str, script: Vec<LiveStatus>) -> Self {
        self.statuses
            .lock()
            .insert(format!("id-{name}"), script.into());
        self
    }

    pub fn panic_once_on(self, name: &str) -> Self {
        *self.panic_once_on.lock() = Some(format!("id-{name}"));
        self
    }

    pub fn probe_times(&self, name: &str) -> Vec<Duration> {
        let id = format!("id-{name}");
        self.probe_calls
            .lock()
            .iter()
            .filter(|(n, _)| *n == id)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn resolve_times(&self, name: &str) -> Vec<Duration> {
        self.resolve_calls
            .lock()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .collect()
    }

    fn finished(&self) -> bool {
        self.statuses.lock().values().all(VecDeque::is_empty)
    }
}

#[async_trait]
impl AvailabilityProber for ScriptedProber {
    async fn resolve(&self, name: &str) -> Resolution {
        self.resolve_calls
            .lock()
            .push((name.to_string(), self.start.elapsed()));
        self.resolutions
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Resolution::Found(format!("id-{name}")))
    }

    async fn probe(&self, id: &str) -> LiveStatus {
        self.probe_calls
            .lock()
            .push((id.to_string(), self.start.elapsed()));

        let should_panic = {
            let mut panic_on = self.panic_once_on.lock();
            if panic_on.as_deref() == Some(id) {
                *panic_on = None;
                true
            } else {
                false
            }
        };
        if should_panic {
            panic!("prober blew up for {id}");
        }

        let next = self.statuses.lock().get_mut(id).and_then(VecDeque::pop_front);
        match next {
            Some(status) => status,
            None => {
                if self.finished() {
                    self.cancel.cancel();
                }
                LiveStatus::Offline
            }
        }
    }
}

/// Writes a small file to the requested path, optionally "streaming" for a while.
#[derive(Default)]
pub struct FakeCapture {
    pub duration: Duration,
    /// Skip writing the output file.
    pub write_nothing: bool,
    /// Fail to start.
    pub fail_spawn: bool,
    pub exit_code: i32,
    pub requests: Mutex<Vec<CaptureRequest>>,
    pub running: AtomicUsize,
    pub max_running: AtomicUsize,
}

#[async_trait]
impl CaptureEngine for FakeCapture {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<ExitOutcome> {
        self.requests.lock().push(request.clone());
        if self.fail_spawn {
            return Err(crate::Error::process("Failed to spawn fake: not found"));
        }

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        if !self.write_nothing {
            std::fs::write(&request.output_path, b"raw ts data")?;
        }
        tokio::time::sleep(self.duration).await;
        self.running.fetch_sub(1, Ordering::SeqCst);

        Ok(ExitOutcome::with_code(self.exit_code))
    }
}

/// Copies input to output. With `fail` set the copy is left behind as
/// partial output and the tool reports a failure.
#[derive(Default)]
pub struct CopyRepair {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl RepairEngine for CopyRepair {
    async fn repair(&self, input: &Path, output: &Path) -> Result<ExitOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::fs::copy(input, output)?;
        if self.fail.load(Ordering::SeqCst) {
            return Ok(ExitOutcome::with_code(1));
        }
        Ok(ExitOutcome::success())
    }
}

#[derive(Default)]
pub struct CountingInhibitor {
    pub on: AtomicUsize,
    pub off: AtomicUsize,
}

impl SleepInhibitor for CountingInhibitor {
    fn inhibit(&self) -> Result<()> {
        self.on.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<()> {
        self.off.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn settings(repair_on_finish: bool) -> RecorderSettings {
    RecorderSettings {
        refresh: Duration::from_secs(15),
        quality: "best".into(),
        extension: "mp4".into(),
        repair_on_finish,
    }
}

pub fn context(
    root: &Path,
    prober: Arc<ScriptedProber>,
    capture: Arc<FakeCapture>,
    repair: Arc<CopyRepair>,
    inhibitor: Arc<CountingInhibitor>,
    settings: RecorderSettings,
) -> RecorderContext {
    RecorderContext {
        prober,
        capture,
        repair,
        layout: StorageLayout::new(root),
        inhibit: InhibitCounter::new(inhibitor),
        ids: IdCache::new(),
        settings: Arc::new(settings),
    }
}
