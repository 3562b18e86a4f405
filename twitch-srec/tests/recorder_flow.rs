//! End-to-end runs of both modes against scripted collaborators.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use twitch_srec::Result;
use twitch_srec::domain::{IdCache, SessionInfo, Target};
use twitch_srec::downloader::{CaptureEngine, CaptureRequest};
use twitch_srec::monitor::{AvailabilityProber, LiveStatus, Resolution};
use twitch_srec::pipeline::RepairEngine;
use twitch_srec::power::InhibitCounter;
use twitch_srec::scheduler::{RecorderContext, RecorderSettings, Scheduler};
use twitch_srec::storage::{Role, StorageLayout};
use twitch_srec::utils::process::ExitOutcome;
use twitch_srec::watcher::{ReachabilityProbe, TickOutcome, WakeSender, Watcher};

struct Script {
    statuses: Mutex<VecDeque<LiveStatus>>,
    cancel: CancellationToken,
}

impl Script {
    fn new(cancel: CancellationToken, statuses: Vec<LiveStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            cancel,
        }
    }
}

#[async_trait]
impl AvailabilityProber for Script {
    async fn resolve(&self, name: &str) -> Resolution {
        Resolution::Found(format!("id-{name}"))
    }

    async fn probe(&self, _id: &str) -> LiveStatus {
        let next = self.statuses.lock().pop_front();
        next.unwrap_or_else(|| {
            self.cancel.cancel();
            LiveStatus::Offline
        })
    }
}

struct WriteCapture;

#[async_trait]
impl CaptureEngine for WriteCapture {
    fn name(&self) -> &'static str {
        "write"
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<ExitOutcome> {
        tokio::fs::write(&request.output_path, b"raw ts data").await?;
        tokio::time::sleep(Duration::from_secs(90)).await;
        Ok(ExitOutcome::success())
    }
}

struct CopyRepair;

#[async_trait]
impl RepairEngine for CopyRepair {
    async fn repair(&self, input: &Path, output: &Path) -> Result<ExitOutcome> {
        tokio::fs::copy(input, output).await?;
        Ok(ExitOutcome::success())
    }
}

fn live(title: &str) -> LiveStatus {
    LiveStatus::Online(SessionInfo {
        id: "s1".into(),
        title: title.into(),
        category: Some("Chess".into()),
    })
}

fn file_names(layout: &StorageLayout, role: Role) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(layout.dir(role))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test(start_paused = true)]
async fn test_live_session_ends_up_repaired_in_processed() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let layout = StorageLayout::new(dir.path());

    let ctx = RecorderContext {
        prober: Arc::new(Script::new(
            cancel.clone(),
            vec![live("Big Win???"), LiveStatus::Offline],
        )),
        capture: Arc::new(WriteCapture),
        repair: Arc::new(CopyRepair),
        layout: layout.clone(),
        inhibit: InhibitCounter::disabled(),
        ids: IdCache::new(),
        settings: Arc::new(RecorderSettings {
            refresh: Duration::from_secs(15),
            quality: "best".into(),
            extension: "mp4".into(),
            repair_on_finish: true,
        }),
    };

    Scheduler::new(vec![Target::new("alice")], ctx.clone())
        .run(cancel)
        .await
        .unwrap();

    assert!(file_names(&layout, Role::Recording).is_empty());
    assert!(file_names(&layout, Role::Recorded).is_empty());
    let processed = file_names(&layout, Role::Processed);
    assert_eq!(processed.len(), 1);
    assert!(processed[0].ends_with(" - alice - Big Win.mp4"), "{processed:?}");
    assert_eq!(ctx.ids.get("alice").as_deref(), Some("id-alice"));
}

#[tokio::test(start_paused = true)]
async fn test_live_session_without_repair_stays_in_recorded() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let layout = StorageLayout::new(dir.path());

    let ctx = RecorderContext {
        prober: Arc::new(Script::new(cancel.clone(), vec![live("Speedrun")])),
        capture: Arc::new(WriteCapture),
        repair: Arc::new(CopyRepair),
        layout: layout.clone(),
        inhibit: InhibitCounter::disabled(),
        ids: IdCache::new(),
        settings: Arc::new(RecorderSettings {
            refresh: Duration::from_secs(15),
            quality: "best".into(),
            extension: "ts".into(),
            repair_on_finish: false,
        }),
    };

    Scheduler::new(vec![Target::new("bob")], ctx)
        .run(cancel)
        .await
        .unwrap();

    let recorded = file_names(&layout, Role::Recorded);
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].ends_with(" - bob - Speedrun.ts"), "{recorded:?}");
    assert!(file_names(&layout, Role::Processed).is_empty());
}

struct SleepyHost {
    awake: AtomicBool,
}

#[async_trait]
impl ReachabilityProbe for SleepyHost {
    async fn is_reachable(&self) -> bool {
        self.awake.load(Ordering::SeqCst)
    }
}

struct CountingWake {
    host: Arc<SleepyHost>,
    sent: AtomicUsize,
}

#[async_trait]
impl WakeSender for CountingWake {
    async fn wake(&self) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.host.awake.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_watcher_wakes_sleeping_host_for_live_target() {
    let cancel = CancellationToken::new();
    let host = Arc::new(SleepyHost {
        awake: AtomicBool::new(false),
    });
    let wake = Arc::new(CountingWake {
        host: host.clone(),
        sent: AtomicUsize::new(0),
    });
    let watcher = Watcher::new(
        vec![Target::new("carol")],
        Arc::new(Script::new(cancel.clone(), vec![live("Late night")])),
        host.clone(),
        wake.clone(),
        Duration::from_secs(15),
    );

    assert_eq!(
        watcher.tick(&cancel).await,
        TickOutcome::WokeHost {
            target: "carol".into()
        }
    );
    assert_eq!(wake.sent.load(Ordering::SeqCst), 1);

    assert_eq!(watcher.tick(&cancel).await, TickOutcome::HostAwake);
}
