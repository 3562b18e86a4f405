//! Repair of archived-raw recordings into the archived-fixed root.
//!
//! A repair either succeeds, in which case the raw copy is deleted, or fails,
//! in which case the raw copy stays in `recorded/` for the next startup sweep
//! and any partial output is removed from `processed/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::Result;
use crate::storage::{Role, StorageLayout};
use crate::utils::fs;
use crate::utils::process::ExitOutcome;

/// External remux/repair tool.
#[async_trait]
pub trait RepairEngine: Send + Sync + 'static {
    /// Read `input`, write a cleaned copy to `output`. The returned outcome
    /// says whether `output` is usable.
    async fn repair(&self, input: &Path, output: &Path) -> Result<ExitOutcome>;
}

/// Result of repairing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Output written to `processed/`, raw copy removed.
    Repaired { output: PathBuf },
    /// Raw copy left in `recorded/`.
    Failed { reason: String },
}

impl RepairOutcome {
    pub fn is_repaired(&self) -> bool {
        matches!(self, Self::Repaired { .. })
    }
}

/// Totals of a sweep over `recorded/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub repaired: Vec<String>,
    pub failed: Vec<String>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.repaired.len() + self.failed.len()
    }
}

/// Repair `recorded/<file_name>` into `processed/<file_name>`.
pub async fn repair_recording(
    layout: &StorageLayout,
    engine: &dyn RepairEngine,
    file_name: &str,
) -> RepairOutcome {
    let input = layout.path(Role::Recorded, file_name);
    let output = layout.path(Role::Processed, file_name);

    if !input.exists() {
        warn!("Skip fixing. File not found: {}", input.display());
        return RepairOutcome::Failed {
            reason: "input not found".to_string(),
        };
    }

    info!("Fixing {}", input.display());
    let reason = match engine.repair(&input, &output).await {
        Ok(outcome) if outcome.is_success() => {
            if let Err(e) = fs::remove_file_if_exists(&input).await {
                // output is usable, the raw copy will be picked up again by the next sweep
                warn!("Repaired but could not remove raw copy: {}", e);
            }
            info!("Fixing is done: {}", output.display());
            return RepairOutcome::Repaired { output };
        }
        Ok(outcome) => format!("repair tool failed with {outcome}"),
        Err(e) => e.to_string(),
    };

    warn!("Fixing {} failed: {}", file_name, reason);
    if let Err(e) = fs::remove_file_if_exists(&output).await {
        warn!("Could not remove partial repair output: {}", e);
    }
    RepairOutcome::Failed { reason }
}

/// Repair every regular file currently in `recorded/`, one at a time.
///
/// Each file is independent: a failure is recorded and the sweep moves on.
pub async fn sweep_recorded(layout: &StorageLayout, engine: &dyn RepairEngine) -> Result<SweepReport> {
    let files = layout.list_files(Role::Recorded).await?;
    let mut report = SweepReport::default();
    if files.is_empty() {
        return Ok(report);
    }

    info!("Fixing {} previously recorded file(s).", files.len());
    for path in files {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match repair_recording(layout, engine, &file_name).await {
            RepairOutcome::Repaired { .. } => report.repaired.push(file_name),
            RepairOutcome::Failed { .. } => report.failed.push(file_name),
        }
    }

    info!(
        repaired = report.repaired.len(),
        failed = report.failed.len(),
        "Startup repair sweep finished"
    );
    Ok(report)
}
