//! Three role-roots under the configured storage root.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;
use crate::utils::fs;

/// Directory a recording file occupies during its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The capture subprocess is writing the file.
    Recording,
    /// Capture finished, raw file archived.
    Recorded,
    /// Repair pass finished.
    Processed,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Recording, Role::Recorded, Role::Processed];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Recorded => "recorded",
            Self::Processed => "processed",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Deterministic paths for every role, plus the moves between them.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, role: Role) -> PathBuf {
        self.root.join(role.dir_name())
    }

    pub fn path(&self, role: Role, file_name: &str) -> PathBuf {
        self.dir(role).join(file_name)
    }

    /// Create all role directories. Safe to call repeatedly.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for role in Role::ALL {
            fs::ensure_dir_all_with_op("creating storage directory", &self.dir(role)).await?;
        }
        Ok(())
    }

    /// Move `file_name` from one role-root to another by rename.
    ///
    /// Failures (missing source, cross-device, permissions) are returned
    /// as-is; the caller decides what to do with the file.
    pub async fn relocate(&self, file_name: &str, from: Role, to: Role) -> Result<PathBuf> {
        let src = self.path(from, file_name);
        let dst = self.path(to, file_name);
        fs::rename(&src, &dst).await?;
        debug!(file = %file_name, %from, %to, "relocated recording");
        Ok(dst)
    }

    /// Regular files directly under a role-root, sorted by name.
    pub async fn list_files(&self, role: Role) -> Result<Vec<PathBuf>> {
        fs::list_regular_files(&self.dir(role)).await
    }
}
