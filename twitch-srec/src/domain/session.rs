//! Live session entity.

use chrono::{DateTime, Local};

use crate::utils::filename::recording_filename;

/// Metadata the platform reports for an ongoing broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Platform session (stream) id.
    pub id: String,
    pub title: String,
    pub category: Option<String>,
}

/// One live broadcast observed for a target.
///
/// Created when a poll sees the target go live (the discovery time names the
/// file), consumed by one capture and dropped after relocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub info: SessionInfo,
    /// Sanitized `<timestamp> - <target> - <title>.<ext>`.
    pub file_name: String,
}

impl Session {
    pub fn new(
        discovered_at: DateTime<Local>,
        target: &str,
        info: SessionInfo,
        extension: &str,
    ) -> Self {
        let file_name = recording_filename(&discovered_at, target, &info.title, extension);
        Self {
            info,
            file_name,
        }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }
}
