//! Capture engine trait and request types.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::Result;
use crate::domain::Target;
use crate::utils::process::ExitOutcome;

/// Everything a capture engine needs to record one session.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub target: Target,
    /// Session title, for log lines only.
    pub title: String,
    /// Quality selector, e.g. `best`, `720p60`, `audio_only`.
    pub quality: String,
    /// Absolute path under the in-progress root.
    pub output_path: PathBuf,
}

/// External capture tool.
///
/// `capture` returns once the subprocess exits, for whatever reason. An
/// `Err` means the process could not be started at all.
#[async_trait]
pub trait CaptureEngine: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn capture(&self, request: &CaptureRequest) -> Result<ExitOutcome>;
}
