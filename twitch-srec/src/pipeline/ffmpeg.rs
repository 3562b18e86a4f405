//! ffmpeg-backed repair: a stream-copy remux that skips unreadable packets.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::repair::RepairEngine;
use crate::Result;
use crate::utils::process::{ExitOutcome, tokio_command};

/// Repair engine running `ffmpeg -err_detect ignore_err -i <in> -c copy <out>`.
#[derive(Debug, Clone)]
pub struct FfmpegRepair {
    ffmpeg_path: String,
}

impl FfmpegRepair {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn build_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-err_detect".to_string(),
            "ignore_err".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegRepair {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl RepairEngine for FfmpegRepair {
    async fn repair(&self, input: &Path, output: &Path) -> Result<ExitOutcome> {
        let args = Self::build_args(input, output);
        debug!("FFmpeg args: {:?}", args);

        let command_output = tokio_command(&self.ffmpeg_path)
            .args(&args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                crate::Error::process(format!("Failed to spawn {}: {}", self.ffmpeg_path, e))
            })?;

        let outcome = ExitOutcome::from(command_output.status);
        if !outcome.is_success() {
            let stderr = String::from_utf8_lossy(&command_output.stderr);
            let last_error = stderr
                .lines()
                .rfind(|l| !l.trim().is_empty())
                .unwrap_or("Unknown ffmpeg error");
            warn!("ffmpeg failed ({}): {}", outcome, last_error);
        }
        Ok(outcome)
    }
}
