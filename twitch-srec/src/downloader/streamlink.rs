//! Streamlink capture engine.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::capture::{CaptureEngine, CaptureRequest};
use crate::Result;
use crate::utils::process::{ExitOutcome, tokio_command};

/// Streamlink engine settings.
#[derive(Debug, Clone)]
pub struct StreamlinkConfig {
    pub binary_path: String,
    /// User OAuth token, forwarded as a Twitch API header.
    pub oauth_token: Option<String>,
    /// Extra arguments inserted before the channel URL.
    pub extra_args: Vec<String>,
}

impl Default for StreamlinkConfig {
    fn default() -> Self {
        Self {
            binary_path: "streamlink".to_string(),
            oauth_token: None,
            extra_args: Vec::new(),
        }
    }
}

/// Status parsed from streamlink output.
#[derive(Debug, PartialEq, Eq)]
enum StreamlinkStatus {
    StreamOpened,
    StreamEnded,
    Error(String),
}

/// Records a channel with streamlink, writing straight to the output path.
pub struct StreamlinkEngine {
    config: StreamlinkConfig,
}

impl StreamlinkEngine {
    pub fn new(config: StreamlinkConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, request: &CaptureRequest) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(ref token) = self.config.oauth_token {
            args.extend([
                "--twitch-api-header".to_string(),
                format!("Authorization=OAuth {token}"),
            ]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        // Stream URL must be the first positional argument followed by quality
        args.push(request.target.channel_url());
        args.push(request.quality.clone());

        args.extend([
            "-o".to_string(),
            request.output_path.to_string_lossy().into_owned(),
        ]);

        args
    }

    fn parse_streamlink_output(line: &str) -> Option<StreamlinkStatus> {
        if line.contains("[cli][info] Stream ended") {
            return Some(StreamlinkStatus::StreamEnded);
        }
        if line.contains("[cli][info] Opening stream") {
            return Some(StreamlinkStatus::StreamOpened);
        }
        if line.contains("[cli][error]") || line.contains("error: ") {
            return Some(StreamlinkStatus::Error(line.to_string()));
        }
        None
    }
}

impl Default for StreamlinkEngine {
    fn default() -> Self {
        Self::new(StreamlinkConfig::default())
    }
}

#[async_trait]
impl CaptureEngine for StreamlinkEngine {
    fn name(&self) -> &'static str {
        "streamlink"
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<ExitOutcome> {
        let args = self.build_args(request);
        let target = request.target.name.as_str();

        // the token must not end up in the log
        debug!(
            "Starting streamlink for {} -> {}",
            target,
            request.output_path.display()
        );

        let mut child = tokio_command(&self.config.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| crate::Error::process(format!("Failed to spawn streamlink: {}", e)))?;

        let started = Instant::now();

        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match Self::parse_streamlink_output(&line) {
                        Some(StreamlinkStatus::StreamOpened) => {
                            info!("Streamlink stream opened for {}", target)
                        }
                        Some(StreamlinkStatus::StreamEnded) => {
                            info!("Streamlink stream ended for {}", target)
                        }
                        Some(StreamlinkStatus::Error(err)) => {
                            warn!("Streamlink error for {}: {}", target, err)
                        }
                        None => debug!(target_name = %target, "streamlink: {}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        error!("Error reading streamlink stderr: {}", e);
                        break;
                    }
                }
            }
        }

        let outcome = match child.wait().await {
            Ok(status) => ExitOutcome::from(status),
            Err(e) => {
                error!("Error waiting for streamlink process: {}", e);
                ExitOutcome::with_code(-1)
            }
        };

        let elapsed = started.elapsed();
        if outcome.is_success() {
            info!("Streamlink for {} exited after {:?}", target, elapsed);
        } else {
            warn!(
                "Streamlink for {} exited with {} after {:?}",
                target, outcome, elapsed
            );
        }
        Ok(outcome)
    }
}
