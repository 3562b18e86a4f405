//! Recorder host reachability.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::utils::process::tokio_command;

#[async_trait]
pub trait ReachabilityProbe: Send + Sync + 'static {
    async fn is_reachable(&self) -> bool;
}

/// One ICMP echo through the system `ping` binary.
#[derive(Debug, Clone)]
pub struct PingProbe {
    host: String,
    ping_path: String,
}

impl PingProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ping_path: "ping".to_string(),
        }
    }

    pub fn with_ping_path(mut self, path: impl Into<String>) -> Self {
        self.ping_path = path.into();
        self
    }

    fn args(&self) -> Vec<String> {
        let count = if cfg!(windows) { "-n" } else { "-c" };
        vec![count.to_string(), "1".to_string(), self.host.clone()]
    }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn is_reachable(&self) -> bool {
        let status = tokio_command(&self.ping_path)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => {
                debug!(host = %self.host, success = status.success(), "ping");
                status.success()
            }
            Err(e) => {
                warn!("Could not run {}: {}", self.ping_path, e);
                false
            }
        }
    }
}
