//! Wiring from configuration to the running mode.

use std::sync::Arc;

use helix_client::HelixClient;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AppConfig, Mode};
use crate::credentials::CredentialStore;
use crate::domain::{IdCache, Target};
use crate::downloader::{StreamlinkConfig, StreamlinkEngine};
use crate::monitor::{AvailabilityProber, HelixProber};
use crate::pipeline::FfmpegRepair;
use crate::power::{InhibitCounter, ProcessInhibitor};
use crate::scheduler::{RecorderContext, RecorderSettings, Scheduler};
use crate::storage::StorageLayout;
use crate::watcher::{MagicPacketSender, PingProbe, Watcher};
use crate::{Error, Result};

/// One line per setting, printed before the loop starts.
pub fn banner(config: &AppConfig) -> String {
    let mut lines = vec![format!(
        "twitch-srec {} ({} mode)",
        env!("CARGO_PKG_VERSION"),
        config.mode.as_str()
    )];
    lines.push(format!(
        "Checking {} every {} seconds",
        config.streamers.join(", "),
        config.refresh.as_secs()
    ));
    match config.mode {
        Mode::Recorder => {
            lines.push(format!(
                "Recording with {} quality to {}",
                config.quality,
                config.root.display()
            ));
            if config.fix_videos {
                lines.push(format!("Repairing finished recordings with {}", config.ffmpeg_path));
            }
        }
        Mode::Watcher => {
            if let Some(host) = &config.watcher_host {
                lines.push(format!("Waking recorder {} ({})", host.address, host.mac));
            }
        }
    }
    lines.join("\n")
}

pub fn recorder_context(config: &AppConfig, prober: Arc<dyn AvailabilityProber>) -> RecorderContext {
    let capture = StreamlinkEngine::new(StreamlinkConfig {
        binary_path: config.streamlink_path.clone(),
        oauth_token: config.oauth_token.clone(),
        extra_args: config.streamlink_args.clone(),
    });

    let inhibit = if !config.inhibit_sleep {
        InhibitCounter::disabled()
    } else if cfg!(target_os = "linux") {
        InhibitCounter::new(Arc::new(ProcessInhibitor::systemd()))
    } else {
        warn!("Sleep inhibition is only supported on Linux, ignoring");
        InhibitCounter::disabled()
    };

    RecorderContext {
        prober,
        capture: Arc::new(capture),
        repair: Arc::new(FfmpegRepair::new(config.ffmpeg_path.clone())),
        layout: StorageLayout::new(&config.root),
        inhibit,
        ids: IdCache::new(),
        settings: Arc::new(RecorderSettings {
            refresh: config.refresh,
            quality: config.quality.clone(),
            extension: config.extension.clone(),
            repair_on_finish: config.fix_videos,
        }),
    }
}

/// Run the configured mode until `cancel` fires.
pub async fn run(config: AppConfig, cancel: CancellationToken) -> Result<()> {
    let helix = Arc::new(HelixClient::new(config.client_id.clone())?);
    let credentials = Arc::new(CredentialStore::new(
        config.client_secret.clone(),
        helix.clone(),
    ));
    let prober: Arc<dyn AvailabilityProber> = Arc::new(HelixProber::new(helix, credentials));
    let targets: Vec<Target> = config.streamers.iter().map(Target::new).collect();

    match config.mode {
        Mode::Recorder => {
            let ctx = recorder_context(&config, prober);
            info!("Storing recordings under {}", ctx.layout.root().display());
            Scheduler::new(targets, ctx).run(cancel).await
        }
        Mode::Watcher => {
            let host = config
                .watcher_host
                .as_ref()
                .ok_or_else(|| Error::config("watcher mode needs a recorder host"))?;
            let watcher = Watcher::new(
                targets,
                prober,
                Arc::new(PingProbe::new(host.address.clone())),
                Arc::new(MagicPacketSender::new(host.mac)),
                config.refresh,
            );
            watcher.run(cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Args, FileConfig};
    use crate::monitor::{LiveStatus, Resolution};
    use async_trait::async_trait;

    struct OfflineProber;

    #[async_trait]
    impl AvailabilityProber for OfflineProber {
        async fn resolve(&self, name: &str) -> Resolution {
            Resolution::Found(name.to_string())
        }

        async fn probe(&self, _id: &str) -> LiveStatus {
            LiveStatus::Offline
        }
    }

    fn config(extra: Args) -> AppConfig {
        let args = Args {
            streamers: vec!["alice".into(), "bob".into()],
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..extra
        };
        AppConfig::merge(args, FileConfig::default(), None).unwrap()
    }

    #[test]
    fn test_recorder_banner() {
        let text = banner(&config(Args {
            quality: Some("720p60".into()),
            fix_videos: Some(true),
            ..Default::default()
        }));
        assert!(text.contains("recorder mode"));
        assert!(text.contains("Checking alice, bob every 15 seconds"));
        assert!(text.contains("720p60"));
        assert!(text.contains("Repairing finished recordings with ffmpeg"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_watcher_banner() {
        let text = banner(&config(Args {
            mode: Some(Mode::Watcher),
            ip_address: Some("10.0.0.2".into()),
            mac_address: Some("00:1a:2b:3c:4d:5e".into()),
            ..Default::default()
        }));
        assert!(text.contains("watcher mode"));
        assert!(text.contains("Waking recorder 10.0.0.2 (00:1a:2b:3c:4d:5e)"));
    }

    #[test]
    fn test_recorder_context_follows_config() {
        let config = config(Args {
            path: Some("/videos".into()),
            extension: Some(".ts".into()),
            ..Default::default()
        });
        let ctx = recorder_context(&config, Arc::new(OfflineProber));
        assert_eq!(ctx.layout.root(), std::path::Path::new("/videos"));
        assert_eq!(ctx.settings.extension, "ts");
        assert!(!ctx.settings.repair_on_finish);
        assert_eq!(ctx.capture.name(), "streamlink");
        assert_eq!(ctx.inhibit.active(), 0);
    }
}
