//! Resolved application configuration.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::args::{Args, Mode};
use crate::watcher::MacAddress;
use crate::{Error, Result};

/// Lower bound for the poll interval, in both modes.
pub const MIN_REFRESH: Duration = Duration::from_secs(15);

const CONFIG_FILE_NAME: &str = "twitch-srec.toml";

/// On-disk TOML config. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<Mode>,
    pub streamers: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub oauth_token: Option<String>,
    pub refresh: Option<u64>,
    pub quality: Option<String>,
    pub path: Option<PathBuf>,
    pub fix_videos: Option<bool>,
    pub ffmpeg: Option<String>,
    pub streamlink: Option<String>,
    pub streamlink_args: Vec<String>,
    pub extension: Option<String>,
    pub inhibit_sleep: Option<bool>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
}

impl FileConfig {
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("invalid config file {}: {}", origin.display(), e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::io_path("reading", path, e))?;
        Self::parse(&contents, path)
    }
}

/// Which config file to read: the explicit one, else the first existing default.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("twitch-srec").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Recorder host for watcher mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherHost {
    pub address: String,
    pub mac: MacAddress,
}

/// Configuration built once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub streamers: Vec<String>,
    pub client_id: String,
    pub client_secret: String,
    pub oauth_token: Option<String>,
    pub refresh: Duration,
    pub quality: String,
    pub root: PathBuf,
    pub fix_videos: bool,
    pub ffmpeg_path: String,
    pub streamlink_path: String,
    pub streamlink_args: Vec<String>,
    pub extension: String,
    pub inhibit_sleep: bool,
    pub watcher_host: Option<WatcherHost>,
    pub log_dir: Option<PathBuf>,
    pub verbose: bool,
    /// File the values were read from, if any.
    pub source: Option<PathBuf>,
    /// Adjustments made while resolving, logged once logging is up.
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Read the config file (if any) and layer the command line over it.
    pub fn load(args: Args) -> Result<Self> {
        let source = locate_config_file(args.config.as_deref());
        let file = match &source {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file, source)
    }

    /// Command line values win over file values.
    pub fn merge(args: Args, file: FileConfig, source: Option<PathBuf>) -> Result<Self> {
        let streamers: Vec<String> = if args.streamers.is_empty() {
            file.streamers
        } else {
            args.streamers
        };
        let mut warnings = Vec::new();
        let streamers = dedup_streamers(streamers, &mut warnings);
        if streamers.is_empty() {
            return Err(Error::config("no streamer configured, use --streamer"));
        }

        let client_id = non_empty(args.client_id.or(file.client_id))
            .ok_or_else(|| Error::config("client id is required"))?;
        let client_secret = non_empty(args.client_secret.or(file.client_secret))
            .ok_or_else(|| Error::config("client secret is required"))?;

        let mut refresh = Duration::from_secs(args.refresh.or(file.refresh).unwrap_or(15));
        if refresh < MIN_REFRESH {
            warnings.push(format!(
                "Check interval should not be lower than {MIN_REFRESH:?}, using {MIN_REFRESH:?}"
            ));
            refresh = MIN_REFRESH;
        }

        let mode = args.mode.or(file.mode).unwrap_or_default();
        let watcher_host = match (
            non_empty(args.ip_address.or(file.ip_address)),
            non_empty(args.mac_address.or(file.mac_address)),
        ) {
            (Some(address), Some(mac)) => Some(WatcherHost {
                address,
                mac: mac.parse()?,
            }),
            _ if mode == Mode::Watcher => {
                return Err(Error::config(
                    "watcher mode needs the recorder ip address and mac address",
                ));
            }
            _ => None,
        };

        let streamlink_args = if args.streamlink_args.is_empty() {
            file.streamlink_args
        } else {
            args.streamlink_args
        };

        let extension = args
            .extension
            .or(file.extension)
            .unwrap_or_else(|| "mp4".to_string())
            .trim_start_matches('.')
            .to_string();
        if extension.is_empty() {
            return Err(Error::config("extension must not be empty"));
        }

        Ok(Self {
            mode,
            streamers,
            client_id,
            client_secret,
            oauth_token: non_empty(args.oauth_token.or(file.oauth_token)),
            refresh,
            quality: args
                .quality
                .or(file.quality)
                .unwrap_or_else(|| "best".to_string()),
            root: args
                .path
                .or(file.path)
                .unwrap_or_else(|| PathBuf::from(".")),
            fix_videos: args.fix_videos.or(file.fix_videos).unwrap_or(false),
            ffmpeg_path: args
                .ffmpeg
                .or(file.ffmpeg)
                .unwrap_or_else(|| "ffmpeg".to_string()),
            streamlink_path: args
                .streamlink
                .or(file.streamlink)
                .unwrap_or_else(|| "streamlink".to_string()),
            streamlink_args,
            extension,
            inhibit_sleep: args.inhibit_sleep.or(file.inhibit_sleep).unwrap_or(false),
            watcher_host,
            log_dir: args.log_dir.or(file.log_dir),
            verbose: args.verbose || file.verbose.unwrap_or(false),
            source,
            warnings,
        })
    }
}

/// Trim names and keep the first spelling of each login. Logins are case
/// insensitive, so `alice` and `Alice` are one channel.
fn dedup_streamers(names: Vec<String>, warnings: &mut Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            kept.push(name.to_string());
        } else {
            warnings.push(format!("Streamer {name} is listed more than once, watching it once"));
        }
    }
    kept
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "<redacted>" } else { "<unset>" }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("streamers", &self.streamers)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("oauth_token", &redact(&self.oauth_token))
            .field("refresh", &self.refresh)
            .field("quality", &self.quality)
            .field("root", &self.root)
            .field("fix_videos", &self.fix_videos)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("streamlink_path", &self.streamlink_path)
            .field("streamlink_args", &self.streamlink_args)
            .field("extension", &self.extension)
            .field("inhibit_sleep", &self.inhibit_sleep)
            .field("watcher_host", &self.watcher_host)
            .field("log_dir", &self.log_dir)
            .field("verbose", &self.verbose)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
