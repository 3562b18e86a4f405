//! Command line.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Top-level operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record watched channels.
    #[default]
    Recorder,
    /// Wake a sleeping recorder host when a watched channel goes live.
    Watcher,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recorder => "recorder",
            Self::Watcher => "watcher",
        }
    }
}

/// Record Twitch streams automatically.
///
/// Every option can also be set in a TOML config file; command line values win.
#[derive(Debug, Default, Parser)]
#[command(name = "twitch-srec", version, about, long_about = None)]
pub struct Args {
    /// Config file (default: ./twitch-srec.toml, then the user config dir)
    #[arg(short, long, env = "TWITCH_SREC_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Channel to watch; repeat or comma-separate for several
    #[arg(short = 's', long = "streamer", value_name = "NAME", value_delimiter = ',')]
    pub streamers: Vec<String>,

    #[arg(long, env = "TWITCH_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth token of your Twitch account, forwarded to streamlink
    #[arg(short, long, env = "TWITCH_OAUTH_TOKEN", hide_env_values = true)]
    pub oauth_token: Option<String>,

    /// Seconds between two checks (minimum 15)
    #[arg(short, long, value_name = "SECONDS")]
    pub refresh: Option<u64>,

    /// Quality to record, e.g. best, worst, audio_only, 720p60
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Root directory of the recording/, recorded/ and processed/ folders
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Repair finished recordings with ffmpeg
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub fix_videos: Option<bool>,

    /// Path to the ffmpeg binary
    #[arg(short, long)]
    pub ffmpeg: Option<String>,

    /// Path to the streamlink binary
    #[arg(long)]
    pub streamlink: Option<String>,

    /// Extra argument passed to streamlink; repeatable
    #[arg(long = "streamlink-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub streamlink_args: Vec<String>,

    /// Output file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Keep the machine awake while recording
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub inhibit_sleep: Option<bool>,

    /// Recorder host address (watcher mode)
    #[arg(short, long)]
    pub ip_address: Option<String>,

    /// Recorder MAC address (watcher mode)
    #[arg(long)]
    pub mac_address: Option<String>,

    /// Also write daily log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Debug logging and a dump of the resolved configuration
    #[arg(short, long)]
    pub verbose: bool,
}
