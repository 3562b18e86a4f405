//! Configuration: command line layered over an optional TOML file.

mod args;
mod settings;

pub use args::{Args, Mode};
pub use settings::{AppConfig, FileConfig, MIN_REFRESH, WatcherHost, locate_config_file};
