//! twitch-srec library crate.
//!
//! Watches Twitch channels, records them with streamlink while they are live
//! and archives the files, or in watcher mode wakes a sleeping recorder host.
//! Exposed as a library for integration testing.

pub mod app;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod panic_hook;
pub mod pipeline;
pub mod power;
pub mod scheduler;
pub mod storage;
pub mod utils;
pub mod watcher;

pub use error::{Error, Result};
