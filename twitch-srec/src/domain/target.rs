//! Watched targets and the shared identifier cache.

use std::sync::Arc;

use dashmap::DashMap;

/// One watched channel, identified by its login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub name: String,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Channel URL handed to the capture tool.
    pub fn channel_url(&self) -> String {
        format!("twitch.tv/{}", self.name)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolved platform identifiers, keyed by lowercase login.
///
/// Entries live for the whole process so a restarted state machine or the
/// watcher does not resolve the same name twice.
#[derive(Debug, Clone, Default)]
pub struct IdCache {
    inner: Arc<DashMap<String, String>>,
}

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner
            .get(&name.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, name: &str, id: impl Into<String>) {
        self.inner.insert(name.to_lowercase(), id.into());
    }
}
