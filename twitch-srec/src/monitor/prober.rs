//! Availability probing contract.

use async_trait::async_trait;

use crate::domain::SessionInfo;

/// Live status of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    /// Exactly one ongoing session.
    Online(SessionInfo),
    Offline,
    /// The probe failed; callers retry after a short delay.
    Error(String),
}

impl LiveStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, LiveStatus::Online(_))
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, LiveStatus::Offline)
    }

    /// Stream title if live.
    pub fn title(&self) -> Option<&str> {
        match self {
            LiveStatus::Online(info) => Some(&info.title),
            _ => None,
        }
    }
}

/// Outcome of resolving a channel name to its platform id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    /// The platform has no account by that name.
    NotFound,
    Error(String),
}

/// Answers "does this target exist" and "is it live".
///
/// Implementations never fail: every failure is folded into the returned
/// status so the caller's state machine decides how long to wait.
#[async_trait]
pub trait AvailabilityProber: Send + Sync + 'static {
    async fn resolve(&self, name: &str) -> Resolution;

    async fn probe(&self, id: &str) -> LiveStatus;
}
