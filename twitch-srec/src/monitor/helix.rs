//! Helix-backed availability prober.

use std::sync::Arc;

use async_trait::async_trait;
use helix_client::{HelixClient, Stream, User};
use tracing::{debug, warn};

use super::prober::{AvailabilityProber, LiveStatus, Resolution};
use crate::credentials::{BearerToken, CredentialStore};
use crate::domain::SessionInfo;

/// The two Helix lookups the prober needs.
#[async_trait]
pub trait PlatformApi: Send + Sync + 'static {
    async fn lookup_users(&self, token: &str, login: &str) -> helix_client::Result<Vec<User>>;

    async fn live_streams(&self, token: &str, user_id: &str)
    -> helix_client::Result<Vec<Stream>>;
}

#[async_trait]
impl PlatformApi for HelixClient {
    async fn lookup_users(&self, token: &str, login: &str) -> helix_client::Result<Vec<User>> {
        self.get_users(token, login).await
    }

    async fn live_streams(
        &self,
        token: &str,
        user_id: &str,
    ) -> helix_client::Result<Vec<Stream>> {
        self.get_streams(token, user_id).await
    }
}

/// Prober over the Helix users/streams endpoints sharing one credential store.
pub struct HelixProber {
    api: Arc<dyn PlatformApi>,
    credentials: Arc<CredentialStore>,
}

impl HelixProber {
    pub fn new(api: Arc<dyn PlatformApi>, credentials: Arc<CredentialStore>) -> Self {
        Self { api, credentials }
    }

    async fn bearer(&self) -> Result<BearerToken, String> {
        self.credentials
            .token()
            .await
            .map_err(|e| format!("no access token: {e}"))
    }

    /// Turn an API failure into an error message, refreshing the token first
    /// when the platform rejected it.
    async fn handle_api_error(&self, token: &BearerToken, err: helix_client::Error) -> String {
        if err.is_unauthorized() {
            warn!("Access token rejected, refreshing");
            if let Err(e) = self.credentials.refresh(Some(token)).await {
                warn!("Token refresh failed: {}", e);
            }
        }
        err.to_string()
    }
}

/// Pick the user whose login matches `name`, falling back to the first one.
fn pick_user(users: Vec<User>, name: &str) -> Option<User> {
    let position = users
        .iter()
        .position(|u| u.login.eq_ignore_ascii_case(name))
        .unwrap_or(0);
    users.into_iter().nth(position)
}

#[async_trait]
impl AvailabilityProber for HelixProber {
    async fn resolve(&self, name: &str) -> Resolution {
        let token = match self.bearer().await {
            Ok(token) => token,
            Err(e) => return Resolution::Error(e),
        };

        match self.api.lookup_users(&token.value, name).await {
            Ok(users) => match pick_user(users, name) {
                Some(user) => {
                    debug!(name, id = %user.id, "resolved channel id");
                    Resolution::Found(user.id)
                }
                None => Resolution::NotFound,
            },
            Err(helix_client::Error::NotFound(_)) => Resolution::NotFound,
            Err(e) => Resolution::Error(self.handle_api_error(&token, e).await),
        }
    }

    async fn probe(&self, id: &str) -> LiveStatus {
        let token = match self.bearer().await {
            Ok(token) => token,
            Err(e) => return LiveStatus::Error(e),
        };

        match self.api.live_streams(&token.value, id).await {
            Ok(streams) => match streams.into_iter().next() {
                Some(stream) => LiveStatus::Online(SessionInfo {
                    id: stream.id,
                    title: stream.title,
                    category: stream.game_name.filter(|g| !g.is_empty()),
                }),
                None => LiveStatus::Offline,
            },
            Err(e) => LiveStatus::Error(self.handle_api_error(&token, e).await),
        }
    }
}
