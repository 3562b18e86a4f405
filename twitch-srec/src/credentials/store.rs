//! Shared app access token.

use std::sync::Arc;

use async_trait::async_trait;
use helix_client::HelixClient;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::Result;

/// Exchanges client credentials for a bearer token.
#[async_trait]
pub trait TokenExchange: Send + Sync + 'static {
    async fn exchange(&self, client_secret: &str) -> Result<String>;
}

#[async_trait]
impl TokenExchange for HelixClient {
    async fn exchange(&self, client_secret: &str) -> Result<String> {
        let token = self.exchange_token(client_secret).await?;
        Ok(token.access_token)
    }
}

/// A bearer token together with the refresh generation it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    generation: u64,
}

impl BearerToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Token shared by every prober.
///
/// Reads are lock-free for practical purposes (`RwLock` read). Refreshes are
/// serialized by an async mutex and coalesced: a caller reporting a stale
/// token that was already replaced gets the replacement instead of a new
/// exchange.
pub struct CredentialStore {
    client_secret: String,
    exchange: Arc<dyn TokenExchange>,
    current: RwLock<Option<BearerToken>>,
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(client_secret: impl Into<String>, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            client_secret: client_secret.into(),
            exchange,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The current token, fetching one first if none was ever issued.
    pub async fn token(&self) -> Result<BearerToken> {
        if let Some(token) = self.current.read().clone() {
            return Ok(token);
        }
        self.refresh(None).await
    }

    /// Replace `stale` with a fresh token.
    ///
    /// `None` means "no token yet". If another task already replaced `stale`
    /// while this one waited for the lock, the newer token is returned
    /// without another exchange.
    #[instrument(skip_all, fields(stale_generation = stale.map(|t| t.generation)))]
    pub async fn refresh(&self, stale: Option<&BearerToken>) -> Result<BearerToken> {
        let _guard = self.refresh_lock.lock().await;

        // Double-check after acquiring lock (another task may have refreshed)
        if let Some(current) = self.current.read().clone() {
            if stale.map(|t| t.generation) != Some(current.generation) {
                debug!(generation = current.generation, "token already refreshed");
                return Ok(current);
            }
        }

        info!("Requesting new app access token");
        let value = self.exchange.exchange(&self.client_secret).await?;

        let mut current = self.current.write();
        let generation = current.as_ref().map_or(1, |t| t.generation + 1);
        let token = BearerToken { value, generation };
        *current = Some(token.clone());
        Ok(token)
    }
}
