use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{AccessToken, DataEnvelope, Stream, User};

/// Per-request timeout applied to every Helix call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const DEFAULT_API_BASE: &str = "https://api.twitch.tv/helix/";
const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Base URLs, overridable for tests and proxies.
#[derive(Debug, Clone)]
pub struct HelixEndpoints {
    pub api_base: Url,
    pub token_url: Url,
}

impl Default for HelixEndpoints {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("static url is valid"),
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("static url is valid"),
        }
    }
}

impl HelixEndpoints {
    pub fn users_url(&self, login: &str) -> Result<Url> {
        let mut url = self.api_base.join("users")?;
        url.query_pairs_mut().append_pair("login", login);
        Ok(url)
    }

    pub fn streams_url(&self, user_id: &str) -> Result<Url> {
        let mut url = self.api_base.join("streams")?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        Ok(url)
    }
}

/// Helix client bound to one application's client id.
#[derive(Debug, Clone)]
pub struct HelixClient {
    client: Client,
    client_id: String,
    endpoints: HelixEndpoints,
}

impl HelixClient {
    /// Build a client with the default endpoints and a 15 second timeout.
    pub fn new(client_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("twitch-srec/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, client_id, HelixEndpoints::default()))
    }

    pub fn with_client(
        client: Client,
        client_id: impl Into<String>,
        endpoints: HelixEndpoints,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            endpoints,
        }
    }

    /// Exchange the client id and secret for an app access token.
    pub async fn exchange_token(&self, client_secret: &str) -> Result<AccessToken> {
        debug!("requesting app access token");
        let response = self
            .client
            .post(self.endpoints.token_url.clone())
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET /users?login=<login>`. An unknown login yields an empty list.
    pub async fn get_users(&self, token: &str, login: &str) -> Result<Vec<User>> {
        let url = self.endpoints.users_url(login)?;
        let envelope: DataEnvelope<User> = Self::decode(self.get(url, token).send().await?).await?;
        Ok(envelope.data)
    }

    /// `GET /streams?user_id=<id>`. An offline channel yields an empty list.
    pub async fn get_streams(&self, token: &str, user_id: &str) -> Result<Vec<Stream>> {
        let url = self.endpoints.streams_url(user_id)?;
        let envelope: DataEnvelope<Stream> =
            Self::decode(self.get(url, token).send().await?).await?;
        Ok(envelope.data)
    }

    fn get(&self, url: Url, token: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Client-Id", &self.client_id)
            .bearer_auth(token)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(%status, %body, "helix request failed");
            return Err(Error::from_status(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}
