//! Minimal Twitch Helix client.
//!
//! Covers the three calls a recorder needs: the client-credentials token
//! exchange, user lookup by login and stream lookup by user id. Responses
//! are mapped to [`Error`] variants by HTTP status class so callers can tell
//! an expired token apart from a transient failure.

pub mod client;
pub mod error;
pub mod models;

pub use client::{DEFAULT_TIMEOUT, HelixClient, HelixEndpoints};
pub use error::{Error, Result};
pub use models::{AccessToken, Stream, User};
pub use reqwest::StatusCode;
