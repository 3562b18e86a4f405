//! Platform credentials.

mod store;

pub use store::{BearerToken, CredentialStore, TokenExchange};
