//! Login credentials and their stored encoding.
//!
//! A credential is serialized as a JSON object with the fields `username`,
//! `serverURL` and `secret`. That object is the only format this crate owns;
//! how the bytes are kept is up to the backend.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Label attached to every stored item, shown by keyring UIs.
pub const CREDS_LABEL: &str = "authkeep Credentials";

/// One stored login secret. `server_url` is the storage key.
#[derive(Debug)]
pub struct Credentials {
    pub server_url: String,
    pub username: String,
    pub secret: SecretString,
}

impl Credentials {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Payload {
            username: &self.username,
            server_url: &self.server_url,
            secret: self.secret.expose_secret(),
        })
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    username: &'a str,
    #[serde(rename = "serverURL")]
    server_url: &'a str,
    secret: &'a str,
}

/// The fields read back from a stored payload. `serverURL` and anything else
/// present is ignored; capitalised names are what older helpers wrote.
#[derive(Deserialize)]
struct StoredPayload {
    #[serde(alias = "Username")]
    username: String,
    #[serde(alias = "Secret")]
    secret: String,
}

/// Decode a stored payload into `(username, secret)`.
pub(crate) fn decode(data: &[u8]) -> Result<(String, SecretString), serde_json::Error> {
    let stored: StoredPayload = serde_json::from_slice(data)?;
    Ok((stored.username, SecretString::from(stored.secret)))
}

/// Storage for login credentials, keyed by server URL.
pub trait CredentialHelper {
    /// Store credentials, replacing any stored for the same server URL.
    fn add(&self, credentials: &Credentials) -> Result<(), Error>;

    /// Fetch `(username, secret)` for a server URL.
    fn get(&self, server_url: &str) -> Result<(String, SecretString), Error>;

    fn delete(&self, server_url: &str) -> Result<(), Error>;

    /// Whether credentials actually persist. A no-op helper returns `false`.
    fn supports_credential_storage(&self) -> bool;
}
