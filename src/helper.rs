//! Credential helper backed by the platform keyring.

use secrecy::SecretString;
use tracing::Dispatch;

use crate::backend::{self, Keyring};
use crate::config::KeyringConfig;
use crate::credentials::{self, CredentialHelper, Credentials, CREDS_LABEL};
use crate::error::Error;

/// Stores credentials in whichever keyring backend opened first.
///
/// Holds the opened backend and the log dispatcher it was given; nothing is
/// cached, so every call goes to the backend.
pub struct KeyringHelper {
    keyring: Box<dyn Keyring>,
    dispatch: Dispatch,
}

impl KeyringHelper {
    /// Open the first usable backend, logging to the caller's current
    /// default subscriber.
    pub fn open(config: &KeyringConfig) -> Result<Self, Error> {
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        Self::open_with_dispatch(config, dispatch)
    }

    /// Open the first usable backend, sending this helper's diagnostics to
    /// `dispatch`.
    pub fn open_with_dispatch(config: &KeyringConfig, dispatch: Dispatch) -> Result<Self, Error> {
        let keyring = tracing::dispatcher::with_default(&dispatch, || {
            backend::open_first(&config.candidates(), backend::open_backend)
        })?;

        Ok(Self::with_keyring(keyring, dispatch))
    }

    /// Wrap an already opened backend.
    pub fn with_keyring(keyring: Box<dyn Keyring>, dispatch: Dispatch) -> Self {
        Self { keyring, dispatch }
    }

    pub fn backend_name(&self) -> &'static str {
        self.keyring.backend_name()
    }

    fn log(&self, f: impl FnOnce()) {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl CredentialHelper for KeyringHelper {
    fn add(&self, credentials: &Credentials) -> Result<(), Error> {
        if credentials.server_url.is_empty() {
            return Err(Error::MissingServerUrl);
        }

        let encoded = credentials
            .encode()
            .map_err(|source| Error::Serialization {
                server_url: credentials.server_url.clone(),
                source,
            })?;

        self.keyring
            .set(&credentials.server_url, CREDS_LABEL, &encoded)
            .map_err(|source| Error::BackendWrite {
                key: credentials.server_url.clone(),
                source,
            })
    }

    fn get(&self, server_url: &str) -> Result<(String, SecretString), Error> {
        let backend = self.keyring.backend_name();

        let data = match self.keyring.get(server_url) {
            Ok(data) => data,
            Err(err) => {
                self.log(|| {
                    tracing::error!(backend, server_url, error = %err, "Keyring lookup failed");
                });
                return Err(Error::CredentialsNotFound);
            }
        };

        credentials::decode(&data).map_err(|err| {
            self.log(|| {
                tracing::error!(backend, server_url, error = %err, "Stored credential malformed");
            });
            Error::CredentialsNotFound
        })
    }

    fn delete(&self, server_url: &str) -> Result<(), Error> {
        self.keyring
            .remove(server_url)
            .map_err(|source| Error::BackendWrite {
                key: server_url.to_string(),
                source,
            })
    }

    fn supports_credential_storage(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryKeyring;
    use secrecy::ExposeSecret;

    fn helper() -> (KeyringHelper, MemoryKeyring) {
        let keyring = MemoryKeyring::new();
        let helper = KeyringHelper::with_keyring(Box::new(keyring.clone()), Dispatch::none());
        (helper, keyring)
    }

    #[test]
    fn test_add_attaches_label() -> anyhow::Result<()> {
        let (helper, keyring) = helper();
        helper.add(&Credentials::new("https://idp.example.com", "alice", "s3cr3t"))?;

        assert_eq!(
            keyring.label("https://idp.example.com").as_deref(),
            Some(CREDS_LABEL)
        );
        Ok(())
    }

    #[test]
    fn test_add_rejects_empty_server_url() {
        let (helper, keyring) = helper();

        assert!(matches!(
            helper.add(&Credentials::new("", "alice", "s3cr3t")),
            Err(Error::MissingServerUrl)
        ));
        assert!(keyring.is_empty());
    }

    #[test]
    fn test_get_roundtrip() -> anyhow::Result<()> {
        let (helper, _) = helper();
        helper.add(&Credentials::new("https://idp.example.com", "alice", "s3cr3t"))?;

        let (username, secret) = helper.get("https://idp.example.com")?;
        assert_eq!(username, "alice");
        assert_eq!(secret.expose_secret(), "s3cr3t");
        Ok(())
    }

    #[test]
    fn test_supports_credential_storage() {
        let (helper, _) = helper();
        assert!(helper.supports_credential_storage());
        assert_eq!(helper.backend_name(), "memory");
    }
}
