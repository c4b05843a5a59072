//! Secret-service backend (GNOME Keyring, KeePassXC and friends).
//!
//! New items go to the collection the target names (`default` meaning the
//! service's default alias, normally the login keyring), with the attributes
//! `service = authkeep` and `username = <key>`.

use keyring::secret_service::SsCredential;
use keyring::Entry;

use crate::config::{BackendKind, SERVICE_NAME};

use super::{BackendError, Keyring};

/// Key looked up when opening, to check that the bus answers.
const PROBE_KEY: &str = "authkeep-probe";

#[derive(Debug)]
pub struct SecretServiceKeyring {
    collection: String,
}

impl SecretServiceKeyring {
    /// Connect to the secret service and check that it responds.
    pub fn open(collection: &str) -> Result<Self, BackendError> {
        let store = Self {
            collection: collection.to_string(),
        };

        match store.entry(PROBE_KEY, None)?.get_secret() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(store),
            Err(err) => Err(BackendError::Unavailable {
                backend: BackendKind::SecretService,
                reason: err.to_string(),
            }),
        }
    }

    fn entry(&self, key: &str, label: Option<&str>) -> Result<Entry, BackendError> {
        let mut credential =
            SsCredential::new_with_target(Some(self.collection.as_str()), SERVICE_NAME, key)
                .map_err(platform)?;
        if let Some(label) = label {
            credential.label = label.to_string();
        }
        Ok(Entry::new_with_credential(Box::new(credential)))
    }
}

fn platform(err: keyring::Error) -> BackendError {
    BackendError::Platform {
        backend: BackendKind::SecretService,
        message: err.to_string(),
    }
}

impl Keyring for SecretServiceKeyring {
    fn backend_name(&self) -> &'static str {
        "secret_service"
    }

    fn set(&self, key: &str, label: &str, data: &[u8]) -> Result<(), BackendError> {
        self.entry(key, Some(label))?
            .set_secret(data)
            .map_err(platform)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        match self.entry(key, None)?.get_secret() {
            Ok(data) => Ok(data),
            Err(keyring::Error::NoEntry) => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
            Err(err) => Err(platform(err)),
        }
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        match self.entry(key, None)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
            Err(err) => Err(platform(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SECRET_SERVICE_COLLECTION;

    #[test]
    #[ignore] // Requires a running secret-service daemon
    fn test_secret_service_roundtrip() -> anyhow::Result<()> {
        let keyring = SecretServiceKeyring::open(SECRET_SERVICE_COLLECTION)?;
        let key = "https://authkeep-test.example.com";

        keyring.set(key, "authkeep test", b"payload")?;
        assert_eq!(keyring.get(key)?, b"payload".to_vec());

        keyring.remove(key)?;
        assert!(matches!(keyring.get(key), Err(BackendError::NotFound { .. })));
        Ok(())
    }
}
