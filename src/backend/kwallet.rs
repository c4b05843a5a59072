//! KDE wallet backend, spoken to over the session D-Bus.
//!
//! Items are entries in a per-application folder of the network wallet. Each
//! entry holds a sealed envelope, since wallet entries carry no label.

use std::time::Duration;

use dbus::blocking::{Proxy, SyncConnection};

use crate::config::{BackendKind, SERVICE_NAME};

use super::{envelope, BackendError, Keyring};

const DESTINATION: &str = "org.kde.kwalletd5";
const OBJECT_PATH: &str = "/modules/kwalletd5";
const INTERFACE: &str = "org.kde.KWallet";

/// Opening a wallet can wait on the user typing the wallet password.
const CALL_TIMEOUT: Duration = Duration::from_secs(60);

pub struct WalletKeyring {
    connection: SyncConnection,
    handle: i32,
    folder: String,
}

fn unavailable(reason: impl ToString) -> BackendError {
    BackendError::Unavailable {
        backend: BackendKind::Wallet,
        reason: reason.to_string(),
    }
}

fn platform(err: dbus::Error) -> BackendError {
    BackendError::Platform {
        backend: BackendKind::Wallet,
        message: err.to_string(),
    }
}

impl WalletKeyring {
    /// Open the network wallet and make sure `folder` exists in it.
    pub fn open(folder: &str) -> Result<Self, BackendError> {
        let connection = SyncConnection::new_session().map_err(unavailable)?;

        let handle = {
            let proxy = connection.with_proxy(DESTINATION, OBJECT_PATH, CALL_TIMEOUT);

            let (enabled,): (bool,) = proxy
                .method_call(INTERFACE, "isEnabled", ())
                .map_err(unavailable)?;
            if !enabled {
                return Err(unavailable("the wallet subsystem is disabled"));
            }

            let (wallet,): (String,) = proxy
                .method_call(INTERFACE, "networkWallet", ())
                .map_err(unavailable)?;

            let (handle,): (i32,) = proxy
                .method_call(INTERFACE, "open", (wallet.as_str(), 0i64, SERVICE_NAME))
                .map_err(unavailable)?;
            if handle < 0 {
                return Err(unavailable(format!("wallet {wallet:?} could not be opened")));
            }

            let (has_folder,): (bool,) = proxy
                .method_call(INTERFACE, "hasFolder", (handle, folder, SERVICE_NAME))
                .map_err(unavailable)?;
            if !has_folder {
                let (created,): (bool,) = proxy
                    .method_call(INTERFACE, "createFolder", (handle, folder, SERVICE_NAME))
                    .map_err(unavailable)?;
                if !created {
                    return Err(unavailable(format!(
                        "could not create folder {folder:?} in wallet {wallet:?}"
                    )));
                }
            }

            tracing::debug!(wallet = %wallet, folder, "Opened KDE wallet");
            handle
        };

        Ok(Self {
            connection,
            handle,
            folder: folder.to_string(),
        })
    }

    fn proxy(&self) -> Proxy<'static, &SyncConnection> {
        self.connection
            .with_proxy(DESTINATION, OBJECT_PATH, CALL_TIMEOUT)
    }

    fn has_entry(&self, key: &str) -> Result<bool, BackendError> {
        let (exists,): (bool,) = self
            .proxy()
            .method_call(
                INTERFACE,
                "hasEntry",
                (self.handle, self.folder.as_str(), key, SERVICE_NAME),
            )
            .map_err(platform)?;
        Ok(exists)
    }
}

impl Keyring for WalletKeyring {
    fn backend_name(&self) -> &'static str {
        "wallet"
    }

    fn set(&self, key: &str, label: &str, data: &[u8]) -> Result<(), BackendError> {
        let sealed = envelope::seal(key, label, data)?;

        let (status,): (i32,) = self
            .proxy()
            .method_call(
                INTERFACE,
                "writeEntry",
                (self.handle, self.folder.as_str(), key, sealed, SERVICE_NAME),
            )
            .map_err(platform)?;

        if status != 0 {
            return Err(BackendError::Platform {
                backend: BackendKind::Wallet,
                message: format!("writeEntry returned {status}"),
            });
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        if !self.has_entry(key)? {
            return Err(BackendError::NotFound {
                key: key.to_string(),
            });
        }

        let (raw,): (Vec<u8>,) = self
            .proxy()
            .method_call(
                INTERFACE,
                "readEntry",
                (self.handle, self.folder.as_str(), key, SERVICE_NAME),
            )
            .map_err(platform)?;

        envelope::unseal(key, &raw)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        if !self.has_entry(key)? {
            return Err(BackendError::NotFound {
                key: key.to_string(),
            });
        }

        let (status,): (i32,) = self
            .proxy()
            .method_call(
                INTERFACE,
                "removeEntry",
                (self.handle, self.folder.as_str(), key, SERVICE_NAME),
            )
            .map_err(platform)?;

        if status != 0 {
            return Err(BackendError::Platform {
                backend: BackendKind::Wallet,
                message: format!("removeEntry returned {status}"),
            });
        }
        Ok(())
    }
}
