//! Secret-storage backends.
//!
//! A backend stores opaque byte blobs under a string key, with a display label
//! attached for keyring UIs. Which backend is used is decided once, when the
//! helper is opened: the configured candidates are tried in order and the
//! first one that opens wins.
//!
//! The wallet and secret-service backends are only compiled on platforms with
//! a session D-Bus, behind the `wallet` and `secret-service` features. On other
//! builds those candidates fail with [`BackendError::Unsupported`].

mod envelope;
#[cfg(all(
    feature = "wallet",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
mod kwallet;
mod memory;
mod pass;
#[cfg(all(
    feature = "secret-service",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
mod secret_service;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

#[cfg(all(
    feature = "wallet",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
pub use kwallet::WalletKeyring;
pub use memory::MemoryKeyring;
pub use pass::PassKeyring;
#[cfg(all(
    feature = "secret-service",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
pub use secret_service::SecretServiceKeyring;

use crate::config::BackendKind;
use crate::error::Error;

/// A store of labelled byte blobs keyed by string.
///
/// Calls block until the backend answers. Implementations hold whatever
/// session they need; none of them cache data.
pub trait Keyring: Send + Sync {
    /// Backend name, for logs.
    fn backend_name(&self) -> &'static str;

    /// Store `data` under `key`, replacing any existing item.
    fn set(&self, key: &str, label: &str, data: &[u8]) -> Result<(), BackendError>;

    /// Fetch the data stored under `key`.
    ///
    /// Returns [`BackendError::NotFound`] if nothing is stored.
    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError>;

    /// Remove the item stored under `key`.
    ///
    /// Returns [`BackendError::NotFound`] if nothing is stored.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no item stored under {key:?}")]
    NotFound { key: String },

    #[error("{0} backend is not available in this build")]
    Unsupported(BackendKind),

    #[error("{backend} backend unavailable: {reason}")]
    Unavailable { backend: BackendKind, reason: String },

    #[error("{program} {action} failed ({status}): {stderr}")]
    Command {
        program: String,
        action: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{backend} backend error: {message}")]
    Platform { backend: BackendKind, message: String },

    #[error("stored item for {key:?} is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How to open one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendDescriptor {
    Wallet {
        folder: &'static str,
    },
    SecretService {
        collection: &'static str,
    },
    Pass {
        dir: PathBuf,
        prefix: &'static str,
        command: PathBuf,
    },
}

impl BackendDescriptor {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Wallet { .. } => BackendKind::Wallet,
            Self::SecretService { .. } => BackendKind::SecretService,
            Self::Pass { .. } => BackendKind::Pass,
        }
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet { folder } => write!(f, "wallet (folder {folder})"),
            Self::SecretService { collection } => {
                write!(f, "secret_service (collection {collection})")
            }
            Self::Pass { dir, prefix, .. } => {
                write!(f, "pass ({}, prefix {prefix})", dir.display())
            }
        }
    }
}

/// A candidate that failed to open, and why.
#[derive(Debug)]
pub struct BackendAttempt {
    pub backend: BackendKind,
    pub error: BackendError,
}

/// Open the backend a descriptor names.
pub fn open_backend(descriptor: &BackendDescriptor) -> Result<Box<dyn Keyring>, BackendError> {
    match descriptor {
        BackendDescriptor::Wallet { folder } => open_wallet(folder),
        BackendDescriptor::SecretService { collection } => open_secret_service(collection),
        BackendDescriptor::Pass {
            dir,
            prefix,
            command,
        } => Ok(Box::new(PassKeyring::open(dir.clone(), *prefix, command)?)),
    }
}

#[cfg(all(
    feature = "wallet",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
fn open_wallet(folder: &str) -> Result<Box<dyn Keyring>, BackendError> {
    Ok(Box::new(WalletKeyring::open(folder)?))
}

#[cfg(not(all(
    feature = "wallet",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
)))]
fn open_wallet(_folder: &str) -> Result<Box<dyn Keyring>, BackendError> {
    Err(BackendError::Unsupported(BackendKind::Wallet))
}

#[cfg(all(
    feature = "secret-service",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
))]
fn open_secret_service(collection: &str) -> Result<Box<dyn Keyring>, BackendError> {
    Ok(Box::new(SecretServiceKeyring::open(collection)?))
}

#[cfg(not(all(
    feature = "secret-service",
    any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")
)))]
fn open_secret_service(_collection: &str) -> Result<Box<dyn Keyring>, BackendError> {
    Err(BackendError::Unsupported(BackendKind::SecretService))
}

/// Try each candidate in order and return the first backend that opens.
///
/// Candidates after the first success are never touched. If none opens, every
/// failure is returned in [`Error::BackendUnavailable`].
pub fn open_first<F>(
    candidates: &[BackendDescriptor],
    mut open: F,
) -> Result<Box<dyn Keyring>, Error>
where
    F: FnMut(&BackendDescriptor) -> Result<Box<dyn Keyring>, BackendError>,
{
    let mut attempts = Vec::with_capacity(candidates.len());

    for descriptor in candidates {
        match open(descriptor) {
            Ok(keyring) => {
                tracing::debug!(backend = %descriptor.kind(), "Opened keyring backend");
                return Ok(keyring);
            }
            Err(error) => {
                tracing::debug!(
                    backend = %descriptor.kind(),
                    error = %error,
                    "Keyring backend failed to open"
                );
                attempts.push(BackendAttempt {
                    backend: descriptor.kind(),
                    error,
                });
            }
        }
    }

    Err(Error::BackendUnavailable { attempts })
}
