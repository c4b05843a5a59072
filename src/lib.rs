//! Keyring-backed credential storage for command-line login tools.
//!
//! Credentials are kept in the platform's secret store rather than in plain
//! files: the KDE wallet, the freedesktop secret service, or a `pass`
//! password store. [`KeyringHelper::open`] picks the backend once; after that
//! [`CredentialHelper`] gives a uniform add/get/delete keyed by server URL.
//!
//! ```no_run
//! use authkeep::{CredentialHelper, Credentials, KeyringConfig, KeyringHelper};
//!
//! # fn main() -> Result<(), authkeep::Error> {
//! let helper = KeyringHelper::open(&KeyringConfig::default())?;
//! helper.add(&Credentials::new("https://idp.example.com", "alice", "s3cr3t"))?;
//! let (username, _secret) = helper.get("https://idp.example.com")?;
//! assert_eq!(username, "alice");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod helper;

pub use config::{BackendKind, KeyringConfig};
pub use credentials::{CredentialHelper, Credentials, CREDS_LABEL};
pub use error::Error;
pub use helper::KeyringHelper;
