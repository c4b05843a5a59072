use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::BackendDescriptor;

/// Environment variable forcing a single backend.
pub const BACKEND_ENV: &str = "AUTHKEEP_KEYRING_BACKEND";

/// Environment variable overriding the password-store directory.
pub const PASS_DIR_ENV: &str = "AUTHKEEP_PASSWORD_STORE_DIR";

/// Name under which items are filed: wallet folder, wallet application id and
/// the secret-service `service` attribute.
pub const SERVICE_NAME: &str = "authkeep";

/// Secret-service target items are written to.
///
/// `default` resolves through the service's `default` alias, which GNOME
/// Keyring points at the login keyring. Any other value would be matched
/// against collection labels and created when missing.
pub const SECRET_SERVICE_COLLECTION: &str = "default";

/// Key namespace inside the password store.
pub const PASS_PREFIX: &str = SERVICE_NAME;

/// A secret-storage backend the helper knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// KDE wallet daemon.
    #[serde(alias = "kwallet")]
    Wallet,
    /// freedesktop.org secret service (GNOME Keyring, KeePassXC, ...).
    SecretService,
    /// GPG-encrypted password store driven through the `pass` program.
    Pass,
}

impl BackendKind {
    /// Every backend, in the order they are tried when no override is set.
    pub const PRIORITY: [BackendKind; 3] = [Self::Wallet, Self::SecretService, Self::Pass];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::SecretService => "secret_service",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown keyring backend {value:?} (expected wallet, secret_service or pass)")]
pub struct UnknownBackend {
    value: String,
}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "wallet" | "kwallet" => Ok(Self::Wallet),
            "secret_service" => Ok(Self::SecretService),
            "pass" => Ok(Self::Pass),
            other => Err(UnknownBackend {
                value: other.to_string(),
            }),
        }
    }
}

fn default_pass_cmd() -> PathBuf {
    PathBuf::from("pass")
}

/// Default password-store directory, `$HOME/.password_store`.
pub fn default_pass_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/"))
        .join(".password_store")
}

/// Returns the default config file path (`~/.config/authkeep/authkeep.toml`).
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join("authkeep").join("authkeep.toml"),
        None => PathBuf::from("authkeep.toml"),
    }
}

/// Keyring selection settings.
///
/// The helper never reads the environment itself; the application builds one
/// of these (from a file, [`KeyringConfig::merge_env`], flags) and passes it to
/// [`KeyringHelper::open`](crate::KeyringHelper::open).
///
/// ```toml
/// backend = "pass"
/// pass_dir = "/home/alice/.password_store"
/// pass_cmd = "/usr/bin/pass"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyringConfig {
    /// Use only this backend. When unset every backend is tried in
    /// [`BackendKind::PRIORITY`] order.
    pub backend: Option<BackendKind>,

    /// Password-store directory. Defaults to [`default_pass_dir`].
    pub pass_dir: Option<PathBuf>,

    /// The `pass` executable, looked up on `PATH` when not absolute.
    #[serde(default = "default_pass_cmd")]
    pub pass_cmd: PathBuf,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            backend: None,
            pass_dir: None,
            pass_cmd: default_pass_cmd(),
        }
    }
}

impl KeyringConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: KeyringConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlay values from environment-style variables.
    ///
    /// An unrecognized backend name is logged and ignored, leaving whatever
    /// backend selection was already configured.
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
            match value.parse::<BackendKind>() {
                Ok(kind) => self.backend = Some(kind),
                Err(err) => {
                    tracing::warn!(error = %err, "Ignoring {BACKEND_ENV}");
                }
            }
        }

        if let Some(dir) = lookup(PASS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.pass_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// The password-store directory to use.
    pub fn resolve_pass_dir(&self) -> PathBuf {
        self.pass_dir.clone().unwrap_or_else(default_pass_dir)
    }

    /// Backends to try, in order.
    pub fn candidates(&self) -> Vec<BackendDescriptor> {
        let kinds: &[BackendKind] = match &self.backend {
            Some(kind) => std::slice::from_ref(kind),
            None => &BackendKind::PRIORITY,
        };

        kinds.iter().map(|kind| self.descriptor(*kind)).collect()
    }

    /// Describe how `kind` would be opened under this config.
    pub fn descriptor(&self, kind: BackendKind) -> BackendDescriptor {
        match kind {
            BackendKind::Wallet => BackendDescriptor::Wallet {
                folder: SERVICE_NAME,
            },
            BackendKind::SecretService => BackendDescriptor::SecretService {
                collection: SECRET_SERVICE_COLLECTION,
            },
            BackendKind::Pass => BackendDescriptor::Pass {
                dir: self.resolve_pass_dir(),
                prefix: PASS_PREFIX,
                command: self.pass_cmd.clone(),
            },
        }
    }
}
