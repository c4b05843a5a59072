use crate::backend::{BackendAttempt, BackendError};

/// Errors returned by [`KeyringHelper`](crate::KeyringHelper).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No candidate backend could be opened.
    #[error("no usable keyring backend ({})", describe_attempts(.attempts))]
    BackendUnavailable { attempts: Vec<BackendAttempt> },

    #[error("failed to encode credentials for {server_url:?}")]
    Serialization {
        server_url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend rejected a write or removal. `source` is the backend's own error.
    #[error("keyring update for {key:?} failed: {source}")]
    BackendWrite {
        key: String,
        #[source]
        source: BackendError,
    },

    /// Nothing usable is stored for the key: either no item exists or the
    /// stored payload could not be decoded.
    #[error("credentials not found")]
    CredentialsNotFound,

    #[error("credentials must name a server URL")]
    MissingServerUrl,
}

fn describe_attempts(attempts: &[BackendAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends were tried".to_string();
    }

    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.backend, attempt.error))
        .collect::<Vec<_>>()
        .join("; ")
}
