//! JSON wrapper for backends that store a single opaque value per entry.
//!
//! The wallet and pass backends have nowhere to put a label, so the stored
//! value is `{"key": ..., "label": ..., "data": <base64>}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::BackendError;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    key: String,
    label: String,
    data: String,
}

/// Wrap `data` for storage under `key`.
pub(crate) fn seal(key: &str, label: &str, data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let envelope = Envelope {
        key: key.to_string(),
        label: label.to_string(),
        data: STANDARD.encode(data),
    };

    serde_json::to_vec(&envelope).map_err(|err| BackendError::Malformed {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Unwrap a value read back for `key`.
///
/// A value filed under a different key is rejected.
pub(crate) fn unseal(key: &str, raw: &[u8]) -> Result<Vec<u8>, BackendError> {
    let malformed = |reason: String| BackendError::Malformed {
        key: key.to_string(),
        reason,
    };

    let envelope: Envelope =
        serde_json::from_slice(raw).map_err(|err| malformed(err.to_string()))?;

    if envelope.key != key {
        return Err(malformed(format!("entry belongs to {:?}", envelope.key)));
    }

    STANDARD
        .decode(envelope.data.as_bytes())
        .map_err(|err| malformed(err.to_string()))
}

/// The label recorded in a sealed value.
#[cfg(test)]
pub(crate) fn label(raw: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope>(raw)
        .ok()
        .map(|envelope| envelope.label)
}
