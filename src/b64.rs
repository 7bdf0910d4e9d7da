//! Shared base64url-without-padding helpers for the JWS wire format.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{RegistryError, RegistryResult};

pub(crate) fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode base64url data, tolerating both padded and unpadded input.
///
/// External producers are allowed to keep the `=` padding; the signer always
/// strips it.
pub(crate) fn decode(s: &str) -> RegistryResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .map_err(|e| RegistryError::InvalidManifest {
            message: format!("invalid base64url data: {}", e),
        })
}
