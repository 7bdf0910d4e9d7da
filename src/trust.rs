//! Injectable trust policy for signing keys.
//!
//! Signature verification proves the embedded key signed the payload
//! (integrity); whether that key is an acceptable signer (identity) is a
//! separate phase delegated to a [`TrustPolicy`]. The two must not be
//! conflated: a self-asserted JWK only ever proves internal consistency.

use std::fmt;

use p256::ecdsa::VerifyingKey;
use sha2::{Digest as _, Sha256};

use crate::error::{RegistryError, RegistryResult};

/// Identity check applied to every signing key after signature verification.
pub trait TrustPolicy: fmt::Debug + Send + Sync {
    /// Accept or reject a key that produced a cryptographically valid
    /// signature.
    fn authorize(&self, key: &VerifyingKey) -> RegistryResult<()>;
}

/// Accept any key embedded in the manifest.
///
/// This is integrity-only trust: it proves the manifest was not modified
/// since signing, not who signed it. Use [`PinnedKeys`] when signer identity
/// matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptEmbeddedKeys;

impl TrustPolicy for AcceptEmbeddedKeys {
    fn authorize(&self, _key: &VerifyingKey) -> RegistryResult<()> {
        Ok(())
    }
}

/// Accept only keys from a pinned set.
#[derive(Debug, Default)]
pub struct PinnedKeys {
    keys: Vec<VerifyingKey>,
}

impl PinnedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the pinned set.
    pub fn pin(&mut self, key: VerifyingKey) {
        self.keys.push(key);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TrustPolicy for PinnedKeys {
    fn authorize(&self, key: &VerifyingKey) -> RegistryResult<()> {
        if self.keys.iter().any(|pinned| pinned == key) {
            Ok(())
        } else {
            Err(RegistryError::KeyNotTrusted { key_id: key_id(key) })
        }
    }
}

/// Stable identifier for a verifying key: SHA-256 of its uncompressed SEC1
/// encoding.
pub fn key_id(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    format!("sha256:{:x}", Sha256::digest(point.as_bytes()))
}
