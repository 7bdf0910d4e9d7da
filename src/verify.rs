//! Manifest verification: digest binding plus signature checking.
//!
//! Verification runs in two explicit phases. Phase one is integrity: every
//! signature entry must verify over the reconstructed payload, and the
//! protocol-supplied content digest (when present) must match the payload
//! bytes. Phase two is identity: each signing key is passed to the injected
//! [`TrustPolicy`]. A manifest is only trusted when both phases pass.

use p256::ecdsa::VerifyingKey;
use tracing::debug;

use crate::b64;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::keys::{jwk_to_verifying_key, SignatureAlgorithm};
use crate::split::reconstruct_payload;
use crate::trust::TrustPolicy;
use crate::types::{Manifest, ProtectedHeader};

/// Verifier's working set for one signature entry.
struct SignatureEntry {
    algorithm: SignatureAlgorithm,
    signature: Vec<u8>,
    protected64: String,
    key: VerifyingKey,
    format_length: usize,
    format_tail: Vec<u8>,
}

/// Verify a received wire manifest and return its ordered layer digests.
///
/// `expected_digest` is the protocol-supplied content digest (e.g., from the
/// `Docker-Content-Digest` response header), checked against the
/// reconstructed payload before any signature is verified. ALL signature
/// entries must verify; there is no partial acceptance.
pub fn verify_manifest(
    content: &[u8],
    expected_digest: Option<&str>,
    trust: &dyn TrustPolicy,
) -> RegistryResult<Vec<Digest>> {
    let manifest: Manifest =
        serde_json::from_slice(content).map_err(|e| RegistryError::InvalidManifest {
            message: format!("failed to parse manifest JSON: {}", e),
        })?;

    if manifest.signatures.is_empty() {
        return Err(RegistryError::SignatureInvalid {
            reason: "manifest carries no signatures".to_string(),
        });
    }

    let mut entries = Vec::with_capacity(manifest.signatures.len());
    for sig in &manifest.signatures {
        let protected_raw = b64::decode(&sig.protected)?;
        let protected: ProtectedHeader =
            serde_json::from_slice(&protected_raw).map_err(|e| RegistryError::InvalidManifest {
                message: format!("failed to parse protected header: {}", e),
            })?;
        let format_tail = b64::decode(&protected.format_tail)?;

        let algorithm = SignatureAlgorithm::from_header(&sig.header.alg)?;

        if sig.header.chain.as_ref().is_some_and(|chain| !chain.is_empty()) {
            return Err(RegistryError::ChainNotImplemented);
        }

        let jwk = sig
            .header
            .jwk
            .as_ref()
            .ok_or_else(|| RegistryError::SignatureInvalid {
                reason: "signature header carries no jwk".to_string(),
            })?;
        let key = jwk_to_verifying_key(jwk)?;

        entries.push(SignatureEntry {
            algorithm,
            signature: b64::decode(&sig.signature)?,
            protected64: sig.protected.clone(),
            key,
            format_length: protected.format_length,
            format_tail,
        });
    }

    // The payload is reconstructed once, from the first entry's split applied
    // to the raw received bytes.
    let first = &entries[0];
    let payload = reconstruct_payload(content, first.format_length, &first.format_tail)?;
    let payload64 = b64::encode(&payload);

    // Digest binding happens before signature checks: a manifest is only
    // trusted if both the content digest and every signature pass.
    if let Some(expected) = expected_digest {
        let expected = Digest::parse(expected)?;
        let actual = Digest::from_bytes(&payload);
        if actual != expected {
            return Err(RegistryError::DigestMismatch {
                actual: actual.to_string(),
                expected: expected.to_string(),
            });
        }
    }

    for entry in &entries {
        let message = format!("{}.{}", entry.protected64, payload64);
        entry
            .algorithm
            .verify(message.as_bytes(), &entry.signature, &entry.key)?;
    }

    for entry in &entries {
        trust.authorize(&entry.key)?;
    }

    debug!(
        name = manifest.name.as_str(),
        tag = manifest.tag.as_str(),
        signatures = entries.len(),
        layers = manifest.fs_layers.len(),
        "verified manifest"
    );

    let mut digests = Vec::with_capacity(manifest.fs_layers.len());
    for layer in &manifest.fs_layers {
        digests.push(Digest::parse(&layer.blob_sum)?);
    }
    Ok(digests)
}
