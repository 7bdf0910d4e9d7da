//! Manifest signing: one detached-style ES256 signature entry spliced into
//! the manifest JSON text.

use p256::ecdsa::SigningKey;
use tracing::debug;

use crate::b64;
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::keys::{verifying_key_to_jwk, SignatureAlgorithm};
use crate::split::compute_split;
use crate::types::{FsLayer, Manifest, ProtectedHeader, SignatureHeader, WireSignature};

/// Sign a manifest for publishing, returning wire-ready manifest text.
///
/// The signature covers `protected64 "." payload64` where `payload64` encodes
/// the manifest as serialized before the signatures array is spliced in. The
/// splice happens at exactly the protected header's `formatLength`, so
/// re-deriving the split on verification reproduces the same signed payload.
pub fn sign_manifest(
    name: &str,
    tag: &str,
    layers: &[Digest],
    key: &SigningKey,
) -> RegistryResult<String> {
    let manifest = Manifest {
        name: name.to_string(),
        tag: tag.to_string(),
        fs_layers: layers
            .iter()
            .map(|digest| FsLayer {
                blob_sum: digest.to_string(),
            })
            .collect(),
        signatures: Vec::new(),
    };

    let manifest_json = serialize(&manifest)?;
    let split = compute_split(&manifest_json)?;

    let protected = ProtectedHeader {
        format_length: split.format_length,
        format_tail: b64::encode(split.format_tail.as_bytes()),
    };
    let protected64 = b64::encode(serialize(&protected)?.as_bytes());
    let payload64 = b64::encode(manifest_json.as_bytes());

    let algorithm = SignatureAlgorithm::Es256;
    let message = format!("{}.{}", protected64, payload64);
    let signature = algorithm.sign(message.as_bytes(), key);

    let entry = WireSignature {
        header: SignatureHeader {
            alg: algorithm.name().to_string(),
            jwk: Some(verifying_key_to_jwk(key.verifying_key())),
            chain: None,
        },
        signature: b64::encode(&signature),
        protected: protected64,
    };

    debug!(
        name = name,
        tag = tag,
        layers = layers.len(),
        format_length = split.format_length,
        "signed manifest"
    );

    Ok(format!(
        "{}, \"signatures\": {}{}",
        &manifest_json[..split.format_length],
        serialize(&[entry])?,
        split.format_tail
    ))
}

fn serialize<T: serde::Serialize>(value: &T) -> RegistryResult<String> {
    serde_json::to_string(value).map_err(|e| RegistryError::InvalidManifest {
        message: format!("failed to serialize manifest JSON: {}", e),
    })
}
