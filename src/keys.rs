//! JWK codec and signature-algorithm dispatch for P-256 keys.
//!
//! Only EC keys on curve P-256 are supported. Verifying keys are
//! reconstructed fresh from wire-supplied JWK data on every verification;
//! the crate never trusts a key reference retained from a prior call.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::bignum;
use crate::error::{RegistryError, RegistryResult};

/// Supported JWK key type.
pub const KEY_TYPE: &str = "EC";

/// Supported JWK curve.
pub const CURVE: &str = "P-256";

/// JSON Web Key, restricted to the EC/P-256 shape this protocol uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

/// Generate a fresh random P-256 keypair.
///
/// Keys are ephemeral: one keypair per publish operation, no persistent
/// identity across publishes.
pub fn generate_signing_key() -> SigningKey {
    SigningKey::random(&mut OsRng)
}

/// Encode a verifying key's affine coordinates as a public JWK.
pub fn verifying_key_to_jwk(key: &VerifyingKey) -> Jwk {
    let point = key.to_encoded_point(false);
    // An uncompressed SEC1 encoding of a valid public key always carries
    // both affine coordinates.
    let x = point.x().expect("uncompressed point has x coordinate");
    let y = point.y().expect("uncompressed point has y coordinate");
    Jwk {
        kty: KEY_TYPE.to_string(),
        crv: CURVE.to_string(),
        x: bignum::encode(x),
        y: bignum::encode(y),
    }
}

/// Reconstruct a verifying key from a wire-supplied JWK.
///
/// Point validity is delegated to the curve implementation and fails closed:
/// coordinates that do not name a point on P-256 are rejected.
pub fn jwk_to_verifying_key(jwk: &Jwk) -> RegistryResult<VerifyingKey> {
    if jwk.kty != KEY_TYPE {
        return Err(RegistryError::UnexpectedKeyType {
            actual: jwk.kty.clone(),
            expected: KEY_TYPE.to_string(),
        });
    }
    if jwk.crv != CURVE {
        return Err(RegistryError::UnexpectedKeyType {
            actual: jwk.crv.clone(),
            expected: CURVE.to_string(),
        });
    }

    let x = coordinate(&bignum::decode(&jwk.x)?)?;
    let y = coordinate(&bignum::decode(&jwk.y)?)?;
    let point = p256::EncodedPoint::from_affine_coordinates(&x, &y, false);

    VerifyingKey::from_encoded_point(&point).map_err(|_| RegistryError::SignatureInvalid {
        reason: "public key coordinates are not a valid point on P-256".to_string(),
    })
}

/// Left-pad an unsigned big-endian coordinate to the P-256 field size.
fn coordinate(raw: &[u8]) -> RegistryResult<p256::FieldBytes> {
    let mut trimmed = raw;
    while trimmed.len() > 1 && trimmed[0] == 0 {
        trimmed = &trimmed[1..];
    }
    let field_len = 32;
    if trimmed.is_empty() || trimmed.len() > field_len {
        return Err(RegistryError::InvalidManifest {
            message: format!(
                "P-256 coordinate is {} bytes, expected 1..={}",
                trimmed.len(),
                field_len
            ),
        });
    }
    let mut bytes = p256::FieldBytes::default();
    bytes[field_len - trimmed.len()..].copy_from_slice(trimmed);
    Ok(bytes)
}

/// Closed set of supported signature algorithms.
///
/// Unknown algorithm names are rejected explicitly; there is no default.
/// The algorithm `"none"` is disallowed in any case combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-256 with SHA-256, raw `r || s` signature bytes.
    Es256,
}

impl SignatureAlgorithm {
    /// Parse the `alg` value of a signature header.
    pub fn from_header(name: &str) -> RegistryResult<Self> {
        if name.eq_ignore_ascii_case("none") {
            return Err(RegistryError::DisallowedSignatureAlgorithm {
                algorithm: name.to_string(),
            });
        }
        match name {
            "ES256" => Ok(Self::Es256),
            other => Err(RegistryError::SignatureInvalid {
                reason: format!("unsupported signature algorithm: {}", other),
            }),
        }
    }

    /// Wire name of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
        }
    }

    /// Sign a message, returning raw signature bytes.
    pub fn sign(self, message: &[u8], key: &SigningKey) -> Vec<u8> {
        match self {
            Self::Es256 => {
                let signature: Signature = key.sign(message);
                signature.to_bytes().to_vec()
            }
        }
    }

    /// Verify raw signature bytes over a message.
    pub fn verify(self, message: &[u8], signature: &[u8], key: &VerifyingKey) -> RegistryResult<()> {
        match self {
            Self::Es256 => {
                let signature =
                    Signature::from_slice(signature).map_err(|e| RegistryError::SignatureInvalid {
                        reason: format!("malformed ES256 signature: {}", e),
                    })?;
                key.verify(message, &signature)
                    .map_err(|_| RegistryError::SignatureInvalid {
                        reason: "ES256 signature verification failed".to_string(),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwk_round_trip_verifies_signatures() {
        let signing_key = generate_signing_key();
        let jwk = verifying_key_to_jwk(signing_key.verifying_key());
        let restored = jwk_to_verifying_key(&jwk).unwrap();

        let message = b"protected64.payload64";
        let signature = SignatureAlgorithm::Es256.sign(message, &signing_key);

        SignatureAlgorithm::Es256
            .verify(message, &signature, &restored)
            .expect("restored key must verify signatures from the matching private key");
    }

    #[test]
    fn jwk_rejects_wrong_kty() {
        let mut jwk = verifying_key_to_jwk(generate_signing_key().verifying_key());
        jwk.kty = "RSA".to_string();
        match jwk_to_verifying_key(&jwk) {
            Err(RegistryError::UnexpectedKeyType { actual, expected }) => {
                assert_eq!(actual, "RSA");
                assert_eq!(expected, "EC");
            }
            other => panic!("expected UnexpectedKeyType, got {:?}", other),
        }
    }

    #[test]
    fn jwk_rejects_wrong_curve() {
        let mut jwk = verifying_key_to_jwk(generate_signing_key().verifying_key());
        jwk.crv = "P-384".to_string();
        match jwk_to_verifying_key(&jwk) {
            Err(RegistryError::UnexpectedKeyType { actual, expected }) => {
                assert_eq!(actual, "P-384");
                assert_eq!(expected, "P-256");
            }
            other => panic!("expected UnexpectedKeyType, got {:?}", other),
        }
    }

    #[test]
    fn jwk_rejects_point_off_curve() {
        // (1, 1) is not on P-256: reconstruction must fail closed.
        let jwk = Jwk {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: bignum::encode(&[1]),
            y: bignum::encode(&[1]),
        };
        assert!(matches!(
            jwk_to_verifying_key(&jwk),
            Err(RegistryError::SignatureInvalid { .. })
        ));
    }

    #[test]
    fn jwk_accepts_short_coordinates() {
        // Coordinates whose minimal encoding is shorter than 32 bytes must be
        // left-padded, not rejected. Generate keys until one has a coordinate
        // with a leading zero byte (p = 1/256 per coordinate per key).
        for _ in 0..2048 {
            let signing_key = generate_signing_key();
            let jwk = verifying_key_to_jwk(signing_key.verifying_key());
            let x = bignum::decode(&jwk.x).unwrap();
            if x.len() < 32 {
                let restored = jwk_to_verifying_key(&jwk).unwrap();
                assert_eq!(&restored, signing_key.verifying_key());
                return;
            }
        }
        panic!("no short-coordinate key found in 2048 draws");
    }

    #[test]
    fn algorithm_none_is_disallowed_any_case() {
        for alg in ["none", "NONE", "None", "nOnE"] {
            assert!(matches!(
                SignatureAlgorithm::from_header(alg),
                Err(RegistryError::DisallowedSignatureAlgorithm { .. })
            ));
        }
    }

    #[test]
    fn algorithm_unknown_is_rejected() {
        assert!(matches!(
            SignatureAlgorithm::from_header("HS256"),
            Err(RegistryError::SignatureInvalid { .. })
        ));
    }

    #[test]
    fn algorithm_es256_round_trips() {
        let parsed = SignatureAlgorithm::from_header("ES256").unwrap();
        assert_eq!(parsed, SignatureAlgorithm::Es256);
        assert_eq!(parsed.name(), "ES256");
    }

    #[test]
    fn tampered_message_fails_verification() {
        let signing_key = generate_signing_key();
        let signature = SignatureAlgorithm::Es256.sign(b"original", &signing_key);
        assert!(matches!(
            SignatureAlgorithm::Es256.verify(b"tampered", &signature, signing_key.verifying_key()),
            Err(RegistryError::SignatureInvalid { .. })
        ));
    }
}
