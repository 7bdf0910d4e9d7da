//! Content digests (`sha256:<64 hex chars>`) and hashing helpers.

use std::fmt;
use std::io::Read;
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::error::{RegistryError, RegistryResult};

/// The only digest method supported by this protocol.
pub const DIGEST_METHOD: &str = "sha256";

const HEX_LEN: usize = 64;

/// A content digest: (method, hex) pair. Immutable value type.
///
/// The hex string length is guaranteed to match the method's output size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    method: String,
    hex: String,
}

impl Digest {
    /// Parse a `method:hex` digest string.
    ///
    /// Fails with `UnexpectedDigestMethod` for any method other than
    /// `sha256`, before validating the hex part.
    pub fn parse(s: &str) -> RegistryResult<Self> {
        let (method, hex_part) = s.split_once(':').ok_or_else(|| RegistryError::InvalidDigest {
            digest: s.to_string(),
            reason: "missing method prefix".to_string(),
        })?;

        if method != DIGEST_METHOD {
            return Err(RegistryError::UnexpectedDigestMethod {
                actual: method.to_string(),
                expected: DIGEST_METHOD.to_string(),
            });
        }

        if hex_part.len() != HEX_LEN {
            return Err(RegistryError::InvalidDigest {
                digest: s.to_string(),
                reason: format!("expected {} hex characters, got {}", HEX_LEN, hex_part.len()),
            });
        }

        hex::decode(hex_part).map_err(|_| RegistryError::InvalidDigest {
            digest: s.to_string(),
            reason: "not a hexadecimal string".to_string(),
        })?;

        Ok(Self {
            method: DIGEST_METHOD.to_string(),
            hex: hex_part.to_ascii_lowercase(),
        })
    }

    /// Compute the digest of an in-memory byte sequence.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            method: DIGEST_METHOD.to_string(),
            hex: format!("{:x}", Sha256::digest(data)),
        }
    }

    /// Compute the digest of a file, reading it in chunks.
    pub fn of_file(path: &Path) -> RegistryResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self {
            method: DIGEST_METHOD.to_string(),
            hex: sha256_hex_reader(file)?,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.hex)
    }
}

pub(crate) fn sha256_hex_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_valid_digest() {
        let hex = "a".repeat(64);
        let digest = Digest::parse(&format!("sha256:{}", hex)).unwrap();
        assert_eq!(digest.method(), "sha256");
        assert_eq!(digest.hex(), hex);
        assert_eq!(digest.to_string(), format!("sha256:{}", hex));
    }

    #[test]
    fn parse_rejects_unknown_method() {
        let result = Digest::parse(&format!("sha1:{}", "a".repeat(40)));
        match result {
            Err(RegistryError::UnexpectedDigestMethod { actual, expected }) => {
                assert_eq!(actual, "sha1");
                assert_eq!(expected, "sha256");
            }
            other => panic!("expected UnexpectedDigestMethod, got {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_bad_hex() {
        assert!(matches!(
            Digest::parse(&format!("sha256:{}", "z".repeat(64))),
            Err(RegistryError::InvalidDigest { .. })
        ));
        assert!(matches!(
            Digest::parse("sha256:abcd"),
            Err(RegistryError::InvalidDigest { .. })
        ));
        assert!(matches!(
            Digest::parse("no-method-prefix"),
            Err(RegistryError::InvalidDigest { .. })
        ));
    }

    #[test]
    fn parse_normalizes_to_lowercase() {
        let upper = "A".repeat(64);
        let digest = Digest::parse(&format!("sha256:{}", upper)).unwrap();
        assert_eq!(digest.hex(), "a".repeat(64));
    }

    #[test]
    fn from_bytes_known_vector() {
        let digest = Digest::from_bytes(b"abcdef");
        assert_eq!(
            digest.to_string(),
            "sha256:bef57ec7f53a6d40beb640a780a639c83bc29ac8a9816f1fc6c5c6dcd93c4721"
        );
    }

    #[test]
    fn reader_matches_bytes_digest() {
        let payload = b"\x00\x01hello\xffbinary\n";
        let from_bytes = Digest::from_bytes(payload);
        let from_reader = sha256_hex_reader(Cursor::new(payload)).expect("reader hashing");
        assert_eq!(from_bytes.hex(), from_reader);
    }

    #[test]
    fn file_digest_matches_bytes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"layer contents").unwrap();

        let from_file = Digest::of_file(&path).unwrap();
        assert_eq!(from_file, Digest::from_bytes(b"layer contents"));
    }
}
