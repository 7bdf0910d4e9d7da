//! Canonical payload splitter.
//!
//! The wire manifest appends a `"signatures"` array as the last field of an
//! otherwise-complete JSON object. Signatures cover the document as it
//! existed before that array was spliced in, so the signed payload is defined
//! structurally: `content[..format_length] + format_tail`, where
//! `format_length` is the index of the last `}` of the pre-signature
//! serialization and `format_tail` the bytes from there to the end. Whatever
//! is inserted between the truncation point and the tail is excluded from
//! what is signed.

use crate::error::{RegistryError, RegistryResult};

/// Split point of a pre-signature JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSplit {
    /// Index of the last `}` in the pre-signature JSON text.
    pub format_length: usize,
    /// Text from `format_length` to the end (the closing brace for the
    /// canonical serializer used here).
    pub format_tail: String,
}

/// Compute the split point of a pre-signature JSON document.
pub fn compute_split(json: &str) -> RegistryResult<PayloadSplit> {
    let format_length = json.rfind('}').ok_or_else(|| RegistryError::InvalidManifest {
        message: "manifest JSON has no closing brace".to_string(),
    })?;
    Ok(PayloadSplit {
        format_length,
        format_tail: json[format_length..].to_string(),
    })
}

/// Reconstruct the signed payload from received bytes and a decoded split.
///
/// This is the exact byte sequence that was signed, independent of whatever
/// was inserted between the truncation point and the tail.
pub fn reconstruct_payload(
    full: &[u8],
    format_length: usize,
    format_tail: &[u8],
) -> RegistryResult<Vec<u8>> {
    let head = full
        .get(..format_length)
        .ok_or_else(|| RegistryError::InvalidManifest {
            message: format!(
                "formatLength {} exceeds content length {}",
                format_length,
                full.len()
            ),
        })?;

    let mut payload = Vec::with_capacity(head.len() + format_tail.len());
    payload.extend_from_slice(head);
    payload.extend_from_slice(format_tail);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{"name":"lib/test","tag":"latest","fsLayers":[{"blobSum":"sha256:aa"}]}"#;

    #[test]
    fn split_points_at_last_brace() {
        let split = compute_split(MANIFEST).unwrap();
        assert_eq!(split.format_length, MANIFEST.len() - 1);
        assert_eq!(split.format_tail, "}");
    }

    #[test]
    fn reconstruct_is_identity_for_unmodified_document() {
        let split = compute_split(MANIFEST).unwrap();
        let payload = reconstruct_payload(
            MANIFEST.as_bytes(),
            split.format_length,
            split.format_tail.as_bytes(),
        )
        .unwrap();
        assert_eq!(payload, MANIFEST.as_bytes());
    }

    #[test]
    fn reconstruct_excludes_inserted_segment() {
        let split = compute_split(MANIFEST).unwrap();
        let spliced = format!(
            "{}, \"signatures\": [1, 2, 3]{}",
            &MANIFEST[..split.format_length],
            split.format_tail
        );
        let payload = reconstruct_payload(
            spliced.as_bytes(),
            split.format_length,
            split.format_tail.as_bytes(),
        )
        .unwrap();
        assert_eq!(payload, MANIFEST.as_bytes());
    }

    #[test]
    fn split_rejects_braceless_input() {
        assert!(matches!(
            compute_split("[1, 2]"),
            Err(RegistryError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn reconstruct_rejects_out_of_range_length() {
        assert!(matches!(
            reconstruct_payload(b"{}", 100, b"}"),
            Err(RegistryError::InvalidManifest { .. })
        ));
    }
}
