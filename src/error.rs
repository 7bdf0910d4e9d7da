//! Error types for the registry integrity layer.

/// Registry errors.
///
/// Integrity failures (`DigestMismatch`, `SignatureInvalid`, ...) are treated
/// as security events: they are never retried and never downgraded.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// JWK declares a key type or curve other than EC / P-256.
    #[error("unexpected key type: {actual} (expected {expected})")]
    UnexpectedKeyType { actual: String, expected: String },

    /// Signature declares algorithm "none" (any case).
    #[error("disallowed signature algorithm: {algorithm}")]
    DisallowedSignatureAlgorithm { algorithm: String },

    /// Signature header declares a certificate chain; chains of trust are
    /// rejected explicitly, never silently accepted.
    #[error("certificate chains are not implemented")]
    ChainNotImplemented,

    /// A digest string uses a hash method other than the supported one.
    #[error("unexpected digest method: {actual} (expected {expected})")]
    UnexpectedDigestMethod { actual: String, expected: String },

    /// Computed digest disagrees with the expected/declared digest.
    #[error("digest mismatch: computed {actual}, expected {expected}")]
    DigestMismatch { actual: String, expected: String },

    /// Registry answered with a status code the operation does not accept.
    #[error("unexpected status code: {actual} (expected {expected})")]
    UnexpectedStatusCode { actual: u16, expected: u16 },

    /// Signature verification failed or the signature entry is malformed.
    #[error("signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    /// Signing key is not in the configured trust set.
    #[error("key not trusted: {key_id}")]
    KeyNotTrusted { key_id: String },

    /// Manifest document is structurally invalid.
    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    /// Digest string is malformed.
    #[error("invalid digest {digest}: {reason}")]
    InvalidDigest { digest: String, reason: String },

    /// Response from the registry could not be interpreted.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Local I/O error.
    #[error("i/o error: {message}")]
    Io { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RegistryError {
    /// Exit code for CLI wrappers.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Config / input issues
            Self::Config { .. } => 1,
            Self::InvalidDigest { .. } => 1,

            // Security issues (higher priority)
            Self::UnexpectedKeyType { .. } => 4,
            Self::DisallowedSignatureAlgorithm { .. } => 4,
            Self::ChainNotImplemented => 4,
            Self::UnexpectedDigestMethod { .. } => 4,
            Self::DigestMismatch { .. } => 4,
            Self::SignatureInvalid { .. } => 4,
            Self::KeyNotTrusted { .. } => 4,

            // Network/transient
            Self::UnexpectedStatusCode { .. } => 5,
            Self::Network { .. } => 5,

            // Other
            Self::InvalidManifest { .. } => 6,
            Self::InvalidResponse { .. } => 6,
            Self::Io { .. } => 6,
        }
    }

    /// Whether the error is retryable. Integrity failures never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
