//! Wire types for the registry manifest protocol.

use serde::{Deserialize, Serialize};

use crate::keys::Jwk;

/// A signed image manifest as it travels over the wire.
///
/// Created by the signer when publishing a tag; consumed and discarded by
/// the verifier when fetching a tag; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Repository name (e.g., "lib/test").
    pub name: String,

    /// Tag this manifest was published under.
    pub tag: String,

    /// Ordered content-addressed layers composing the image.
    #[serde(rename = "fsLayers")]
    pub fs_layers: Vec<FsLayer>,

    /// Signature entries. Absent in the pre-signature serialization; the
    /// verifier rejects manifests where this is empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<WireSignature>,
}

/// One content-addressed layer reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsLayer {
    /// Layer digest in `sha256:<hex>` form.
    #[serde(rename = "blobSum")]
    pub blob_sum: String,
}

/// One wire signature entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSignature {
    /// Algorithm and key material.
    pub header: SignatureHeader,

    /// Base64url-encoded (unpadded) raw signature bytes.
    pub signature: String,

    /// Base64url-encoded (unpadded) protected header JSON.
    pub protected: String,
}

/// Signature header: algorithm plus self-asserted key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Signature algorithm name (e.g., "ES256").
    pub alg: String,

    /// Embedded public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,

    /// Certificate chain. Declaring one is rejected, not ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<String>>,
}

/// Protected header covered by each signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Prefix boundary into the signed payload.
    #[serde(rename = "formatLength")]
    pub format_length: usize,

    /// Base64url-encoded suffix bytes removed by that boundary.
    #[serde(rename = "formatTail")]
    pub format_tail: String,
}

/// Registry client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry base URL (e.g., `https://registry.example.com`).
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Repository this client operates on (e.g., "lib/test").
    #[serde(default)]
    pub repo: String,

    /// Pre-acquired bearer token. Token acquisition is the caller's job.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_registry_url() -> String {
    "https://registry-1.docker.io".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            repo: String::new(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `BLOBREG_REGISTRY_URL` | Registry base URL |
    /// | `BLOBREG_REPO` | Repository name |
    /// | `BLOBREG_REGISTRY_TOKEN` | Bearer token |
    /// | `BLOBREG_REGISTRY_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("BLOBREG_REGISTRY_URL").unwrap_or_else(|_| default_registry_url()),
            repo: std::env::var("BLOBREG_REPO").unwrap_or_default(),
            token: std::env::var("BLOBREG_REGISTRY_TOKEN").ok(),
            timeout_secs: std::env::var("BLOBREG_REGISTRY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the repository.
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
