//! Client-side integrity layer for content-addressed image registries.
//!
//! `blobreg` talks to Docker Registry v2 compatible registries and guarantees
//! that what a caller publishes is what other callers later retrieve:
//!
//! - Manifests are signed on publish (ES256, JWS-style with an embedded JWK)
//!   and verified on retrieval. Every signature must verify and the
//!   registry-reported content digest must match the signed payload.
//! - Blobs are addressed by SHA-256 digest and downloads flow through a
//!   [`DigestGuard`] that checks the bytes against the requested digest.
//! - Who is allowed to sign is a separate, injectable concern: see
//!   [`TrustPolicy`], [`AcceptEmbeddedKeys`] and [`PinnedKeys`].
//!
//! # Quick start
//!
//! ```no_run
//! use blobreg::{AcceptEmbeddedKeys, RegistryClient, RegistryConfig, RegistryResult};
//!
//! # async fn run() -> RegistryResult<()> {
//! let client = RegistryClient::new(
//!     RegistryConfig::default()
//!         .with_url("https://registry.example.com")
//!         .with_repo("myorg/myrepo"),
//! )?;
//!
//! let digest = client.push_blob("layer.tar.gz").await?;
//! client.push_manifest("v1.0", &[digest]).await?;
//!
//! let layers = client.pull_manifest("v1.0", &AcceptEmbeddedKeys).await?;
//! let blob = client.pull_blob(&layers[0]).await?.verify_to_end().await?;
//! # let _ = blob;
//! # Ok(())
//! # }
//! ```
//!
//! The signing and verification primitives are also usable without the HTTP
//! client, via [`sign_manifest`] and [`verify_manifest`].

mod b64;
pub mod bignum;
pub mod client;
pub mod digest;
pub mod error;
pub mod keys;
pub mod sign;
pub mod split;
pub mod stream;
pub mod trust;
pub mod types;
pub mod verify;

pub use client::{BlobStream, RegistryClient, REGISTRY_USER_AGENT};
pub use digest::{Digest, DIGEST_METHOD};
pub use error::{RegistryError, RegistryResult};
pub use keys::{
    generate_signing_key, jwk_to_verifying_key, verifying_key_to_jwk, Jwk, SignatureAlgorithm,
};
pub use sign::sign_manifest;
pub use split::{compute_split, reconstruct_payload, PayloadSplit};
pub use stream::DigestGuard;
pub use trust::{key_id, AcceptEmbeddedKeys, PinnedKeys, TrustPolicy};
pub use types::{
    FsLayer, Manifest, ProtectedHeader, RegistryConfig, SignatureHeader, WireSignature,
};
pub use verify::verify_manifest;
