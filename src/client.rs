//! Registry client for blobs and signed manifests.
//!
//! The public API speaks digests and verified manifests; every exchange is
//! checked against a single expected status code and mismatches surface as
//! [`RegistryError::UnexpectedStatusCode`].

use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use tracing::debug;
use url::Url;

use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::keys::generate_signing_key;
use crate::sign::sign_manifest;
use crate::stream::DigestGuard;
use crate::trust::TrustPolicy;
use crate::types::RegistryConfig;
use crate::verify::verify_manifest;

/// User agent sent with every registry request.
pub const REGISTRY_USER_AGENT: &str = concat!("blobreg/", env!("CARGO_PKG_VERSION"));

const DOCKER_CONTENT_DIGEST: &str = "docker-content-digest";

/// Verified blob download stream.
pub type BlobStream =
    DigestGuard<Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>>;

/// Client for one repository on a registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    repo: String,
    token: Option<String>,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        if config.repo.is_empty() {
            return Err(RegistryError::Config {
                message: "repository name must not be empty".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(REGISTRY_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RegistryError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            repo: config.repo,
            token: config.token,
        })
    }

    pub fn from_env() -> RegistryResult<Self> {
        Self::new(RegistryConfig::from_env())
    }

    /// Replace the bearer token used for subsequent requests.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Upload a file as a blob and return its digest.
    pub async fn push_blob(&self, path: impl AsRef<Path>) -> RegistryResult<Digest> {
        let data = tokio::fs::read(path.as_ref()).await?;
        let digest = Digest::from_bytes(&data);
        debug!(digest = %digest, size = data.len(), "pushing blob");

        let start_url = format!("{}/v2/{}/blobs/uploads/", self.base_url, self.repo);
        let response = self
            .send_expect(self.request(Method::POST, &start_url), StatusCode::ACCEPTED)
            .await?;

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RegistryError::InvalidResponse {
                message: "upload start response carries no Location header".to_string(),
            })?;

        // Location may be relative to the registry root.
        let mut upload_url = Url::parse(&self.base_url)
            .and_then(|base| base.join(location))
            .map_err(|e| RegistryError::InvalidResponse {
                message: format!("invalid upload location {:?}: {}", location, e),
            })?;
        upload_url
            .query_pairs_mut()
            .append_pair("digest", &digest.to_string());

        self.send_expect(
            self.request(Method::PUT, upload_url.as_str()).body(data),
            StatusCode::CREATED,
        )
        .await?;

        Ok(digest)
    }

    /// Download a blob as a digest-guarded stream.
    ///
    /// Chunks are yielded as they arrive; a digest mismatch is reported as
    /// the stream's final item. Use [`DigestGuard::verify_to_end`] on the
    /// returned stream to buffer and verify before releasing any bytes.
    pub async fn pull_blob(&self, digest: &Digest) -> RegistryResult<BlobStream> {
        let url = self.blob_url(digest);
        debug!(digest = %digest, "pulling blob");

        let response = self
            .send_expect(self.request(Method::GET, &url), StatusCode::OK)
            .await?;

        Ok(DigestGuard::new(
            Box::pin(response.bytes_stream()),
            digest.clone(),
        ))
    }

    pub async fn delete_blob(&self, digest: &Digest) -> RegistryResult<()> {
        let url = self.blob_url(digest);
        debug!(digest = %digest, "deleting blob");

        self.send_expect(self.request(Method::DELETE, &url), StatusCode::ACCEPTED)
            .await?;
        Ok(())
    }

    /// Sign and publish a manifest binding `tag` to the given layer digests.
    ///
    /// A fresh signing key is generated per publish; the public half travels
    /// embedded in the manifest. Returns the signed wire text.
    pub async fn push_manifest(&self, tag: &str, layers: &[Digest]) -> RegistryResult<String> {
        let key = generate_signing_key();
        let signed = sign_manifest(&self.repo, tag, layers, &key)?;
        debug!(tag = tag, layers = layers.len(), "pushing signed manifest");

        self.send_expect(
            self.request(Method::PUT, &self.manifest_url(tag))
                .body(signed.clone()),
            StatusCode::CREATED,
        )
        .await?;

        Ok(signed)
    }

    /// Fetch and verify the manifest for `tag`, returning its layer digests.
    pub async fn pull_manifest(
        &self,
        tag: &str,
        trust: &dyn TrustPolicy,
    ) -> RegistryResult<Vec<Digest>> {
        let response = self
            .send_expect(self.request(Method::GET, &self.manifest_url(tag)), StatusCode::OK)
            .await?;

        let content_digest = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| RegistryError::Network {
            message: format!("failed to read manifest body: {}", e),
        })?;

        verify_manifest(&body, content_digest.as_deref(), trust)
    }

    /// Verify then delete the manifest for `tag`, returning its layer digests.
    ///
    /// The verification step keeps a tampered manifest from silently naming
    /// which blobs a caller would garbage-collect next.
    pub async fn delete_manifest(
        &self,
        tag: &str,
        trust: &dyn TrustPolicy,
    ) -> RegistryResult<Vec<Digest>> {
        let digests = self.pull_manifest(tag, trust).await?;
        debug!(tag = tag, "deleting manifest");

        self.send_expect(
            self.request(Method::DELETE, &self.manifest_url(tag)),
            StatusCode::ACCEPTED,
        )
        .await?;

        Ok(digests)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
    }

    async fn send_expect(
        &self,
        builder: RequestBuilder,
        expected: StatusCode,
    ) -> RegistryResult<reqwest::Response> {
        let response = builder.send().await?;
        if response.status() != expected {
            return Err(RegistryError::UnexpectedStatusCode {
                actual: response.status().as_u16(),
                expected: expected.as_u16(),
            });
        }
        Ok(response)
    }

    fn blob_url(&self, digest: &Digest) -> String {
        format!("{}/v2/{}/blobs/{}", self.base_url, self.repo, digest)
    }

    fn manifest_url(&self, tag: &str) -> String {
        format!("{}/v2/{}/manifests/{}", self.base_url, self.repo, tag)
    }
}
