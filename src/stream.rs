//! Pass-through digest checking for streamed blob downloads.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use sha2::{Digest as _, Sha256};

use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};

/// Wraps a chunked byte stream and verifies its SHA-256 digest.
///
/// Chunks flow through untouched while a running hash accumulates. When the
/// inner stream ends, the accumulated digest is compared against the expected
/// one; on mismatch a single [`RegistryError::DigestMismatch`] is yielded as
/// the final item. Callers that must not release unverified bytes should use
/// [`DigestGuard::verify_to_end`] instead.
pub struct DigestGuard<S> {
    inner: S,
    hasher: Option<Sha256>,
    expected: Digest,
}

impl<S> DigestGuard<S> {
    pub fn new(inner: S, expected: Digest) -> Self {
        Self {
            inner,
            hasher: Some(Sha256::new()),
            expected,
        }
    }

    /// The digest this guard checks against.
    pub fn expected(&self) -> &Digest {
        &self.expected
    }
}

impl<S, E> Stream for DigestGuard<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<RegistryError>,
{
    type Item = RegistryResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // A consumed hasher marks the stream as finished, either cleanly or
        // after an error has already been yielded.
        if this.hasher.is_none() {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(hasher) = this.hasher.as_mut() {
                    hasher.update(&chunk);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.hasher = None;
                Poll::Ready(Some(Err(e.into())))
            }
            Poll::Ready(None) => {
                let hasher = match this.hasher.take() {
                    Some(hasher) => hasher,
                    None => return Poll::Ready(None),
                };
                let actual = format!("{:x}", hasher.finalize());
                if actual == this.expected.hex() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Err(RegistryError::DigestMismatch {
                        actual: format!("sha256:{}", actual),
                        expected: this.expected.to_string(),
                    })))
                }
            }
        }
    }
}

impl<S, E> DigestGuard<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<RegistryError>,
{
    /// Buffer the whole stream, verify the digest, then release the bytes.
    ///
    /// Unlike consuming the guard as a stream, no byte is handed to the
    /// caller before verification completes.
    pub async fn verify_to_end(mut self) -> RegistryResult<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}
