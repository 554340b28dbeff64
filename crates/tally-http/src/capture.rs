//! In-memory response capture.

use axum::body::{to_bytes, Body};
use axum::response::Response;
use bytes::Bytes;
use http::response::Parts;
use http::{HeaderMap, StatusCode};
use thiserror::Error;

use tally_core::CHECKSUM_HEADER;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to buffer body: {0}")]
    Body(#[from] axum::Error),
}

/// A handler's output, observed in memory before it reaches the client.
///
/// Holds the response parts (status, headers, version, extensions) and the
/// fully-buffered body, so the original response can be reconstructed
/// losslessly after its checksum has been read off.
pub struct CapturedResponse {
    parts: Parts,
    body: Bytes,
}

impl CapturedResponse {
    /// Consume a response, buffering its body to completion.
    pub async fn collect(response: Response) -> Result<Self, CaptureError> {
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX).await?;
        Ok(Self { parts, body })
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The checksum describing this capture.
    ///
    /// An `X-Checksum` header already present on the capture is excluded —
    /// the checksum never describes itself.
    pub fn checksum(&self) -> String {
        if self.parts.headers.contains_key(&CHECKSUM_HEADER) {
            let mut headers = self.parts.headers.clone();
            headers.remove(&CHECKSUM_HEADER);
            tally_core::compute(self.parts.status, &headers, &self.body)
        } else {
            tally_core::compute(self.parts.status, &self.parts.headers, &self.body)
        }
    }

    /// Rebuild the original response around the buffered body.
    pub fn into_response(self) -> Response {
        Response::from_parts(self.parts, Body::from(self.body))
    }
}
