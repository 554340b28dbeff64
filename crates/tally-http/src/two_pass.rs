//! Legacy capture strategy: run the inner service twice per request.
//!
//! The first invocation goes into an in-memory capture that exists only long
//! enough to yield a checksum; the second produces the response the client
//! actually receives, with the checksum header attached.
//!
//! Hazards, inherited by any consumer whose inner service is not idempotent:
//!
//! - every side effect in the inner service happens **twice** per request;
//! - the checksum describes the first pass while the client receives the
//!   second pass's output, so a non-idempotent service can ship a checksum
//!   that does not match its own response.
//!
//! Prefer [`ChecksumLayer`](crate::ChecksumLayer) unless exact parity with
//! this behavior is required.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::response::Response;
use bytes::Bytes;
use http::request::Parts;
use tower::{Layer, Service, ServiceExt};

use tally_core::CHECKSUM_HEADER;

use crate::capture::CapturedResponse;
use crate::stamp::{bare_error_response, checksum_value};

#[derive(Clone, Copy, Debug, Default)]
pub struct TwoPassLayer;

impl TwoPassLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TwoPassLayer {
    type Service = TwoPassService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TwoPassService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct TwoPassService<S> {
    inner: S,
}

impl<S> Service<Request> for TwoPassService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // Buffer the request so both passes observe the same bytes.
            let (parts, body) = req.into_parts();
            let body = match to_bytes(body, usize::MAX).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(error = %e, "request body failed during buffering");
                    return Ok(bare_error_response());
                }
            };

            // First pass: capture, checksum, discard. The capture is never
            // sent to the client.
            let first = inner.clone().oneshot(replay(&parts, &body)).await?;
            let checksum = match CapturedResponse::collect(first).await {
                Ok(captured) => captured.checksum(),
                Err(e) => {
                    tracing::error!(error = %e, "response body failed during capture");
                    return Ok(bare_error_response());
                }
            };

            // Second pass: the real response. The header is seeded first and
            // the service's own header writes layer on top, so a service that
            // sets `X-Checksum` itself keeps its value.
            let mut response = inner.oneshot(replay(&parts, &body)).await?;
            response
                .headers_mut()
                .entry(CHECKSUM_HEADER)
                .or_insert(checksum_value(checksum));
            Ok(response)
        })
    }
}

/// Rebuild an identical request for one pass. Extensions installed by outer
/// layers are not replayed; the router re-installs its own during each pass.
fn replay(parts: &Parts, body: &Bytes) -> Request {
    let mut req = Request::new(Body::from(body.clone()));
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    req
}

// ── Tests ─────────────────────────────────────────────────────────────────────
