//! Default stamping strategy: buffer a single invocation's response,
//! checksum it, release it with the header attached.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use http::{HeaderValue, StatusCode};
use tower::{Layer, Service};

use tally_core::CHECKSUM_HEADER;

use crate::capture::CapturedResponse;

/// Adds an `X-Checksum` header to every response of the wrapped service.
///
/// The inner service runs exactly once per request; its response body is
/// buffered in full before the client sees anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChecksumLayer;

impl ChecksumLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ChecksumLayer {
    type Service = ChecksumService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ChecksumService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct ChecksumService<S> {
    inner: S,
}

impl<S> Service<Request> for ChecksumService<S>
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
        // Take the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(stamp(response).await)
        })
    }
}

/// Buffer a response, compute its checksum, and reattach the header.
pub(crate) async fn stamp(response: Response) -> Response {
    let captured = match CapturedResponse::collect(response).await {
        Ok(captured) => captured,
        Err(e) => {
            // The original response is gone once its body stream fails.
            tracing::error!(error = %e, "response body failed during capture");
            return bare_error_response();
        }
    };

    let checksum = captured.checksum();
    tracing::debug!(status = %captured.status(), checksum = %checksum, "stamped response");

    let mut response = captured.into_response();
    response
        .headers_mut()
        .insert(CHECKSUM_HEADER, checksum_value(checksum));
    response
}

/// Empty 500 substituted when a body stream fails mid-capture. Stamped like
/// any other response so the header invariant holds even on this path.
pub(crate) fn bare_error_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let checksum = tally_core::compute(response.status(), response.headers(), b"");
    response
        .headers_mut()
        .insert(CHECKSUM_HEADER, checksum_value(checksum));
    response
}

pub(crate) fn checksum_value(checksum: String) -> HeaderValue {
    // 40 lowercase hex characters — always a valid header value
    HeaderValue::try_from(checksum).expect("hex digest is a valid header value")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
