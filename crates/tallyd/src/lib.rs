//! tallyd — HTTP server that stamps every response with an `X-Checksum`
//! integrity header.
//!
//! The router is an explicit value built by [`app`] and passed into the
//! serve call; there is no process-wide handler registry. Exposed as a
//! library so integration tests can drive the real router in-process.

use anyhow::Context;
use axum::body::Body;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use tower_http::trace::TraceLayer;

use tally_http::ChecksumLayer;

/// Body of the demonstration endpoint.
pub const GREETING: &str = "Curiosity is insubordination in its purest form.\n";

/// Build the router: the demonstration handler on `/`, every response —
/// including fallback 404s — stamped by [`ChecksumLayer`].
pub fn app() -> Router {
    Router::new()
        .route("/", any(greeting))
        .layer(ChecksumLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Demonstration handler: a fixed greeting exercising the middleware.
///
/// Every entity header, `Date` and `Content-Length` included, is set
/// explicitly so the on-wire response equals the captured one and external
/// verification of this endpoint succeeds.
async fn greeting() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(HeaderName::from_static("x-foo"), "bar")
        .header(header::DATE, "Sun, 08 May 2016 14:04:53 GMT")
        .header(header::CONTENT_LENGTH, GREETING.len().to_string())
        .body(Body::from(GREETING))
        .expect("static response parts are valid")
}

/// Accept the bare `:port` form of the listen flag and normalize it to all
/// interfaces; anything else passes through to the resolver untouched.
pub fn normalize_listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// Bind the listen address and serve the router until the process dies.
///
/// Bind failure is fatal to the caller. There is no graceful shutdown path.
pub async fn serve(listen_addr: &str) -> anyhow::Result<()> {
    let addr = normalize_listen_addr(listen_addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "tallyd listening");
    axum::serve(listener, app()).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
