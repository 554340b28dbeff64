//! End-to-end tests over real sockets.
//!
//! Each test binds the router under test to an ephemeral 127.0.0.1 port and
//! exercises it with a real HTTP client, so the wire contract is checked on
//! actual received bytes rather than in-process response values.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::routing::any;
use axum::Router;

use tally_core::CHECKSUM_HEADER;
use tally_http::TwoPassLayer;

const DEMO_CHECKSUM: &str = "016858b824090bcd4e02c41e608416397200db10";
const EMPTY_404_CHECKSUM: &str = "bab01af96c4c4669ba03e563ef71767b438cb534";

// ── Harness ───────────────────────────────────────────────────────────────────

/// Serve a router on an ephemeral port in the background; return its base URL.
async fn serve_ephemeral(app: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{addr}"))
}

fn received_checksum(response: &reqwest::Response) -> Result<String> {
    Ok(response
        .headers()
        .get(CHECKSUM_HEADER)
        .ok_or_else(|| anyhow::anyhow!("no X-Checksum header on response"))?
        .to_str()?
        .to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn demo_endpoint_carries_pinned_checksum() -> Result<()> {
    let base = serve_ephemeral(tallyd::app()).await?;

    let response = reqwest::get(format!("{base}/")).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(received_checksum(&response)?, DEMO_CHECKSUM);

    let body = response.bytes().await?;
    assert_eq!(&body[..], tallyd::GREETING.as_bytes());
    Ok(())
}

/// The verifier's algorithm: strip the header from what actually arrived on
/// the wire and recompute. Works for the demo endpoint because it sets every
/// entity header explicitly, so the transport adds nothing after capture.
#[tokio::test]
async fn checksum_matches_independent_recomputation() -> Result<()> {
    let base = serve_ephemeral(tallyd::app()).await?;

    let response = reqwest::get(format!("{base}/")).await?;
    let claimed = received_checksum(&response)?;
    let status = response.status();
    let mut headers = response.headers().clone();
    headers.remove(CHECKSUM_HEADER);
    let body = response.bytes().await?;

    assert_eq!(claimed, tally_core::compute(status, &headers, &body));
    Ok(())
}

#[tokio::test]
async fn repeated_requests_yield_identical_checksums() -> Result<()> {
    let base = serve_ephemeral(tallyd::app()).await?;

    let first = received_checksum(&reqwest::get(format!("{base}/")).await?)?;
    let second = received_checksum(&reqwest::get(format!("{base}/")).await?)?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn unrouted_path_is_still_stamped() -> Result<()> {
    let base = serve_ephemeral(tallyd::app()).await?;

    let response = reqwest::get(format!("{base}/no-such-path")).await?;
    assert_eq!(response.status(), 404);
    assert_eq!(received_checksum(&response)?, EMPTY_404_CHECKSUM);
    Ok(())
}

#[tokio::test]
async fn two_pass_counter_advances_by_two_per_request() -> Result<()> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();

    let app = Router::new()
        .route(
            "/",
            any(move || {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    "counted\n"
                }
            }),
        )
        .layer(TwoPassLayer::new());
    let base = serve_ephemeral(app).await?;

    let response = reqwest::get(format!("{base}/")).await?;
    assert!(response.headers().contains_key(CHECKSUM_HEADER));
    response.bytes().await?;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    Ok(())
}
