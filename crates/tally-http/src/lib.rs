//! tally-http — middleware that stamps every HTTP response with an
//! `X-Checksum` integrity header.
//!
//! Two tower layers are provided:
//!
//! - [`ChecksumLayer`] (the default): runs the inner service once, buffers
//!   the response body in memory, computes the checksum, and releases the
//!   reconstructed response with the header attached.
//! - [`TwoPassLayer`]: the legacy capture strategy. Runs the inner service
//!   **twice** per request — once into a discarded capture to obtain the
//!   checksum, then again for the response the client receives. Any side
//!   effect in the inner service happens twice. Kept for consumers who need
//!   exact parity with that behavior; prefer [`ChecksumLayer`].
//!
//! Neither layer is streaming-safe: response bodies are buffered in full
//! before anything reaches the client.

mod capture;
mod stamp;
mod two_pass;

pub use capture::{CaptureError, CapturedResponse};
pub use stamp::{ChecksumLayer, ChecksumService};
pub use two_pass::{TwoPassLayer, TwoPassService};
