//! tally-core — the checksum engine.
//! The middleware, the verifier, and the tests all depend on this one.

pub mod checksum;

pub use checksum::{canonical_bytes, canonical_name, compute, CHECKSUM_HEADER};
