//! Response checksum computation.
//!
//! A response's checksum is the SHA-1 digest of a canonical serialization of
//! its status code, headers, and body:
//!
//! ```text
//! <status decimal>\r\n
//! <Header-Name>: <value>\r\n          (one line per header, sorted by name)
//! X-Checksum-Headers: <names joined with ';'>\r\n
//! \r\n
//! <raw body bytes>
//! ```
//!
//! The serialization is a wire contract: an independent verifier must
//! reproduce it byte-for-byte from an observed response to recompute a
//! matching checksum. Header names are rendered in canonical MIME case
//! (`Content-Type`, not `content-type`) because that is the form the scheme
//! has always hashed; the `http` crate stores names lowercased, so the
//! canonical form is re-derived here.
//!
//! The synthetic `X-Checksum-Headers` line records which headers were
//! covered, so a verifier needs no out-of-band knowledge and silently
//! adding or removing a header cannot go unnoticed.

use http::{HeaderMap, HeaderName, StatusCode};
use sha1::{Digest, Sha1};

/// Name of the response header the checksum is delivered in.
///
/// Never fed into its own computation — the middleware computes the checksum
/// before inserting this header, and verifiers strip it before recomputing.
pub const CHECKSUM_HEADER: HeaderName = HeaderName::from_static("x-checksum");

const CRLF: &[u8] = b"\r\n";
const COLON_SPACE: &[u8] = b": ";
const HEADERS_LINE_LABEL: &[u8] = b"X-Checksum-Headers: ";

/// Compute the checksum of a response: 40 lowercase hex characters.
///
/// Total over any input — empty header sets and empty bodies are valid.
/// If a header carries multiple values, only the first participates; this
/// mirrors the single-value "get" convention of the originating HTTP layer
/// and is a documented edge case, not an error.
pub fn compute(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(canonical_prelude(status, headers));
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// The exact byte sequence fed to the hash. Exposed so verifiers and tests
/// can assert on the wire contract itself rather than just on digests.
pub fn canonical_bytes(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Vec<u8> {
    let mut out = canonical_prelude(status, headers);
    out.extend_from_slice(body);
    out
}

/// Render a header name in canonical MIME case: the first letter and each
/// letter following a `-` uppercased, the rest lowercased. Names containing
/// a byte that is not a valid header token are returned untouched.
pub fn canonical_name(name: &str) -> String {
    if name.bytes().any(|b| !is_token_byte(b)) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for b in name.bytes() {
        let b = if upper {
            b.to_ascii_uppercase()
        } else {
            b.to_ascii_lowercase()
        };
        out.push(b as char);
        upper = b == b'-';
    }
    out
}

// Valid header field-name bytes per RFC 7230 token.
const fn is_token_byte(b: u8) -> bool {
    matches!(b,
        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9'
        | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~')
}

/// Everything before the body: status line, sorted header lines, the
/// synthetic `X-Checksum-Headers` line, and the blank separator line.
fn canonical_prelude(status: StatusCode, headers: &HeaderMap) -> Vec<u8> {
    let mut names: Vec<(String, &HeaderName)> = headers
        .keys()
        .map(|name| (canonical_name(name.as_str()), name))
        .collect();
    // Byte-value order on the canonical form, not locale-aware.
    names.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = Vec::new();
    out.extend_from_slice(status.as_str().as_bytes());
    out.extend_from_slice(CRLF);

    for (canonical, name) in &names {
        out.extend_from_slice(canonical.as_bytes());
        out.extend_from_slice(COLON_SPACE);
        if let Some(value) = headers.get(*name) {
            out.extend_from_slice(value.as_bytes());
        }
        out.extend_from_slice(CRLF);
    }

    out.extend_from_slice(HEADERS_LINE_LABEL);
    for (i, (canonical, _)) in names.iter().enumerate() {
        if i > 0 {
            out.push(b';');
        }
        out.extend_from_slice(canonical.as_bytes());
    }
    out.extend_from_slice(CRLF);
    out.extend_from_slice(CRLF);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
