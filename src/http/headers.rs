//! Allowlist projection of header maps.
//!
//! Only headers a hop is allowed to forward downstream or echo back survive:
//! the trace-context pair, content negotiation, and proxy/TLS/forwarding
//! provenance. Everything else is dropped so internal infrastructure headers
//! never leak across the chain.

use axum::http::{HeaderMap, HeaderName};

/// Headers that may cross a hop boundary, and nothing else.
pub const FORWARDABLE_HEADERS: [&str; 10] = [
    "traceparent",
    "tracestate",
    "content-type",
    "x-arr-log-id",
    "x-forwarded-proto",
    "x-appservice-proto",
    "x-arr-ssl",
    "x-forwarded-tlsversion",
    "x-forwarded-for",
    "was-default-hostname",
];

/// Project `headers` onto the allowlist. Pure; allowlisted keys absent from
/// the input are simply omitted.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for name in FORWARDABLE_HEADERS {
        if let Some(value) = headers.get(name) {
            filtered.insert(HeaderName::from_static(name), value.clone());
        }
    }
    filtered
}
