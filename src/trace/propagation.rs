//! W3C trace-context wire format.
//!
//! The `traceparent` header has four `-`-separated fields with fixed widths:
//! `version` (2 hex), `trace-id` (32 hex), `parent-id` (16 hex) and
//! `trace-flags` (2 hex), e.g.
//! `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`.
//! `tracestate` is an opaque vendor string carried alongside it.

use axum::http::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::trace::context::{SpanId, TraceContext, TraceId};

pub const TRACEPARENT: &str = "traceparent";
pub const TRACESTATE: &str = "tracestate";

const SUPPORTED_VERSION: u8 = 0;
const MAX_VERSION: u8 = 254;

/// Why a `traceparent` value could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraceParseError {
    #[error("traceparent has {0} field(s), expected at least 4")]
    MissingFields(usize),

    #[error("invalid version field")]
    Version,

    #[error("invalid trace id field")]
    TraceId,

    #[error("invalid parent id field")]
    ParentId,

    #[error("invalid trace flags field")]
    Flags,
}

/// Parse a `traceparent` value into a context.
///
/// Enforces the fixed field widths and rejects all-zero ids; trailing fields
/// after `trace-flags` are tolerated for versions above 0.
pub fn parse_traceparent(value: &str) -> Result<TraceContext, TraceParseError> {
    let parts: Vec<&str> = value.trim().split_terminator('-').collect();
    if parts.len() < 4 {
        return Err(TraceParseError::MissingFields(parts.len()));
    }

    if parts[0].len() != 2 {
        return Err(TraceParseError::Version);
    }
    let version = u8::from_str_radix(parts[0], 16).map_err(|_| TraceParseError::Version)?;
    if version > MAX_VERSION || (version == 0 && parts.len() != 4) {
        return Err(TraceParseError::Version);
    }

    if parts[1].len() != 32 {
        return Err(TraceParseError::TraceId);
    }
    let trace_id = u128::from_str_radix(parts[1], 16)
        .map(TraceId::from_u128)
        .map_err(|_| TraceParseError::TraceId)?;
    if !trace_id.is_valid() {
        return Err(TraceParseError::TraceId);
    }

    if parts[2].len() != 16 {
        return Err(TraceParseError::ParentId);
    }
    let span_id = u64::from_str_radix(parts[2], 16)
        .map(SpanId::from_u64)
        .map_err(|_| TraceParseError::ParentId)?;
    if !span_id.is_valid() {
        return Err(TraceParseError::ParentId);
    }

    if parts[3].len() != 2 {
        return Err(TraceParseError::Flags);
    }
    let flags = u8::from_str_radix(parts[3], 16).map_err(|_| TraceParseError::Flags)?;
    if version == 0 && flags > 2 {
        return Err(TraceParseError::Flags);
    }

    Ok(TraceContext::new(
        trace_id,
        span_id,
        flags & TraceContext::FLAG_SAMPLED,
        None,
    ))
}

/// Serializes trace contexts to, and reconstructs them from, the
/// `traceparent`/`tracestate` header pair.
#[derive(Debug, Default)]
pub struct TraceContextPropagator;

impl TraceContextPropagator {
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the upstream context from the carrier headers.
    ///
    /// A malformed or absent `traceparent` yields `None`; the caller starts a
    /// new root trace instead of failing the request.
    pub fn extract(&self, headers: &HeaderMap) -> Option<TraceContext> {
        let value = headers.get(TRACEPARENT)?.to_str().ok()?;
        let parsed = parse_traceparent(value).ok()?;
        let trace_state = headers
            .get(TRACESTATE)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        Some(TraceContext::new(
            parsed.trace_id(),
            parsed.span_id(),
            parsed.trace_flags(),
            trace_state,
        ))
    }

    /// Write the header pair representing `context`. Invalid contexts are
    /// not injected.
    pub fn inject(&self, context: &TraceContext, headers: &mut HeaderMap) {
        if !context.is_valid() {
            return;
        }
        let value = format!(
            "{:02x}-{}-{}-{:02x}",
            SUPPORTED_VERSION,
            context.trace_id(),
            context.span_id(),
            context.trace_flags() & TraceContext::FLAG_SAMPLED
        );
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(TRACEPARENT, value);
        }
        if let Some(state) = context.trace_state() {
            if let Ok(value) = HeaderValue::from_str(state) {
                headers.insert(TRACESTATE, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(traceparent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_str(traceparent).unwrap());
        headers
    }

    #[test]
    fn test_parse_valid_traceparent() {
        let ctx =
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01").unwrap();
        assert_eq!(
            ctx.trace_id().to_u128(),
            0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736
        );
        assert_eq!(ctx.span_id().to_u64(), 0x00f0_67aa_0ba9_02b7);
        assert!(ctx.is_sampled());

        // Not-sampled flag byte
        let ctx =
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00").unwrap();
        assert!(!ctx.is_sampled());

        // Future version with a trailing field
        let ctx = parse_traceparent(
            "02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-09-XYZxsf09",
        )
        .unwrap();
        assert!(ctx.is_sampled());
    }

    #[test]
    fn test_parse_rejects_malformed_traceparent() {
        let cases = [
            ("", TraceParseError::MissingFields(0)),
            ("00-abc-def", TraceParseError::MissingFields(3)),
            (
                "0-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                TraceParseError::Version,
            ),
            (
                "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                TraceParseError::Version,
            ),
            // version 0 must have exactly 4 fields
            (
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
                TraceParseError::Version,
            ),
            (
                "00-4bf92f3577b34da6a3ce929d0e0e47-00f067aa0ba902b7-01",
                TraceParseError::TraceId,
            ),
            (
                "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
                TraceParseError::TraceId,
            ),
            (
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902-01",
                TraceParseError::ParentId,
            ),
            (
                "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
                TraceParseError::ParentId,
            ),
            (
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-xy",
                TraceParseError::Flags,
            ),
            // flags above 2 are invalid for version 0
            (
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-09",
                TraceParseError::Flags,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_traceparent(input), Err(expected), "input: {input:?}");
        }
    }

    #[test]
    fn test_extract_absent_or_malformed_yields_none() {
        let propagator = TraceContextPropagator::new();
        assert!(propagator.extract(&HeaderMap::new()).is_none());
        assert!(propagator.extract(&headers_with("garbage")).is_none());
    }

    #[test]
    fn test_extract_carries_tracestate() {
        let propagator = TraceContextPropagator::new();
        let mut headers =
            headers_with("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");
        headers.insert(TRACESTATE, HeaderValue::from_static("vendor=opaque"));
        let ctx = propagator.extract(&headers).unwrap();
        assert_eq!(ctx.trace_state(), Some("vendor=opaque"));
    }

    #[test]
    fn test_inject_extract_round_trip() {
        let propagator = TraceContextPropagator::new();
        let ctx = TraceContext::new_root();

        let mut headers = HeaderMap::new();
        propagator.inject(&ctx, &mut headers);
        let restored = propagator.extract(&headers).unwrap();

        assert_eq!(restored.trace_id(), ctx.trace_id());
        assert_eq!(restored.span_id(), ctx.span_id());
        assert_eq!(restored.trace_flags(), ctx.trace_flags());
    }

    #[test]
    fn test_inject_skips_invalid_context() {
        let propagator = TraceContextPropagator::new();
        let ctx = TraceContext::new(TraceId::INVALID, SpanId::INVALID, 1, None);
        let mut headers = HeaderMap::new();
        propagator.inject(&ctx, &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_inject_format() {
        let propagator = TraceContextPropagator::new();
        let ctx = TraceContext::new(
            TraceId::from_u128(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736),
            SpanId::from_u64(0x00f0_67aa_0ba9_02b7),
            TraceContext::FLAG_SAMPLED,
            Some("vendor=opaque".to_owned()),
        );
        let mut headers = HeaderMap::new();
        propagator.inject(&ctx, &mut headers);
        assert_eq!(
            headers.get(TRACEPARENT).unwrap(),
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
        );
        assert_eq!(headers.get(TRACESTATE).unwrap(), "vendor=opaque");
    }
}
