//! Trace identifiers and the immutable trace context.

use std::fmt;

/// 128-bit identifier shared by every span belonging to one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    pub const INVALID: TraceId = TraceId(0);

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn to_u128(self) -> u128 {
        self.0
    }

    /// Generate a non-zero random id.
    pub fn random() -> Self {
        loop {
            let value = (u128::from(fastrand::u64(..)) << 64) | u128::from(fastrand::u64(..));
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 64-bit identifier of a single span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    pub const INVALID: SpanId = SpanId(0);

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    /// Generate a non-zero random id.
    pub fn random() -> Self {
        loop {
            let value = fastrand::u64(..);
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identifies a trace, the active span within it, sampling flags, and
/// optional vendor state.
///
/// A context is never mutated once created; passing a trace on to a child
/// span or a downstream hop always derives a new one via [`child`].
///
/// [`child`]: TraceContext::child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: u8,
    trace_state: Option<String>,
}

impl TraceContext {
    /// The only flag defined for traceparent version 0.
    pub const FLAG_SAMPLED: u8 = 0x01;

    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: u8,
        trace_state: Option<String>,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
            trace_state,
        }
    }

    /// Start a fresh, sampled trace. Used when a request arrives without a
    /// usable inbound context.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            trace_flags: Self::FLAG_SAMPLED,
            trace_state: None,
        }
    }

    /// Derive the context a child span runs under: same trace identity and
    /// flags, fresh span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
            trace_flags: self.trace_flags,
            trace_state: self.trace_state.clone(),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn trace_flags(&self) -> u8 {
        self.trace_flags
    }

    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags & Self::FLAG_SAMPLED != 0
    }

    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }
}
