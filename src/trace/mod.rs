//! Minimal explicit-context tracing core.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → propagation.rs (parse traceparent/tracestate)
//!     → context.rs (TraceContext, immutable; children derived)
//!     → span.rs (Tracer::start_span with an explicit parent)
//!     → export.rs (finished spans handed to the injected exporter)
//! ```
//!
//! # Design Decisions
//! - No ambient "current span": every span-creating call takes its parent
//!   context as an argument
//! - The exporter is a constructor capability, not a process global
//! - A dropped-but-unended span is ended by its Drop guard, with a warning

pub mod context;
pub mod export;
pub mod propagation;
pub mod span;

pub use context::TraceContext;
pub use export::{LogExporter, NoopExporter, RecordingExporter, SpanExporter};
pub use propagation::TraceContextPropagator;
pub use span::{AttrValue, Span, SpanKind, Tracer};
