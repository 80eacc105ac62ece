//! Cross-cutting observability concerns. Span export lives with the trace
//! core; this module owns log initialization.

pub mod logging;
