//! Span export seam.
//!
//! Finished spans are handed to a [`SpanExporter`] from `Span::end`. The
//! real trace backend (OTLP collector, vendor endpoint) lives behind this
//! trait as an external collaborator; the crate ships a structured-log
//! exporter, a no-op, and a recording exporter for tests.

use std::sync::Mutex;

use crate::trace::span::SpanData;

/// Receives finished spans. `export` is called inline from `Span::end`, so
/// implementations must be cheap and non-blocking.
pub trait SpanExporter: Send + Sync {
    fn export(&self, span: SpanData);
}

/// Discards every span.
#[derive(Debug, Default)]
pub struct NoopExporter;

impl SpanExporter for NoopExporter {
    fn export(&self, _span: SpanData) {}
}

/// Emits each finished span as one structured log line.
#[derive(Debug, Default)]
pub struct LogExporter;

impl SpanExporter for LogExporter {
    fn export(&self, span: SpanData) {
        let duration_us = span
            .end_time
            .and_then(|end| end.duration_since(span.start_time).ok())
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        tracing::info!(
            service = %span.service,
            span = %span.name,
            kind = ?span.kind,
            trace_id = %span.context.trace_id(),
            span_id = %span.context.span_id(),
            parent_span_id = %span
                .parent_span_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            duration_us,
            attributes = span.attributes.len(),
            events = span.events.len(),
            "span finished"
        );
    }
}

/// Buffers spans in memory for assertions.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    spans: Mutex<Vec<SpanData>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().expect("exporter lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.spans.lock().expect("exporter lock poisoned").clear();
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&self, span: SpanData) {
        self.spans.lock().expect("exporter lock poisoned").push(span);
    }
}
