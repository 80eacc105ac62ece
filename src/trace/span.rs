//! Span lifecycle and the tracer that creates spans.
//!
//! A span moves `created → active → ended`; `ended` is terminal. Ending a
//! span twice is a caller bug and panics. A span dropped while still active
//! (an abandoned request, a cancelled future) is ended by its Drop guard so
//! no open span ever leaks, at the cost of a warning in the log.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::trace::context::{SpanId, TraceContext};
use crate::trace::export::SpanExporter;

/// Which side of a hop the span represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Handling a received request.
    Server,
    /// Initiating the downstream relay call.
    Client,
    /// Work local to the hop.
    Internal,
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(s) => write!(f, "{s}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A timestamped annotation on a span.
#[derive(Debug, Clone)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: SystemTime,
    pub attributes: Vec<(String, AttrValue)>,
}

/// Everything an exporter receives for one finished span.
#[derive(Debug, Clone)]
pub struct SpanData {
    pub service: String,
    pub name: String,
    pub kind: SpanKind,
    pub context: TraceContext,
    pub parent_span_id: Option<SpanId>,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub attributes: Vec<(String, AttrValue)>,
    pub events: Vec<SpanEvent>,
}

/// One timed, attributed unit of work within a trace.
pub struct Span {
    data: SpanData,
    exporter: Arc<dyn SpanExporter>,
    ended: bool,
}

impl Span {
    /// The context identifying this span; parents for children and carrier
    /// injection both derive from it.
    pub fn context(&self) -> &TraceContext {
        &self.data.context
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.data.attributes.push((key.into(), value.into()));
    }

    pub fn add_event(&mut self, name: impl Into<String>, attributes: Vec<(String, AttrValue)>) {
        self.data.events.push(SpanEvent {
            name: name.into(),
            timestamp: SystemTime::now(),
            attributes,
        });
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Finish the span and hand it to the exporter.
    ///
    /// # Panics
    ///
    /// Panics if the span was already ended. Every code path that opens a
    /// span must end it exactly once.
    pub fn end(&mut self) {
        assert!(!self.ended, "span '{}' ended twice", self.data.name);
        self.data.end_time = Some(SystemTime::now());
        self.ended = true;
        self.exporter.export(self.data.clone());
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if !self.ended {
            tracing::warn!(span = %self.data.name, "span dropped without end, ending it now");
            self.data.end_time = Some(SystemTime::now());
            self.ended = true;
            self.exporter.export(self.data.clone());
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("data", &self.data)
            .field("ended", &self.ended)
            .finish()
    }
}

/// Creates spans on behalf of one service instance.
///
/// Holds the service identity and the exporter capability; both are fixed at
/// construction so tests can inject a recording or no-op implementation.
pub struct Tracer {
    service: String,
    exporter: Arc<dyn SpanExporter>,
}

impl Tracer {
    pub fn new(service: impl Into<String>, exporter: Arc<dyn SpanExporter>) -> Self {
        Self {
            service: service.into(),
            exporter,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Start a span under `parent`, or as the root of a new trace when no
    /// valid parent is given.
    pub fn start_span(&self, name: &str, kind: SpanKind, parent: Option<&TraceContext>) -> Span {
        let (context, parent_span_id) = match parent {
            Some(p) if p.is_valid() => (p.child(), Some(p.span_id())),
            _ => (TraceContext::new_root(), None),
        };
        Span {
            data: SpanData {
                service: self.service.clone(),
                name: name.to_owned(),
                kind,
                context,
                parent_span_id,
                start_time: SystemTime::now(),
                end_time: None,
                attributes: Vec::new(),
                events: Vec::new(),
            },
            exporter: Arc::clone(&self.exporter),
            ended: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::export::RecordingExporter;

    fn recording_tracer() -> (Tracer, Arc<RecordingExporter>) {
        let exporter = Arc::new(RecordingExporter::new());
        let tracer = Tracer::new("test-service", exporter.clone());
        (tracer, exporter)
    }

    #[test]
    fn test_root_span_has_no_parent() {
        let (tracer, exporter) = recording_tracer();
        let mut span = tracer.start_span("root", SpanKind::Server, None);
        assert!(span.context().is_valid());
        span.end();

        let spans = exporter.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].parent_span_id, None);
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn test_child_span_links_to_parent() {
        let (tracer, exporter) = recording_tracer();
        let mut parent = tracer.start_span("parent", SpanKind::Server, None);
        let parent_ctx = parent.context().clone();
        let mut child = tracer.start_span("child", SpanKind::Internal, Some(&parent_ctx));

        assert_eq!(child.context().trace_id(), parent_ctx.trace_id());
        assert_ne!(child.context().span_id(), parent_ctx.span_id());

        child.end();
        parent.end();

        let spans = exporter.spans();
        assert_eq!(spans[0].parent_span_id, Some(parent_ctx.span_id()));
    }

    #[test]
    fn test_invalid_parent_starts_new_root() {
        use crate::trace::context::{SpanId, TraceId};

        let (tracer, _exporter) = recording_tracer();
        let invalid = TraceContext::new(TraceId::INVALID, SpanId::INVALID, 0, None);
        let mut span = tracer.start_span("root", SpanKind::Server, Some(&invalid));
        assert!(span.context().is_valid());
        assert_ne!(span.context().trace_id(), invalid.trace_id());
        span.end();
    }

    #[test]
    #[should_panic(expected = "ended twice")]
    fn test_double_end_panics() {
        let (tracer, _exporter) = recording_tracer();
        let mut span = tracer.start_span("once", SpanKind::Internal, None);
        span.end();
        span.end();
    }

    #[test]
    fn test_dropped_span_is_still_exported() {
        let (tracer, exporter) = recording_tracer();
        {
            let _span = tracer.start_span("abandoned", SpanKind::Internal, None);
        }
        let spans = exporter.spans();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn test_events_keep_order() {
        let (tracer, exporter) = recording_tracer();
        let mut span = tracer.start_span("evented", SpanKind::Internal, None);
        span.add_event("first", vec![("n".into(), 1i64.into())]);
        span.add_event("second", vec![("flag".into(), true.into())]);
        span.set_attribute("label", "value");
        span.end();

        let spans = exporter.spans();
        assert_eq!(spans[0].events.len(), 2);
        assert_eq!(spans[0].events[0].name, "first");
        assert_eq!(spans[0].events[1].name, "second");
        assert_eq!(
            spans[0].attributes[0],
            ("label".to_owned(), AttrValue::String("value".to_owned()))
        );
    }
}
