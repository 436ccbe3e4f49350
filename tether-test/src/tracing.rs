//! Span capture for asserting on fetch outcomes.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::Dispatch;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Captured span information.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    /// Span ID.
    pub id: u64,
    /// Span name (e.g. "tether.fetch").
    pub name: String,
    /// Field values rendered as strings.
    pub fields: Vec<(String, String)>,
}

impl CapturedSpan {
    /// Value of one field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn is_captured(name: &str) -> bool {
    name.starts_with("tether.") || name == "lifecycle_task"
}

/// Layer recording `tether.*` and `lifecycle_task` spans.
pub struct SpanCaptureLayer {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

struct FieldVisitor {
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let metadata = attrs.metadata();
        if !is_captured(metadata.name()) {
            return;
        }

        let mut visitor = FieldVisitor { fields: Vec::new() };
        attrs.record(&mut visitor);

        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedSpan {
                id: id.into_u64(),
                name: metadata.name().to_string(),
                fields: visitor.fields,
            });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span_ref) = ctx.span(id) else {
            return;
        };
        if !is_captured(span_ref.metadata().name()) {
            return;
        }

        let mut visitor = FieldVisitor { fields: Vec::new() };
        values.record(&mut visitor);

        let span_id = id.into_u64();
        let mut spans = self.spans.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(captured) = spans.iter_mut().rev().find(|s| s.id == span_id) {
            for (key, value) in visitor.fields {
                match captured.fields.iter_mut().find(|(k, _)| k == &key) {
                    Some(existing) => existing.1 = value,
                    None => captured.fields.push((key, value)),
                }
            }
        }
    }

    fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {}
}

/// Collector for captured spans.
#[derive(Clone)]
pub struct SpanCollector {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    dispatch: Dispatch,
}

impl std::fmt::Debug for SpanCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanCollector")
            .field("spans", &self.spans().len())
            .finish()
    }
}

/// Creates a collector with its own dispatch.
pub fn create_span_collector() -> SpanCollector {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let layer = SpanCaptureLayer {
        spans: spans.clone(),
    };
    let dispatch = Dispatch::new(Registry::default().with(layer));
    SpanCollector { spans, dispatch }
}

impl SpanCollector {
    /// Dispatch to run instrumented code under.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// All captured spans, oldest first.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent span with `name`.
    pub fn last(&self, name: &str) -> Option<CapturedSpan> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|s| s.name == name)
            .cloned()
    }

    /// `fetch.outcome` of the most recent intercepted fetch.
    pub fn last_fetch_outcome(&self) -> Option<String> {
        self.last("tether.fetch")
            .and_then(|span| span.field("fetch.outcome").map(String::from))
    }

    /// Forgets everything captured so far.
    pub fn clear(&self) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
