use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{self, Id};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

use crate::handler::Handler;
use crate::level::Level;
use crate::record::{Record, Source};
use crate::value::{Attr, Value};

/// `tracing_subscriber` layer that renders events through a [`Handler`].
///
/// Spans map onto the handler's context: entering a span derives a child
/// handler from the parent span's (or the root) by opening a group named
/// after the span and binding the span's fields. Events inside the span are
/// then written with that context, their own fields as per-call attributes
/// and the `message` field as the message.
///
/// Level filtering asks the handler on every event, so a runtime change of
/// a [`LevelVar`](crate::LevelVar) threshold takes effect immediately.
pub struct TextLayer {
    handler: Handler,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events the destination refused.
    pub failed_writes: Arc<AtomicU64>,
}

/// Handler stored in each span's extensions.
struct SpanHandler(Handler);

impl TextLayer {
    pub fn new(handler: Handler) -> Self {
        TextLayer {
            handler,
            total_events: Arc::new(AtomicU64::new(0)),
            failed_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

fn span_handler<S>(span: &SpanRef<'_, S>) -> Option<Handler>
where
    S: for<'lookup> LookupSpan<'lookup>,
{
    span.extensions().get::<SpanHandler>().map(|h| h.0.clone())
}

impl<S> Layer<S> for TextLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The threshold may move at runtime, so never let tracing cache a verdict.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        metadata.is_span() || self.handler.enabled(Level::from(*metadata.level()))
    }

    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let parent = span
            .parent()
            .and_then(|parent| span_handler(&parent))
            .unwrap_or_else(|| self.handler.clone());

        let mut fields = Vec::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor {
            attrs: &mut fields,
            message: &mut message,
        });
        if let Some(message) = message {
            fields.insert(0, Attr::new("message", message));
        }

        let handler = parent.with_group(span.name()).with_attrs(fields);
        span.extensions_mut().insert(SpanHandler(handler));
    }

    fn on_record(&self, id: &Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let Some(current) = span_handler(&span) else {
            return;
        };

        let mut fields = Vec::new();
        let mut message = None;
        values.record(&mut FieldVisitor {
            attrs: &mut fields,
            message: &mut message,
        });
        if let Some(message) = message {
            fields.insert(0, Attr::new("message", message));
        }
        if fields.is_empty() {
            return;
        }

        span.extensions_mut()
            .replace(SpanHandler(current.with_attrs(fields)));
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        let level = Level::from(*meta.level());
        if !self.handler.enabled(level) {
            return;
        }

        let handler = ctx
            .event_span(event)
            .and_then(|span| span_handler(&span))
            .unwrap_or_else(|| self.handler.clone());

        let mut fields = Vec::new();
        let mut message: Option<String> = None;
        event.record(&mut FieldVisitor {
            attrs: &mut fields,
            message: &mut message,
        });

        let mut record = Record::new(level, message.as_deref().unwrap_or_default())
            .with_attrs(&fields);
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_source(Source::new(file, line));
        }

        if let Err(e) = handler.handle(&record) {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            eprintln!("text log layer: {}", e);
        }
    }
}

/// Collects tracing fields as attributes, pulling out `message`.
pub struct FieldVisitor<'a> {
    pub attrs: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl FieldVisitor<'_> {
    fn push(&mut self, field: &Field, value: Value) {
        self.attrs.push(Attr {
            key: Cow::Borrowed(field.name()),
            value,
        });
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::from(format!("{:?}", value)));
        }
    }
}
