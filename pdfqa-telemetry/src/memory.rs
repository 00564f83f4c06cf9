//! In-memory capture of pipeline stage spans.
//!
//! [`StageTraceLayer`] records every closed `pdfqa.*` span that carries a
//! `question.id` or `document.id` field, directly or inherited from an
//! enclosing span, into a [`SharedTraceStorage`] keyed by that id. A span
//! carrying both is stored once, under its `question.id`, so draining a
//! question's trace leaves nothing of it behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};

use serde::Serialize;
use tracing::span::{Attributes, Record};
use tracing::{Id, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Span name prefix of recorded spans.
const SPAN_PREFIX: &str = "pdfqa.";

/// Fields that identify a trace and are inherited by child spans, in
/// order of precedence.
const KEY_FIELDS: [&str; 2] = ["question.id", "document.id"];

/// One closed span.
#[derive(Debug, Clone, Serialize)]
pub struct SpanData {
    /// Span id, hex.
    #[serde(rename = "span_id")]
    pub id: String,
    /// Span name, e.g. `pdfqa.retrieve`.
    pub name: String,
    /// Parent span id, hex.
    #[serde(rename = "parent_span_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Creation order among spans seen by the same layer.
    pub sequence: u64,
    /// Wall-clock start, nanoseconds since the Unix epoch.
    pub start_time: u128,
    /// Time from creation to close, in milliseconds.
    pub duration_ms: f64,
    /// Recorded fields, including inherited key fields.
    pub attributes: HashMap<String, serde_json::Value>,
}

/// Shared storage for captured spans.
#[derive(Debug, Clone, Default)]
pub struct SharedTraceStorage {
    traces: Arc<RwLock<HashMap<String, Vec<SpanData>>>>,
}

impl SharedTraceStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans stored under `key`, in creation order.
    pub fn get_trace(&self, key: &str) -> Option<Vec<SpanData>> {
        let mut spans = self.traces.read().ok()?.get(key).cloned()?;
        spans.sort_by_key(|s| s.sequence);
        Some(spans)
    }

    /// Store `span` under `key`.
    pub fn add_span(&self, key: String, span: SpanData) {
        if let Ok(mut traces) = self.traces.write() {
            traces.entry(key).or_default().push(span);
        }
    }

    /// Keys with at least one stored span.
    pub fn keys(&self) -> Vec<String> {
        self.traces.read().map(|t| t.keys().cloned().collect()).unwrap_or_default()
    }

    /// Drop the spans stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Vec<SpanData>> {
        self.traces.write().ok()?.remove(key)
    }
}

/// A tracing layer that captures `pdfqa.*` spans in memory.
pub struct StageTraceLayer {
    storage: Arc<SharedTraceStorage>,
    next_sequence: AtomicU64,
}

impl StageTraceLayer {
    /// Create a layer writing into `storage`.
    pub fn new(storage: Arc<SharedTraceStorage>) -> Self {
        Self { storage, next_sequence: AtomicU64::new(0) }
    }
}

#[derive(Clone)]
struct SpanFields(HashMap<String, serde_json::Value>);

struct SpanTiming {
    sequence: u64,
    wall_start: u128,
    started: Instant,
}

fn unix_nanos() -> u128 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_nanos()
}

impl<S> Layer<S> for StageTraceLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };

        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.0;

        if let Some(parent) = span.parent() {
            if let Some(parent_fields) = parent.extensions().get::<SpanFields>() {
                for key in KEY_FIELDS {
                    if !fields.contains_key(key) {
                        if let Some(value) = parent_fields.0.get(key) {
                            fields.insert(key.to_string(), value.clone());
                        }
                    }
                }
            }
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(SpanTiming {
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            wall_start: unix_nanos(),
            started: Instant::now(),
        });
        extensions.insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let name = span.metadata().name();
        if !name.starts_with(SPAN_PREFIX) {
            return;
        }

        let extensions = span.extensions();
        let Some(fields) = extensions.get::<SpanFields>() else { return };
        let Some(key) = KEY_FIELDS
            .iter()
            .find_map(|key| fields.0.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        else {
            return;
        };

        let (sequence, start_time, duration_ms) = extensions
            .get::<SpanTiming>()
            .map(|t| (t.sequence, t.wall_start, t.started.elapsed().as_secs_f64() * 1000.0))
            .unwrap_or_default();

        let data = SpanData {
            id: format!("{:016x}", id.into_u64()),
            name: name.to_string(),
            parent_id: span.parent().map(|p| format!("{:016x}", p.id().into_u64())),
            sequence,
            start_time,
            duration_ms,
            attributes: fields.0.clone(),
        };
        self.storage.add_span(key, data);
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
