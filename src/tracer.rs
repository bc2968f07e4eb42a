//! Tracing capability: a span around each instrumented operation.

use std::time::Instant;

use sea_orm::DbErr;
use tracing::field;

use crate::context::Context;

/// Opens a span for an operation, keyed by the ambient context.
pub trait Tracer: Send + Sync {
    fn start_span(&self, ctx: &Context, op: &str) -> Box<dyn Span>;
}

/// A started span. The instrumentation always calls [`Span::finish`] exactly once.
pub trait Span: Send {
    fn set_label(&mut self, key: &str, value: &str);

    fn set_error(&mut self, err: &DbErr);

    fn finish(self: Box<Self>);

    /// The `tracing` span the delegated call should run inside, if any.
    fn tracing_span(&self) -> Option<&tracing::Span> {
        None
    }
}

macro_rules! db_span {
    ($($parent:expr)?; $op:expr) => {
        tracing::info_span!(
            target: "instrumented_sql",
            $(parent: $parent,)?
            "db.operation",
            otel.name = %$op,
            db.operation = %$op,
            component = field::Empty,
            db.statement = field::Empty,
            db.args = field::Empty,
            db.duration_ms = field::Empty,
            otel.status_code = field::Empty,
            error.message = field::Empty,
        )
    };
}

/// Tracer backed by `tracing` spans with OpenTelemetry-style attributes.
///
/// Spans become children of [`Context::span`] when the context carries one,
/// otherwise of the current `tracing` span, so driver spans nest under
/// request spans from web framework middleware.
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `db.operation` | Operation name, e.g. `sql-conn-query` |
/// | `db.statement` | Query text, when the operation has one |
/// | `db.args` | Rendered arguments, unless omitted |
/// | `db.duration_ms` | Wall time of the operation |
/// | `otel.status_code` | "OK" or "ERROR" |
/// | `error.message` | Error details (on failure) |
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanTracer;

impl Tracer for SpanTracer {
    fn start_span(&self, ctx: &Context, op: &str) -> Box<dyn Span> {
        let span = match ctx.span() {
            Some(parent) => db_span!(parent; op),
            None => db_span!(; op),
        };

        Box::new(TracingSpan {
            span,
            start: Instant::now(),
            failed: false,
        })
    }
}

struct TracingSpan {
    span: tracing::Span,
    start: Instant,
    failed: bool,
}

impl Span for TracingSpan {
    fn set_label(&mut self, key: &str, value: &str) {
        match key {
            "component" => self.span.record("component", value),
            "query" => self.span.record("db.statement", value),
            "args" => self.span.record("db.args", value),
            _ => &self.span,
        };
    }

    fn set_error(&mut self, err: &DbErr) {
        self.failed = true;
        self.span.record("otel.status_code", "ERROR");
        self.span.record("error.message", err.to_string().as_str());
    }

    fn finish(self: Box<Self>) {
        let duration_ms = self.start.elapsed().as_millis() as i64;
        self.span.record("db.duration_ms", duration_ms);
        if !self.failed {
            self.span.record("otel.status_code", "OK");
        }
    }

    fn tracing_span(&self) -> Option<&tracing::Span> {
        Some(&self.span)
    }
}
