//! Logging and tracing around a single driver operation.

use std::future::Future;
use std::time::{Duration, Instant};

use sea_orm::{DbErr, Value};
use tracing::Instrument;

use crate::args::render_args;
use crate::config::Options;
use crate::context::{Context, ContextError};
use crate::logger::LogRecord;
use crate::tracer::Span;

/// Operation names used for exclusion, span names and log records.
pub mod op {
    pub const CONNECTOR_CONNECT: &str = "sql-connector-connect";
    pub const PREPARE: &str = "sql-prepare";
    pub const CONN_EXEC: &str = "sql-conn-exec";
    pub const CONN_QUERY: &str = "sql-conn-query";
    pub const STMT_EXEC: &str = "sql-stmt-exec";
    pub const STMT_QUERY: &str = "sql-stmt-query";
    pub const STMT_CLOSE: &str = "sql-stmt-close";
    pub const TX_BEGIN: &str = "sql-tx-begin";
    pub const TX_COMMIT: &str = "sql-tx-commit";
    pub const TX_ROLLBACK: &str = "sql-tx-rollback";
    pub const RES_LAST_INSERT_ID: &str = "sql-res-lastInsertId";
    pub const RES_ROWS_AFFECTED: &str = "sql-res-rowsAffected";
    pub const ROWS_NEXT: &str = "sql-rows-next";
    pub const PING: &str = "sql-ping";
    pub const DUMMY_PING: &str = "sql-dummy-ping";
}

const COMPONENT: &str = "instrumented_sql";

/// An in-flight instrumented operation.
///
/// Dropping it before completion, for example when the caller abandons the
/// delegated future, finishes the span and logs the operation as canceled.
pub(crate) struct Observation<'a> {
    opts: &'a Options,
    ctx: &'a Context,
    op: &'static str,
    query: Option<&'a str>,
    args: Option<String>,
    span: Option<Box<dyn Span>>,
    start: Instant,
    done: bool,
}

impl Options {
    /// Start instrumenting `op`, or `None` when it is excluded.
    pub(crate) fn observation<'a>(
        &'a self,
        ctx: &'a Context,
        op: &'static str,
        query: Option<&'a str>,
        args: Option<&[Value]>,
    ) -> Option<Observation<'a>> {
        if self.has_op_excluded(op) {
            return None;
        }

        let args = match args {
            Some(args) if !self.omit_args => Some(render_args(args)),
            _ => None,
        };

        let span = self.tracer.as_ref().map(|tracer| {
            let mut span = tracer.start_span(ctx, op);
            span.set_label("component", COMPONENT);
            if let Some(query) = query {
                span.set_label("query", query);
            }
            if let Some(args) = &args {
                span.set_label("args", args);
            }
            span
        });

        Some(Observation {
            opts: self,
            ctx,
            op,
            query,
            args,
            span,
            start: Instant::now(),
            done: false,
        })
    }

    /// Run `fut` inside the instrumentation for `op`.
    pub(crate) async fn observe<T, F>(
        &self,
        ctx: &Context,
        op: &'static str,
        query: Option<&str>,
        args: Option<&[Value]>,
        fut: F,
    ) -> Result<T, DbErr>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        let Some(observation) = self.observation(ctx, op, query, args) else {
            return fut.await;
        };

        let result = match observation.tracing_span() {
            Some(span) => fut.instrument(span).await,
            None => fut.await,
        };
        observation.finish(&result);
        result
    }

    /// Log an operation that did no work, such as a ping on a backend that
    /// cannot ping.
    pub(crate) fn log_noop(&self, ctx: &Context, op: &'static str) {
        if self.has_op_excluded(op) {
            return;
        }
        if let Some(logger) = &self.logger {
            let record = LogRecord {
                op,
                query: None,
                args: None,
                duration: Duration::ZERO,
                error: None,
            };
            logger.log(ctx, &record);
        }
    }
}

impl Observation<'_> {
    pub(crate) fn tracing_span(&self) -> Option<tracing::Span> {
        self.span
            .as_ref()
            .and_then(|span| span.tracing_span())
            .cloned()
    }

    /// Close the span and log the outcome.
    pub(crate) fn finish<T>(mut self, result: &Result<T, DbErr>) {
        self.complete(result.as_ref().err(), true);
    }

    /// Close the span without logging.
    pub(crate) fn finish_quietly(mut self) {
        self.complete(None, false);
    }

    fn complete(&mut self, error: Option<&DbErr>, log: bool) {
        self.done = true;
        let duration = self.start.elapsed();

        if let Some(mut span) = self.span.take() {
            if let Some(e) = error {
                span.set_error(e);
            }
            span.finish();
        }

        if !log {
            return;
        }
        if let Some(logger) = &self.opts.logger {
            let record = LogRecord {
                op: self.op,
                query: self.query,
                args: self.args.as_deref(),
                duration,
                error,
            };
            logger.log(self.ctx, &record);
        }
    }
}

impl Drop for Observation<'_> {
    fn drop(&mut self) {
        if !self.done {
            let err: DbErr = ContextError::Canceled.into();
            self.complete(Some(&err), true);
        }
    }
}
