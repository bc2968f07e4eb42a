//! Logging capability invoked after each instrumented operation.

use std::time::Duration;

use sea_orm::DbErr;

use crate::context::Context;

/// One finished driver operation.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub op: &'a str,
    pub query: Option<&'a str>,
    /// `None` when there were no arguments or arguments are omitted.
    pub args: Option<&'a str>,
    pub duration: Duration,
    pub error: Option<&'a DbErr>,
}

impl LogRecord<'_> {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Receives a record for every instrumented operation that is not excluded.
///
/// Called synchronously on the caller's task; implementations must not fail.
/// Any `Fn(&Context, &LogRecord)` closure is a logger.
pub trait Logger: Send + Sync {
    fn log(&self, ctx: &Context, record: &LogRecord<'_>);
}

impl<F> Logger for F
where
    F: Fn(&Context, &LogRecord<'_>) + Send + Sync,
{
    fn log(&self, ctx: &Context, record: &LogRecord<'_>) {
        self(ctx, record)
    }
}

/// Logger that emits `tracing` events under the `instrumented_sql` target.
///
/// Successful operations log at DEBUG, failures at ERROR.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, _ctx: &Context, record: &LogRecord<'_>) {
        let duration_ms = record.duration.as_millis() as u64;

        match record.error {
            Some(e) => tracing::error!(
                target: "instrumented_sql",
                op = record.op,
                query = record.query,
                args = record.args,
                duration_ms,
                error = %e,
                "Database operation failed"
            ),
            None => tracing::debug!(
                target: "instrumented_sql",
                op = record.op,
                query = record.query,
                args = record.args,
                duration_ms,
                "Database operation"
            ),
        }
    }
}
