//! Instrumentation policy shared by every wrapped driver object.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::logger::{Logger, TracingLogger};
use crate::tracer::{SpanTracer, Tracer};

/// Supplies the timeout for one driver call. `Duration::ZERO` skips the bound.
pub type TimeoutFunc = Arc<dyn Fn() -> Duration + Send + Sync>;

/// A single configuration mutator.
///
/// Mutators are applied in order by [`Options::apply`]; a later mutator
/// overrides an earlier one touching the same field.
#[derive(Clone)]
pub enum Opt {
    /// Set the logger invoked after each instrumented operation.
    Logger(Arc<dyn Logger>),
    /// Set the tracer that opens a span around each instrumented operation.
    Tracer(Arc<dyn Tracer>),
    /// Replace the excluded operation set with exactly these names.
    OpsExcluded(Vec<String>),
    /// Redact query arguments from log records and span labels.
    OmitArgs,
    /// Include query arguments again. This is the default.
    IncludeArgs,
    /// Bound every context-aware call except `begin_tx` by the returned duration.
    TimeoutFunc(TimeoutFunc),
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opt::Logger(_) => f.write_str("Logger(..)"),
            Opt::Tracer(_) => f.write_str("Tracer(..)"),
            Opt::OpsExcluded(ops) => f.debug_tuple("OpsExcluded").field(ops).finish(),
            Opt::OmitArgs => f.write_str("OmitArgs"),
            Opt::IncludeArgs => f.write_str("IncludeArgs"),
            Opt::TimeoutFunc(_) => f.write_str("TimeoutFunc(..)"),
        }
    }
}

/// Configuration options for a wrapped driver.
///
/// Built once per wrapped backend and then shared read-only, behind an `Arc`,
/// by every connection, statement, transaction and row set derived from it.
///
/// # Example
///
/// ```rust
/// use instrumented_sql::Options;
/// use std::time::Duration;
///
/// let opts = Options::default()
///     .with_ops_excluded(["sql-rows-next"])
///     .with_omit_args()
///     .with_timeout_func(|| Duration::from_secs(5));
///
/// assert!(opts.has_op_excluded("sql-rows-next"));
/// assert!(opts.omit_args);
/// ```
#[derive(Clone, Default)]
pub struct Options {
    pub logger: Option<Arc<dyn Logger>>,
    pub tracer: Option<Arc<dyn Tracer>>,
    pub ops_excluded: HashSet<String>,
    /// Default: `false`
    pub omit_args: bool,
    /// Default: `None` (no timeout enforced)
    pub timeout_func: Option<TimeoutFunc>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("logger", &self.logger.is_some())
            .field("tracer", &self.tracer.is_some())
            .field("ops_excluded", &self.ops_excluded)
            .field("omit_args", &self.omit_args)
            .field("timeout_func", &self.timeout_func.is_some())
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one mutator.
    pub fn apply(&mut self, opt: Opt) {
        match opt {
            Opt::Logger(logger) => self.logger = Some(logger),
            Opt::Tracer(tracer) => self.tracer = Some(tracer),
            Opt::OpsExcluded(ops) => self.ops_excluded = ops.into_iter().collect(),
            Opt::OmitArgs => self.omit_args = true,
            Opt::IncludeArgs => self.omit_args = false,
            Opt::TimeoutFunc(f) => self.timeout_func = Some(f),
        }
    }

    pub fn has_op_excluded(&self, op: &str) -> bool {
        self.ops_excluded.contains(op)
    }

    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.apply(Opt::Logger(Arc::new(logger)));
        self
    }

    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.apply(Opt::Tracer(Arc::new(tracer)));
        self
    }

    /// Exclude operations (see [`crate::op`]) from logging and tracing.
    ///
    /// Replaces any earlier exclusion list. Timeouts still apply to excluded
    /// operations.
    pub fn with_ops_excluded<I, S>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(Opt::OpsExcluded(ops.into_iter().map(Into::into).collect()));
        self
    }

    /// Omit query arguments from logs and spans.
    ///
    /// Arguments usually carry user input. Prefer this outside development.
    pub fn with_omit_args(mut self) -> Self {
        self.apply(Opt::OmitArgs);
        self
    }

    /// Include query arguments in logs and spans, overriding an earlier omit.
    pub fn with_include_args(mut self) -> Self {
        self.apply(Opt::IncludeArgs);
        self
    }

    /// Set a timeout on every driver operation except `BeginTx::begin_tx`.
    pub fn with_timeout_func<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        self.apply(Opt::TimeoutFunc(Arc::new(f)));
        self
    }

    /// Log and trace everything through `tracing`, arguments included.
    ///
    /// **Warning**: Do not use in production as it logs all query arguments.
    pub fn development() -> Self {
        Self::default()
            .with_logger(TracingLogger)
            .with_tracer(SpanTracer)
            .with_include_args()
    }

    /// Trace through `tracing` with arguments omitted and no per-call logging.
    pub fn production() -> Self {
        Self::default().with_tracer(SpanTracer).with_omit_args()
    }
}

impl FromIterator<Opt> for Options {
    fn from_iter<I: IntoIterator<Item = Opt>>(iter: I) -> Self {
        let mut opts = Self::default();
        opts.extend(iter);
        opts
    }
}

impl Extend<Opt> for Options {
    fn extend<I: IntoIterator<Item = Opt>>(&mut self, iter: I) {
        for opt in iter {
            self.apply(opt);
        }
    }
}
