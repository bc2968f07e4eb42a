//! # instrumented-sql
//!
//! Timeout, logging and tracing instrumentation for pluggable database drivers.
//!
//! This crate wraps every object in a driver's connection lifecycle (driver,
//! connector, connection, statement, rows, transaction, exec result) so each
//! operation can be timed, logged, traced and bounded by a timeout, without
//! touching the driver or the calling code.
//!
//! ## Features
//!
//! - **Drop-in Wrappers**: Each wrapper implements the same trait as the object it wraps
//! - **Per-call Timeouts**: A timeout function bounds every context-aware call
//! - **Capability Aware**: Optional backend capabilities (ping, session reset,
//!   transaction options, validation) are detected and delegated only when present
//! - **Pluggable Sinks**: Bring any [`Logger`] and [`Tracer`], or use the
//!   `tracing`-backed [`TracingLogger`] and [`SpanTracer`]
//! - **Argument Redaction**: Omit query arguments from logs and spans
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use instrumented_sql::prelude::*;
//! use std::time::Duration;
//!
//! let driver = MyDriver::default().instrumented_with(
//!     Options::default()
//!         .with_tracer(SpanTracer)
//!         .with_logger(TracingLogger)
//!         .with_ops_excluded([op::ROWS_NEXT])
//!         .with_omit_args()
//!         .with_timeout_func(|| Duration::from_secs(5)),
//! );
//!
//! let conn = driver.open("postgres://localhost/mydb").await?;
//! conn.as_pinger().unwrap().ping(&Context::background()).await?;
//! ```
//!
//! ## Timeouts
//!
//! The timeout function is consulted once per call. `Duration::ZERO` skips the
//! bound for that call. Transactions started through [`BeginTx::begin_tx`] are
//! tied to their context and are never bounded. Excluding an operation only
//! silences its logging and tracing; the timeout still applies.

mod args;
mod config;
mod conn;
mod context;
mod delegate;
mod driver;
mod logger;
mod observe;
mod result;
mod rows;
mod stmt;
mod timeout;
mod tracer;
mod tx;
mod wrap;

pub use args::render_args;
pub use config::{Opt, Options, TimeoutFunc};
pub use conn::{Capabilities, WrappedConn};
pub use context::{Context, ContextError};
pub use driver::{
    BeginTx, Conn, Connector, Driver, ExecResult, Execer, Pinger, Queryer, Rows, SessionResetter,
    Stmt, Tx, TxOptions, Validator,
};
pub use logger::{LogRecord, Logger, TracingLogger};
pub use observe::op;
pub use result::WrappedResult;
pub use rows::WrappedRows;
pub use stmt::WrappedStmt;
pub use timeout::TimeoutScope;
pub use tracer::{Span, SpanTracer, Tracer};
pub use tx::WrappedTx;
pub use wrap::{wrap_conn, wrap_connector, wrap_driver, InstrumentExt, WrappedConnector, WrappedDriver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        op, wrap_driver, BeginTx, Conn, Context, Driver, InstrumentExt, Opt, Options, Pinger,
        SessionResetter, SpanTracer, TracingLogger, TxOptions,
    };
}
