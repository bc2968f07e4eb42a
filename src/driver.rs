//! The driver contract wrapped by this crate.
//!
//! A backend implements [`Driver`] (or [`Connector`]) and the per-object
//! traits below. Optional connection capabilities are exposed through the
//! `Conn::as_*` accessors, which return `None` unless the backend overrides
//! them.

use async_trait::async_trait;
use sea_orm::{AccessMode, DbErr, IsolationLevel, Value};

use crate::context::Context;

/// Opens connections by data source name.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>, DbErr>;
}

/// A context-aware connection factory bound to one data source.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>, DbErr>;
}

/// A single database connection.
#[async_trait]
pub trait Conn: Send + Sync {
    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>, DbErr>;

    async fn begin(&self) -> Result<Box<dyn Tx>, DbErr>;

    async fn close(&self) -> Result<(), DbErr>;

    fn as_execer(&self) -> Option<&dyn Execer> {
        None
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        None
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        None
    }

    fn as_begin_tx(&self) -> Option<&dyn BeginTx> {
        None
    }

    fn as_session_resetter(&self) -> Option<&dyn SessionResetter> {
        None
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        None
    }
}

/// Executes a query directly on the connection, without a prepared statement.
#[async_trait]
pub trait Execer: Send + Sync {
    async fn exec(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> Result<Box<dyn ExecResult>, DbErr>;
}

/// Runs a query directly on the connection, without a prepared statement.
#[async_trait]
pub trait Queryer: Send + Sync {
    async fn query(&self, ctx: &Context, query: &str, args: &[Value])
        -> Result<Box<dyn Rows>, DbErr>;
}

#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, ctx: &Context) -> Result<(), DbErr>;
}

/// Begins a transaction with options. The transaction is tied to `ctx`.
#[async_trait]
pub trait BeginTx: Send + Sync {
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>, DbErr>;
}

/// Resets session state before a pooled connection is reused.
#[async_trait]
pub trait SessionResetter: Send + Sync {
    async fn reset_session(&self, ctx: &Context) -> Result<(), DbErr>;
}

/// Reports whether a connection is still usable.
pub trait Validator: Send + Sync {
    fn is_valid(&self) -> bool;
}

#[async_trait]
pub trait Stmt: Send + Sync {
    async fn close(&self) -> Result<(), DbErr>;

    /// Number of placeholders, or `None` when the driver cannot tell.
    fn num_input(&self) -> Option<usize>;

    async fn exec(&self, ctx: &Context, args: &[Value]) -> Result<Box<dyn ExecResult>, DbErr>;

    async fn query(&self, ctx: &Context, args: &[Value]) -> Result<Box<dyn Rows>, DbErr>;
}

#[async_trait]
pub trait Tx: Send + Sync {
    async fn commit(&self) -> Result<(), DbErr>;

    async fn rollback(&self) -> Result<(), DbErr>;
}

/// A forward-only cursor over query results.
#[async_trait]
pub trait Rows: Send {
    fn columns(&self) -> Vec<String>;

    /// Advance to the next row. `Ok(None)` means the rows are exhausted.
    async fn next(&mut self) -> Result<Option<Vec<Value>>, DbErr>;

    async fn close(&mut self) -> Result<(), DbErr>;
}

/// Outcome of an exec.
pub trait ExecResult: Send + Sync {
    fn last_insert_id(&self) -> Result<u64, DbErr>;

    fn rows_affected(&self) -> Result<u64, DbErr>;
}

/// Transaction options passed to [`BeginTx::begin_tx`].
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub access_mode: Option<AccessMode>,
}

impl TxOptions {
    pub fn is_default(&self) -> bool {
        self.isolation_level.is_none() && self.access_mode.is_none()
    }
}
