//! Basic example showing how to use instrumented-sql.
//!
//! Run with: cargo run --example basic

use async_trait::async_trait;
use instrumented_sql::prelude::*;
use instrumented_sql::{ExecResult, Execer, Stmt, Tx};
use sea_orm::{DbErr, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A driver that accepts everything and stores nothing.
struct NullDriver;

struct NullConn;

struct NullStmt;

struct NullTx;

struct NullResult;

#[async_trait]
impl Driver for NullDriver {
    async fn open(&self, _name: &str) -> Result<Box<dyn Conn>, DbErr> {
        Ok(Box::new(NullConn))
    }
}

#[async_trait]
impl Conn for NullConn {
    async fn prepare(&self, _ctx: &Context, _query: &str) -> Result<Box<dyn Stmt>, DbErr> {
        Ok(Box::new(NullStmt))
    }

    async fn begin(&self) -> Result<Box<dyn Tx>, DbErr> {
        Ok(Box::new(NullTx))
    }

    async fn close(&self) -> Result<(), DbErr> {
        Ok(())
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        Some(self as &dyn Execer)
    }
}

#[async_trait]
impl Execer for NullConn {
    async fn exec(
        &self,
        ctx: &Context,
        _query: &str,
        _args: &[Value],
    ) -> Result<Box<dyn ExecResult>, DbErr> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        Ok(Box::new(NullResult))
    }
}

#[async_trait]
impl Stmt for NullStmt {
    async fn close(&self) -> Result<(), DbErr> {
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        None
    }

    async fn exec(&self, _ctx: &Context, _args: &[Value]) -> Result<Box<dyn ExecResult>, DbErr> {
        Ok(Box::new(NullResult))
    }

    async fn query(
        &self,
        _ctx: &Context,
        _args: &[Value],
    ) -> Result<Box<dyn instrumented_sql::Rows>, DbErr> {
        Err(DbErr::Custom("NullDriver cannot query".into()))
    }
}

#[async_trait]
impl Tx for NullTx {
    async fn commit(&self) -> Result<(), DbErr> {
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbErr> {
        Ok(())
    }
}

impl ExecResult for NullResult {
    fn last_insert_id(&self) -> Result<u64, DbErr> {
        Ok(0)
    }

    fn rows_affected(&self) -> Result<u64, DbErr> {
        Ok(0)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,instrumented_sql=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Option 1: Functional options, applied in order
    let driver = wrap_driver(
        NullDriver,
        [
            Opt::Logger(std::sync::Arc::new(TracingLogger)),
            Opt::OmitArgs,
            Opt::IncludeArgs,
        ],
    );

    // Option 2: Using the extension trait with a builder
    // let driver = NullDriver.instrumented_with(
    //     Options::default()
    //         .with_tracer(SpanTracer)
    //         .with_ops_excluded([op::ROWS_NEXT])
    //         .with_timeout_func(|| Duration::from_millis(250)),
    // );

    // Option 3: Development preset (logs and traces everything)
    // let driver = NullDriver.instrumented_with(Options::development());

    let conn = driver.open("null://").await?;
    let ctx = Context::background().with_span(tracing::info_span!("request", path = "/users"));

    if let Some(execer) = conn.as_execer() {
        execer
            .exec(&ctx, "UPDATE users SET active = ?", &[Value::Bool(Some(true))])
            .await?;
    }

    // NullDriver cannot ping, so this logs a dummy ping and succeeds.
    conn.as_pinger().expect("wrapped connections always ping").ping(&ctx).await?;

    let tx = conn
        .as_begin_tx()
        .expect("wrapped connections always begin with options")
        .begin_tx(&ctx, &TxOptions::default())
        .await?;
    tx.commit().await?;

    tracing::info!("Instrumented driver exercised");

    Ok(())
}
