//! Scriptable backend and recording sinks shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use instrumented_sql::{
    BeginTx, Capabilities, Conn, Connector, Context, ContextError, Driver, ExecResult, Execer,
    LogRecord, Logger, Pinger, Queryer, Rows, SessionResetter, Span, Stmt, Tracer, Tx, TxOptions,
    Validator,
};
use sea_orm::{DbErr, Value};

/// One call observed by the backend.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub deadline: Option<Instant>,
}

/// Shared state behind every mock object.
#[derive(Default)]
pub struct Backend {
    pub caps: Capabilities,
    /// Capability calls fail with `DbErr::Custom(fail_with)`.
    pub fail_with: Option<String>,
    /// Capability calls take this long unless their context is done first.
    pub delay: Duration,
    pub valid: bool,
    pub calls: Mutex<Vec<Call>>,
    pub cancellations: AtomicUsize,
    pub rows_ctx: Mutex<Option<Context>>,
}

impl Backend {
    pub fn with_caps(caps: Capabilities) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    pub fn all_caps() -> Capabilities {
        Capabilities {
            execer: true,
            queryer: true,
            pinger: true,
            begin_tx: true,
            session_resetter: true,
            validator: true,
        }
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.name.clone()).collect()
    }

    pub fn last_call(&self, name: &str) -> Option<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.name == name)
            .cloned()
    }

    fn record(&self, name: &str, ctx: Option<&Context>) {
        self.calls.lock().unwrap().push(Call {
            name: name.to_string(),
            deadline: ctx.and_then(|ctx| ctx.deadline()),
        });
    }

    async fn work(&self, name: &str, ctx: &Context) -> Result<(), DbErr> {
        self.record(name, Some(ctx));

        if !self.delay.is_zero() {
            tokio::select! {
                _ = ctx.done() => {
                    self.cancellations.fetch_add(1, Ordering::SeqCst);
                    return Err(ctx.err().unwrap_or(ContextError::Canceled).into());
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        match &self.fail_with {
            Some(msg) => Err(DbErr::Custom(msg.clone())),
            None => Ok(()),
        }
    }
}

pub struct MockDriver(pub Arc<Backend>);

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, _name: &str) -> Result<Box<dyn Conn>, DbErr> {
        self.0.record("open", None);
        Ok(Box::new(MockConn(self.0.clone())))
    }
}

pub struct MockConnector(pub Arc<Backend>);

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>, DbErr> {
        self.0.work("connect", ctx).await?;
        Ok(Box::new(MockConn(self.0.clone())))
    }
}

pub struct MockConn(pub Arc<Backend>);

#[async_trait]
impl Conn for MockConn {
    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>, DbErr> {
        self.0.work("prepare", ctx).await?;
        Ok(Box::new(MockStmt {
            backend: self.0.clone(),
            inputs: query.matches('?').count(),
        }))
    }

    async fn begin(&self) -> Result<Box<dyn Tx>, DbErr> {
        self.0.record("begin", None);
        Ok(Box::new(MockTx(self.0.clone())))
    }

    async fn close(&self) -> Result<(), DbErr> {
        self.0.record("close", None);
        Ok(())
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        self.0.caps.execer.then_some(self as &dyn Execer)
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        self.0.caps.queryer.then_some(self as &dyn Queryer)
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        self.0.caps.pinger.then_some(self as &dyn Pinger)
    }

    fn as_begin_tx(&self) -> Option<&dyn BeginTx> {
        self.0.caps.begin_tx.then_some(self as &dyn BeginTx)
    }

    fn as_session_resetter(&self) -> Option<&dyn SessionResetter> {
        self.0.caps.session_resetter.then_some(self as &dyn SessionResetter)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        self.0.caps.validator.then_some(self as &dyn Validator)
    }
}

#[async_trait]
impl Execer for MockConn {
    async fn exec(
        &self,
        ctx: &Context,
        _query: &str,
        _args: &[Value],
    ) -> Result<Box<dyn ExecResult>, DbErr> {
        self.0.work("exec", ctx).await?;
        Ok(Box::new(MockResult))
    }
}

#[async_trait]
impl Queryer for MockConn {
    async fn query(
        &self,
        ctx: &Context,
        _query: &str,
        _args: &[Value],
    ) -> Result<Box<dyn Rows>, DbErr> {
        self.0.work("query", ctx).await?;
        *self.0.rows_ctx.lock().unwrap() = Some(ctx.clone());
        Ok(Box::new(MockRows::two()))
    }
}

#[async_trait]
impl Pinger for MockConn {
    async fn ping(&self, ctx: &Context) -> Result<(), DbErr> {
        self.0.work("ping", ctx).await
    }
}

#[async_trait]
impl BeginTx for MockConn {
    async fn begin_tx(&self, ctx: &Context, _opts: &TxOptions) -> Result<Box<dyn Tx>, DbErr> {
        self.0.work("begin_tx", ctx).await?;
        Ok(Box::new(MockTx(self.0.clone())))
    }
}

#[async_trait]
impl SessionResetter for MockConn {
    async fn reset_session(&self, ctx: &Context) -> Result<(), DbErr> {
        self.0.work("reset_session", ctx).await
    }
}

impl Validator for MockConn {
    fn is_valid(&self) -> bool {
        self.0.record("is_valid", None);
        self.0.valid
    }
}

pub struct MockStmt {
    backend: Arc<Backend>,
    inputs: usize,
}

#[async_trait]
impl Stmt for MockStmt {
    async fn close(&self) -> Result<(), DbErr> {
        self.backend.record("stmt_close", None);
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        Some(self.inputs)
    }

    async fn exec(&self, ctx: &Context, _args: &[Value]) -> Result<Box<dyn ExecResult>, DbErr> {
        self.backend.work("stmt_exec", ctx).await?;
        Ok(Box::new(MockResult))
    }

    async fn query(&self, ctx: &Context, _args: &[Value]) -> Result<Box<dyn Rows>, DbErr> {
        self.backend.work("stmt_query", ctx).await?;
        *self.backend.rows_ctx.lock().unwrap() = Some(ctx.clone());
        Ok(Box::new(MockRows::two()))
    }
}

pub struct MockTx(pub Arc<Backend>);

#[async_trait]
impl Tx for MockTx {
    async fn commit(&self) -> Result<(), DbErr> {
        self.0.record("commit", None);
        match &self.0.fail_with {
            Some(msg) => Err(DbErr::Custom(msg.clone())),
            None => Ok(()),
        }
    }

    async fn rollback(&self) -> Result<(), DbErr> {
        self.0.record("rollback", None);
        Ok(())
    }
}

pub struct MockResult;

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> Result<u64, DbErr> {
        Ok(7)
    }

    fn rows_affected(&self) -> Result<u64, DbErr> {
        Ok(1)
    }
}

pub struct MockRows {
    rows: Vec<Vec<Value>>,
}

impl MockRows {
    fn two() -> Self {
        Self {
            rows: vec![
                vec![Value::Int(Some(1)), Value::from("alice")],
                vec![Value::Int(Some(2)), Value::from("bob")],
            ],
        }
    }
}

#[async_trait]
impl Rows for MockRows {
    fn columns(&self) -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    async fn next(&mut self) -> Result<Option<Vec<Value>>, DbErr> {
        if self.rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.rows.remove(0)))
        }
    }

    async fn close(&mut self) -> Result<(), DbErr> {
        self.rows.clear();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Logged {
    pub op: String,
    pub query: Option<String>,
    pub args: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Traced {
    pub op: String,
    pub labels: Vec<(String, String)>,
    pub error: Option<String>,
    pub finished: bool,
}

impl Traced {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logger and tracer that keep everything they receive.
#[derive(Default)]
pub struct Recorder {
    pub logs: Mutex<Vec<Logged>>,
    pub spans: Arc<Mutex<Vec<Traced>>>,
}

impl Recorder {
    pub fn logged_ops(&self) -> Vec<String> {
        self.logs.lock().unwrap().iter().map(|l| l.op.clone()).collect()
    }

    pub fn traced_ops(&self) -> Vec<String> {
        self.spans.lock().unwrap().iter().map(|s| s.op.clone()).collect()
    }
}

impl Logger for Recorder {
    fn log(&self, _ctx: &Context, record: &LogRecord<'_>) {
        self.logs.lock().unwrap().push(Logged {
            op: record.op.to_string(),
            query: record.query.map(str::to_string),
            args: record.args.map(str::to_string),
            error: record.error.map(|e| e.to_string()),
        });
    }
}

impl Tracer for Recorder {
    fn start_span(&self, _ctx: &Context, op: &str) -> Box<dyn Span> {
        let mut spans = self.spans.lock().unwrap();
        spans.push(Traced {
            op: op.to_string(),
            ..Traced::default()
        });
        Box::new(RecordedSpan {
            spans: self.spans.clone(),
            index: spans.len() - 1,
        })
    }
}

struct RecordedSpan {
    spans: Arc<Mutex<Vec<Traced>>>,
    index: usize,
}

impl Span for RecordedSpan {
    fn set_label(&mut self, key: &str, value: &str) {
        self.spans.lock().unwrap()[self.index]
            .labels
            .push((key.to_string(), value.to_string()));
    }

    fn set_error(&mut self, err: &DbErr) {
        self.spans.lock().unwrap()[self.index].error = Some(err.to_string());
    }

    fn finish(self: Box<Self>) {
        self.spans.lock().unwrap()[self.index].finished = true;
    }
}
