//! Instrumented connection wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DbErr, Value};

use crate::config::Options;
use crate::context::Context;
use crate::delegate::delegate;
use crate::driver::{
    BeginTx, Conn, ExecResult, Execer, Pinger, Queryer, Rows, SessionResetter, Stmt, Tx,
    TxOptions, Validator,
};
use crate::observe::op;
use crate::result::WrappedResult;
use crate::rows::WrappedRows;
use crate::stmt::WrappedStmt;
use crate::tx::WrappedTx;

/// Optional capabilities the wrapped backend implements, detected once when
/// the connection is wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub execer: bool,
    pub queryer: bool,
    pub pinger: bool,
    pub begin_tx: bool,
    pub session_resetter: bool,
    pub validator: bool,
}

impl Capabilities {
    pub fn detect(conn: &dyn Conn) -> Self {
        Self {
            execer: conn.as_execer().is_some(),
            queryer: conn.as_queryer().is_some(),
            pinger: conn.as_pinger().is_some(),
            begin_tx: conn.as_begin_tx().is_some(),
            session_resetter: conn.as_session_resetter().is_some(),
            validator: conn.as_validator().is_some(),
        }
    }
}

/// An instrumented wrapper around a backend connection.
///
/// `WrappedConn` implements [`Conn`] and is a drop-in replacement for the
/// connection it wraps. It exposes [`Execer`] and [`Queryer`] only when the
/// backend does. [`Pinger`], [`BeginTx`], [`SessionResetter`] and
/// [`Validator`] are always exposed and fall back to a no-op (or a plain
/// `begin`) when the backend lacks them.
pub struct WrappedConn {
    parent: Box<dyn Conn>,
    opts: Arc<Options>,
    caps: Capabilities,
}

impl WrappedConn {
    pub fn new(parent: Box<dyn Conn>, opts: Arc<Options>) -> Self {
        let caps = Capabilities::detect(parent.as_ref());
        Self { parent, opts, caps }
    }

    /// Capabilities of the wrapped backend connection.
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn inner(&self) -> &dyn Conn {
        self.parent.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn Conn> {
        self.parent
    }
}

fn unsupported(capability: &str) -> DbErr {
    DbErr::Custom(format!("driver connection does not implement {capability}"))
}

#[async_trait]
impl Conn for WrappedConn {
    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>, DbErr> {
        let opts = &self.opts;
        let parent = self.parent.as_ref();

        let stmt = opts
            .observe(ctx, op::PREPARE, Some(query), None, async {
                let scope = opts.set_timeout(ctx);
                parent.prepare(&scope, query).await
            })
            .await?;

        Ok(Box::new(WrappedStmt::new(
            stmt,
            query.to_string(),
            ctx.clone(),
            opts.clone(),
        )))
    }

    async fn begin(&self) -> Result<Box<dyn Tx>, DbErr> {
        let ctx = Context::background();
        let tx = self
            .opts
            .observe(&ctx, op::TX_BEGIN, None, None, self.parent.begin())
            .await?;

        Ok(Box::new(WrappedTx::new(tx, ctx, self.opts.clone())))
    }

    async fn close(&self) -> Result<(), DbErr> {
        self.parent.close().await
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        self.caps.execer.then_some(self as &dyn Execer)
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        self.caps.queryer.then_some(self as &dyn Queryer)
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        Some(self as &dyn Pinger)
    }

    fn as_begin_tx(&self) -> Option<&dyn BeginTx> {
        Some(self as &dyn BeginTx)
    }

    fn as_session_resetter(&self) -> Option<&dyn SessionResetter> {
        Some(self as &dyn SessionResetter)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        Some(self as &dyn Validator)
    }
}

#[async_trait]
impl Execer for WrappedConn {
    async fn exec(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> Result<Box<dyn ExecResult>, DbErr> {
        let execer = self.parent.as_execer();

        let res = self
            .opts
            .observe(ctx, op::CONN_EXEC, Some(query), Some(args), async {
                delegate(ctx, &self.opts, execer, |execer, ctx| async move {
                    execer.exec(&ctx, query, args).await
                })
                .await
                .and_then(|res| res.ok_or_else(|| unsupported("Execer")))
            })
            .await?;

        Ok(Box::new(WrappedResult::new(res, ctx.clone(), self.opts.clone())))
    }
}

#[async_trait]
impl Queryer for WrappedConn {
    async fn query(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> Result<Box<dyn Rows>, DbErr> {
        let Some(queryer) = self.parent.as_queryer() else {
            return Err(unsupported("Queryer"));
        };

        let opts = &self.opts;
        let (rows, scope) = opts
            .observe(ctx, op::CONN_QUERY, Some(query), Some(args), async {
                let scope = opts.set_timeout(ctx);
                let rows = queryer.query(&scope, query, args).await;
                rows.map(|rows| (rows, scope))
            })
            .await?;

        Ok(Box::new(WrappedRows::new(rows, scope, ctx.clone(), opts.clone())))
    }
}

#[async_trait]
impl Pinger for WrappedConn {
    async fn ping(&self, ctx: &Context) -> Result<(), DbErr> {
        let Some(pinger) = self.parent.as_pinger() else {
            self.opts.log_noop(ctx, op::DUMMY_PING);
            return Ok(());
        };

        self.opts
            .observe(ctx, op::PING, None, None, async {
                delegate(ctx, &self.opts, Some(pinger), |pinger, ctx| async move {
                    pinger.ping(&ctx).await
                })
                .await
            })
            .await
            .map(drop)
    }
}

#[async_trait]
impl BeginTx for WrappedConn {
    /// Transactions live as long as their context, so `begin_tx` never
    /// applies the configured timeout.
    async fn begin_tx(&self, ctx: &Context, tx_opts: &TxOptions) -> Result<Box<dyn Tx>, DbErr> {
        let tx = self
            .opts
            .observe(ctx, op::TX_BEGIN, None, None, async {
                match self.parent.as_begin_tx() {
                    Some(begin_tx) => begin_tx.begin_tx(ctx, tx_opts).await,
                    None if tx_opts.is_default() => self.parent.begin().await,
                    None => Err(DbErr::Custom(
                        "driver connection does not support non-default transaction options"
                            .to_string(),
                    )),
                }
            })
            .await?;

        Ok(Box::new(WrappedTx::new(tx, ctx.clone(), self.opts.clone())))
    }
}

#[async_trait]
impl SessionResetter for WrappedConn {
    async fn reset_session(&self, ctx: &Context) -> Result<(), DbErr> {
        delegate(
            ctx,
            &self.opts,
            self.parent.as_session_resetter(),
            |resetter, ctx| async move { resetter.reset_session(&ctx).await },
        )
        .await
        .map(drop)
    }
}

impl Validator for WrappedConn {
    fn is_valid(&self) -> bool {
        self.parent
            .as_validator()
            .map_or(true, |validator| validator.is_valid())
    }
}
