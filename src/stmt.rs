//! Instrumented prepared statement wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DbErr, Value};

use crate::config::Options;
use crate::context::Context;
use crate::driver::{ExecResult, Rows, Stmt};
use crate::observe::op;
use crate::result::WrappedResult;
use crate::rows::WrappedRows;

pub struct WrappedStmt {
    parent: Box<dyn Stmt>,
    query: String,
    /// Context the statement was prepared under, used for `close`.
    ctx: Context,
    opts: Arc<Options>,
}

impl WrappedStmt {
    pub(crate) fn new(parent: Box<dyn Stmt>, query: String, ctx: Context, opts: Arc<Options>) -> Self {
        Self {
            parent,
            query,
            ctx,
            opts,
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl Stmt for WrappedStmt {
    async fn close(&self) -> Result<(), DbErr> {
        self.opts
            .observe(&self.ctx, op::STMT_CLOSE, None, None, self.parent.close())
            .await
    }

    fn num_input(&self) -> Option<usize> {
        self.parent.num_input()
    }

    async fn exec(&self, ctx: &Context, args: &[Value]) -> Result<Box<dyn ExecResult>, DbErr> {
        let opts = &self.opts;
        let res = opts
            .observe(ctx, op::STMT_EXEC, Some(&self.query), Some(args), async {
                let scope = opts.set_timeout(ctx);
                self.parent.exec(&scope, args).await
            })
            .await?;

        Ok(Box::new(WrappedResult::new(res, ctx.clone(), opts.clone())))
    }

    async fn query(&self, ctx: &Context, args: &[Value]) -> Result<Box<dyn Rows>, DbErr> {
        let opts = &self.opts;
        let (rows, scope) = opts
            .observe(ctx, op::STMT_QUERY, Some(&self.query), Some(args), async {
                let scope = opts.set_timeout(ctx);
                let rows = self.parent.query(&scope, args).await;
                rows.map(|rows| (rows, scope))
            })
            .await?;

        Ok(Box::new(WrappedRows::new(rows, scope, ctx.clone(), opts.clone())))
    }
}
