//! Instrumented row cursor wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DbErr, Value};

use crate::config::Options;
use crate::context::Context;
use crate::driver::Rows;
use crate::observe::op;
use crate::timeout::TimeoutScope;

/// Rows from an instrumented query.
///
/// Holds the query's timeout scope, so the bound covers iteration and ends
/// when the rows are closed or dropped.
pub struct WrappedRows {
    parent: Box<dyn Rows>,
    scope: TimeoutScope,
    ctx: Context,
    opts: Arc<Options>,
}

impl WrappedRows {
    pub(crate) fn new(
        parent: Box<dyn Rows>,
        scope: TimeoutScope,
        ctx: Context,
        opts: Arc<Options>,
    ) -> Self {
        Self {
            parent,
            scope,
            ctx,
            opts,
        }
    }
}

#[async_trait]
impl Rows for WrappedRows {
    fn columns(&self) -> Vec<String> {
        self.parent.columns()
    }

    async fn next(&mut self) -> Result<Option<Vec<Value>>, DbErr> {
        let Some(observation) = self.opts.observation(&self.ctx, op::ROWS_NEXT, None, None)
        else {
            return self.parent.next().await;
        };

        let result = self.parent.next().await;
        // End of rows closes the span but is not logged.
        match &result {
            Ok(None) => observation.finish_quietly(),
            _ => observation.finish(&result),
        }
        result
    }

    async fn close(&mut self) -> Result<(), DbErr> {
        let result = self.parent.close().await;
        self.scope.release();
        result
    }
}
