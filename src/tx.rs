//! Instrumented transaction wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::config::Options;
use crate::context::Context;
use crate::driver::Tx;
use crate::observe::op;

pub struct WrappedTx {
    parent: Box<dyn Tx>,
    ctx: Context,
    opts: Arc<Options>,
}

impl WrappedTx {
    pub(crate) fn new(parent: Box<dyn Tx>, ctx: Context, opts: Arc<Options>) -> Self {
        Self { parent, ctx, opts }
    }
}

#[async_trait]
impl Tx for WrappedTx {
    async fn commit(&self) -> Result<(), DbErr> {
        self.opts
            .observe(&self.ctx, op::TX_COMMIT, None, None, self.parent.commit())
            .await
    }

    async fn rollback(&self) -> Result<(), DbErr> {
        self.opts
            .observe(&self.ctx, op::TX_ROLLBACK, None, None, self.parent.rollback())
            .await
    }
}
