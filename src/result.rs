//! Instrumented exec result wrapper.

use std::sync::Arc;

use sea_orm::DbErr;

use crate::config::Options;
use crate::context::Context;
use crate::driver::ExecResult;
use crate::observe::op;

pub struct WrappedResult {
    parent: Box<dyn ExecResult>,
    ctx: Context,
    opts: Arc<Options>,
}

impl WrappedResult {
    pub(crate) fn new(parent: Box<dyn ExecResult>, ctx: Context, opts: Arc<Options>) -> Self {
        Self { parent, ctx, opts }
    }

    fn observe(&self, op: &'static str, f: impl FnOnce() -> Result<u64, DbErr>) -> Result<u64, DbErr> {
        let observation = self.opts.observation(&self.ctx, op, None, None);
        let result = f();
        if let Some(observation) = observation {
            observation.finish(&result);
        }
        result
    }
}

impl ExecResult for WrappedResult {
    fn last_insert_id(&self) -> Result<u64, DbErr> {
        self.observe(op::RES_LAST_INSERT_ID, || self.parent.last_insert_id())
    }

    fn rows_affected(&self) -> Result<u64, DbErr> {
        self.observe(op::RES_ROWS_AFFECTED, || self.parent.rows_affected())
    }
}
