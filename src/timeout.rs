//! Per-call timeout scopes.

use std::ops::Deref;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::Options;
use crate::context::Context;

/// A context bounded by the configured timeout, released on drop.
///
/// When no timeout applies the scope hands back the ambient context and
/// releasing it does nothing. Inside a tokio runtime a timer task cancels the
/// context's token at the deadline; outside one the deadline is still
/// reported by [`Context::err`] and [`Context::done`].
#[derive(Debug)]
#[must_use = "dropping the scope releases the timeout immediately"]
pub struct TimeoutScope {
    ctx: Context,
    bounded: bool,
    timer: Option<JoinHandle<()>>,
}

impl TimeoutScope {
    fn unbounded(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            bounded: false,
            timer: None,
        }
    }

    fn bounded(ctx: &Context, timeout: Duration) -> Self {
        let ctx = ctx.with_timeout(timeout);

        let timer = ctx.deadline().and_then(|deadline| {
            let handle = tokio::runtime::Handle::try_current().ok()?;
            let expiring = ctx.clone();
            Some(handle.spawn(async move {
                tokio::time::sleep_until(deadline.into()).await;
                expiring.expire();
            }))
        });

        Self {
            ctx,
            bounded: true,
            timer,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    /// Stop the timer and cancel the derived context. Safe to call any number
    /// of times.
    pub fn release(&self) {
        if !self.bounded {
            return;
        }
        if let Some(timer) = &self.timer {
            timer.abort();
        }
        self.ctx.release();
    }
}

impl Deref for TimeoutScope {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

impl Drop for TimeoutScope {
    fn drop(&mut self) {
        self.release();
    }
}

impl Options {
    /// Derive the bounded context for one driver call.
    pub fn set_timeout(&self, ctx: &Context) -> TimeoutScope {
        if let Some(f) = &self.timeout_func {
            let timeout = f();
            if !timeout.is_zero() {
                return TimeoutScope::bounded(ctx, timeout);
            }
        }
        TimeoutScope::unbounded(ctx)
    }
}
