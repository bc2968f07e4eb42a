//! Timeout-bounded delegation to optional backend capabilities.

use std::future::Future;

use sea_orm::DbErr;

use crate::config::Options;
use crate::context::Context;

/// Invoke an optional capability under a timeout scope.
///
/// Returns `Ok(None)` without touching the backend when `capability` is
/// absent. Otherwise the capability runs with the bounded context and its
/// result is passed through unmodified. The scope is released on every path,
/// including when the returned future is dropped mid-call.
pub(crate) async fn delegate<'a, C, T, F, Fut>(
    ctx: &Context,
    opts: &Options,
    capability: Option<&'a C>,
    invoke: F,
) -> Result<Option<T>, DbErr>
where
    C: ?Sized,
    F: FnOnce(&'a C, Context) -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let scope = opts.set_timeout(ctx);

    let Some(capability) = capability else {
        tracing::trace!(target: "instrumented_sql", "capability not implemented by backend");
        return Ok(None);
    };

    let result = invoke(capability, scope.context().clone()).await;
    drop(scope);
    result.map(Some)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::context::ContextError;

    struct Capability {
        calls: AtomicUsize,
    }

    impl Capability {
        async fn run(&self, ctx: Context) -> Result<Context, DbErr> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ctx)
        }

        async fn fail(&self, _ctx: Context) -> Result<(), DbErr> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DbErr::Custom("backend failure".into()))
        }
    }

    #[tokio::test]
    async fn test_absent_capability_is_noop_success() {
        let result = delegate(
            &Context::background(),
            &Options::default(),
            None::<&Capability>,
            |cap, ctx| cap.run(ctx),
        )
        .await;

        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_absent_capability_still_derives_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let opts = Options::default().with_timeout_func(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Duration::from_secs(1)
        });

        let result = delegate(&Context::background(), &opts, None::<&Capability>, |cap, ctx| {
            cap.run(ctx)
        })
        .await;

        assert!(matches!(result, Ok(None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_passes_through_verbatim() {
        let cap = Capability {
            calls: AtomicUsize::new(0),
        };
        let result = delegate(&Context::background(), &Options::default(), Some(&cap), |cap, ctx| {
            cap.fail(ctx)
        })
        .await;

        assert!(matches!(result, Err(DbErr::Custom(ref m)) if m == "backend failure"));
        assert_eq!(cap.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_context_is_released_after_call() {
        let cap = Capability {
            calls: AtomicUsize::new(0),
        };
        let opts = Options::default().with_timeout_func(|| Duration::from_secs(60));

        let seen = delegate(&Context::background(), &opts, Some(&cap), |cap, ctx| cap.run(ctx))
            .await
            .unwrap()
            .unwrap();

        assert!(seen.deadline().is_some());
        assert_eq!(seen.err(), Some(ContextError::Canceled));
    }
}
