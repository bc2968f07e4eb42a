//! Cancellation and deadline carrier passed to every context-aware driver call.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::DbErr;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl From<ContextError> for DbErr {
    fn from(err: ContextError) -> Self {
        DbErr::Custom(err.to_string())
    }
}

const LIVE: u8 = 0;
const RELEASED: u8 = 1;
const EXPIRED: u8 = 2;

/// An ambient context: a cancellation token, an optional deadline and an
/// optional parent span for tracers.
///
/// Cancellation is cooperative. Backends observe it through [`Context::done`],
/// [`Context::err`] or the token itself and decide how to abort.
///
/// # Example
///
/// ```rust
/// use instrumented_sql::Context;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let ctx = Context::from_token(token.clone());
/// assert!(!ctx.is_done());
///
/// token.cancel();
/// assert!(ctx.is_done());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    span: Option<tracing::Span>,
    /// Set on contexts derived with a timeout; records whichever of release or
    /// expiry cancelled the token first.
    state: Option<Arc<AtomicU8>>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled whenever `token` is.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    /// Attach the span that tracers should use as the parent of driver spans.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn span(&self) -> Option<&tracing::Span> {
        self.span.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The token is cancelled when the context is, including when a timeout
    /// scope's deadline fires.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `None` while the context is live.
    ///
    /// The first cause wins: a context released before its deadline keeps
    /// reporting `Canceled`, one that expired first keeps reporting
    /// `DeadlineExceeded`.
    pub fn err(&self) -> Option<ContextError> {
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);

        match self.state.as_ref().map(|s| s.load(Ordering::Acquire)) {
            Some(RELEASED) => Some(ContextError::Canceled),
            Some(EXPIRED) => Some(ContextError::DeadlineExceeded),
            _ if expired => Some(ContextError::DeadlineExceeded),
            _ if self.token.is_cancelled() => Some(ContextError::Canceled),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Derive a child context bounded by `timeout`.
    ///
    /// The child is cancelled with its parent, and its deadline never extends
    /// past the parent's. A timeout too large to represent keeps the parent's
    /// deadline.
    pub(crate) fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(own) => Some(self.deadline.map_or(own, |parent| parent.min(own))),
            None => self.deadline,
        };

        Self {
            token: self.token.child_token(),
            deadline,
            span: self.span.clone(),
            state: Some(Arc::new(AtomicU8::new(LIVE))),
        }
    }

    /// Cancel a timeout-derived context because its scope ended.
    pub(crate) fn release(&self) {
        self.finish(RELEASED);
    }

    /// Cancel a timeout-derived context because its deadline passed.
    pub(crate) fn expire(&self) {
        self.finish(EXPIRED);
    }

    fn finish(&self, cause: u8) {
        if let Some(state) = &self.state {
            let _ = state.compare_exchange(LIVE, cause, Ordering::AcqRel, Ordering::Acquire);
            self.token.cancel();
        }
    }
}
