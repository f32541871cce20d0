//! Trip-once cancellation signal for a transfer session.

use tokio_util::sync::CancellationToken as TokioToken;

/// Cooperative stop signal owned by a single transfer session.
///
/// `cancel()` trips the flag and wakes every task awaiting
/// [`cancelled`](Self::cancelled). Tripping twice, or after the session has
/// already finished, has no further effect. The token is not `Clone`; callers
/// reach it through the session's handle.
#[derive(Debug, Default)]
pub struct CancellationToken {
    inner: TokioToken,
}

impl CancellationToken {
    /// Creates an untripped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns true once the token has been tripped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves when the token is tripped (immediately if it already is).
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }

    /// Another view of the same flag, for the session's own tasks.
    pub(crate) fn observer(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
