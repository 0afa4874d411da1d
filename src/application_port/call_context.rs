use crate::application_port::AuthError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-call cancellation and deadline.
///
/// Every collaborator call made by the auth service goes through [`CallContext::run`],
/// so a dropped client or an elapsed deadline surfaces as [`AuthError::Canceled`] or
/// [`AuthError::DeadlineExceeded`] rather than a generic failure.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        CallContext {
            cancel,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Never cancelled, no deadline.
    pub fn background() -> Self {
        CallContext {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn check(&self) -> Result<(), AuthError> {
        if self.cancel.is_cancelled() {
            return Err(AuthError::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(AuthError::DeadlineExceeded);
        }
        Ok(())
    }

    pub async fn run<F, T>(&self, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AuthError::Canceled),
            _ = expired(self.deadline) => Err(AuthError::DeadlineExceeded),
            res = fut => res,
        }
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
