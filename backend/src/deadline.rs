//! Request deadlines.
//!
//! Async work is bounded with [`Deadline::run`]. Blocking work cannot be
//! interrupted, so database transactions call [`Deadline::check`] right
//! before committing and roll back once the deadline has passed.

use crate::error::AppError;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn check(&self) -> Result<(), AppError> {
        if self.is_expired() {
            Err(AppError::Timeout)
        } else {
            Ok(())
        }
    }

    /// Runs `fut` until it completes or the deadline passes, in which case the
    /// future is dropped.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout_at(tokio::time::Instant::from_std(self.at), fut)
            .await
            .map_err(|_| AppError::Timeout)?
    }
}

/// Runs a blocking closure on the blocking pool.
pub async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
}
