//! Deadline threaded through every attempt of one apply call.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline elapsed")]
pub struct DeadlineElapsed;

/// An optional point in time after which pending store calls and backoff
/// sleeps are abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline.
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn at(at: Instant) -> Self {
        Self { at: Some(at) }
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Runs `future` to completion unless the deadline passes first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, DeadlineElapsed> {
        match self.at {
            Some(at) => tokio::time::timeout_at(at, future)
                .await
                .map_err(|_| DeadlineElapsed),
            None => Ok(future.await),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<(), DeadlineElapsed> {
        if duration.is_zero() {
            return if self.is_expired() { Err(DeadlineElapsed) } else { Ok(()) };
        }
        self.run(tokio::time::sleep(duration)).await
    }
}
