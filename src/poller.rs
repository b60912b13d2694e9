// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Status Poller
//!
//! Fixed-interval retry with a hard attempt cap, used for payment and order
//! status dialogs. Every run ends in a terminal result: ready, timed out,
//! cancelled, or failed. Closing the dialog is [`PollHandle::stop`];
//! dropping the handle stops the poll as well.
//!
//! A check that errors is logged and counts as an attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::backend::OrderStatusSource;
use crate::models::OrderStatus;

/// Default interval between checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default attempt cap (three minutes at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Ready(T),
    Pending,
    /// The watched operation failed for good; stop polling.
    Failed(String),
}

/// Terminal poll failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("Gave up after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("Polling cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// Interval and attempt cap for a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPoller {
    interval: Duration,
    max_attempts: u32,
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

impl StatusPoller {
    /// `max_attempts` is at least one.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `check` every `interval` until it is ready, fails, the attempt
    /// cap is reached, or `cancel` fires.
    ///
    /// `check` receives the 1-based attempt number. The first check happens
    /// one interval after the call.
    pub async fn run<T, E, F, Fut>(&self, mut check: F, cancel: CancellationToken) -> Result<T, PollError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PollStatus<T>, E>>,
        E: Display,
    {
        for attempt in 1..=self.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                outcome = check(attempt) => outcome,
            };

            match outcome {
                Ok(PollStatus::Ready(value)) => {
                    debug!(attempt, "Poll ready");
                    return Ok(value);
                }
                Ok(PollStatus::Pending) => {}
                Ok(PollStatus::Failed(reason)) => {
                    info!(attempt, reason = %reason, "Poll reached a failed state");
                    return Err(PollError::Failed(reason));
                }
                Err(e) => warn!(attempt, error = %e, "Poll check failed"),
            }
        }

        info!(attempts = self.max_attempts, "Poll timed out");
        Err(PollError::TimedOut {
            attempts: self.max_attempts,
        })
    }

    /// Run the loop as a background task.
    pub fn spawn<T, E, F, Fut>(self, check: F) -> PollHandle<T>
    where
        F: FnMut(u32) -> Fut + Send + 'static,
        Fut: Future<Output = Result<PollStatus<T>, E>> + Send,
        E: Display + Send,
        T: Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(check, token).await });
        PollHandle {
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }
}

/// A running background poll. Dropping it cancels the poll.
#[derive(Debug)]
pub struct PollHandle<T> {
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<T, PollError>>,
}

impl<T> PollHandle<T> {
    /// Stop polling. The task finishes with [`PollError::Cancelled`].
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal result.
    ///
    /// Dropping the returned future before it resolves cancels the poll.
    pub async fn join(self) -> Result<T, PollError> {
        let Self { guard, task, .. } = self;
        let result = task
            .await
            .map_err(|e| PollError::Failed(format!("poll task aborted: {e}")))?;
        drop(guard);
        result
    }
}

/// Poll an order until it is paid.
///
/// `Failed` and `Expired` orders end the poll with [`PollError::Failed`].
pub async fn wait_for_payment<S>(
    source: &S,
    order_id: &str,
    poller: &StatusPoller,
    cancel: CancellationToken,
) -> Result<(), PollError>
where
    S: OrderStatusSource + ?Sized,
{
    poller
        .run(
            move |_| async move {
                let status = source.order_status(order_id).await?;
                Ok::<_, crate::backend::BackendError>(match status {
                    OrderStatus::Paid => PollStatus::Ready(()),
                    OrderStatus::Pending => PollStatus::Pending,
                    other => PollStatus::Failed(format!("Order {order_id} is {other:?}")),
                })
            },
            cancel,
        )
        .await
}
