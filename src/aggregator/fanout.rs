//! Fan-out / fan-in executor
//!
//! Runs one task per address and joins them by draining a channel exactly
//! once per task. Slot `i` of the outcome always belongs to `AddressSet[i]`,
//! whatever order the tasks complete in. Only the joining loop writes slots.
//!
//! The join is bounded by a deadline: slots still empty when it passes are
//! reported as [`SlotError::Timeout`], and the stragglers keep running in the
//! background with their results dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

use super::dedup::{Address, AddressSet};
use crate::indexer::IndexerError;

/// Why one address has no result
#[derive(Debug, Error)]
pub enum SlotError {
    #[error(transparent)]
    Upstream(#[from] IndexerError),

    #[error("no response within {0} ms")]
    Timeout(u64),

    #[error("lookup task ended without reporting")]
    Aborted,
}

/// A failed slot and the address it belongs to
#[derive(Debug)]
pub struct SlotFailure {
    pub index: usize,
    pub address: Address,
    pub error: SlotError,
}

/// Positional results of one fan-out
#[derive(Debug)]
pub struct FanOutOutcome<T> {
    pub slots: Vec<Option<T>>,
    pub failures: Vec<SlotFailure>,
}

impl<T> FanOutOutcome<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Merge the slots into a response body, keeping the failure list
    pub fn merge<B>(self, merge: impl FnOnce(Vec<Option<T>>) -> B) -> Aggregated<B> {
        Aggregated {
            total: self.slots.len(),
            body: merge(self.slots),
            failures: self.failures,
        }
    }
}

/// Merged response body plus the per-address failures behind it
#[derive(Debug)]
pub struct Aggregated<B> {
    pub body: B,
    /// Addresses covered by the body
    pub total: usize,
    pub failures: Vec<SlotFailure>,
}

impl<B> Aggregated<B> {
    pub fn complete(body: B, total: usize) -> Self {
        Self {
            body,
            total,
            failures: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn map<C>(self, f: impl FnOnce(B) -> C) -> Aggregated<C> {
        Aggregated {
            body: f(self.body),
            total: self.total,
            failures: self.failures,
        }
    }
}

/// Concurrent per-address dispatcher
#[derive(Debug, Clone)]
pub struct FanOutExecutor {
    timeout: Duration,
    max_concurrency: Option<usize>,
}

impl FanOutExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_concurrency: None,
        }
    }

    /// Cap the number of in-flight upstream calls of one fan-out
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.filter(|n| *n > 0);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `op` for every address concurrently and join all of them
    pub async fn run<T, F, Fut>(&self, addresses: &AddressSet, op: F) -> FanOutOutcome<T>
    where
        T: Send + 'static,
        F: Fn(Address) -> Fut,
        Fut: Future<Output = Result<T, IndexerError>> + Send + 'static,
    {
        let n = addresses.len();
        let mut slots: Vec<Option<T>> = (0..n).map(|_| None).collect();
        if n == 0 {
            return FanOutOutcome {
                slots,
                failures: Vec::new(),
            };
        }

        let deadline = Instant::now() + self.timeout;
        let limiter = self.max_concurrency.map(|limit| Arc::new(Semaphore::new(limit)));

        // Capacity n: a task's send never waits, even after the join gave up
        let (tx, mut rx) = mpsc::channel::<(usize, Result<T, IndexerError>)>(n);

        for (index, address) in addresses.iter().enumerate() {
            let task = op(address.clone());
            let tx = tx.clone();
            let limiter = limiter.clone();

            tokio::spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let result = task.await;
                // Receiver is gone once the deadline passed; late results are dropped
                let _ = tx.send((index, result)).await;
            });
        }
        drop(tx);

        let mut errors: Vec<Option<SlotError>> = (0..n).map(|_| None).collect();
        let mut received = 0;
        let mut timed_out = false;

        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);

        while received < n {
            tokio::select! {
                message = rx.recv() => match message {
                    Some((index, result)) => {
                        received += 1;
                        match result {
                            Ok(value) => slots[index] = Some(value),
                            Err(e) => errors[index] = Some(SlotError::Upstream(e)),
                        }
                    }
                    // Every sender dropped before reporting: a task panicked
                    None => break,
                },
                _ = &mut expiry => {
                    timed_out = true;
                    break;
                }
            }
        }

        let timeout_ms = self.timeout.as_millis() as u64;
        let failures: Vec<SlotFailure> = slots
            .iter()
            .zip(errors)
            .enumerate()
            .filter(|(_, (slot, _))| slot.is_none())
            .map(|(index, (_, error))| SlotFailure {
                index,
                address: addresses.as_slice()[index].clone(),
                error: error.unwrap_or(if timed_out {
                    SlotError::Timeout(timeout_ms)
                } else {
                    SlotError::Aborted
                }),
            })
            .collect();

        FanOutOutcome { slots, failures }
    }
}
