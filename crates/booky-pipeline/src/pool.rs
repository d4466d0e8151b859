// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded worker pool for CPU-bound per-item work (image enhancement, chunk
// rendering). Items run on tokio's blocking threads, at most `workers` at a
// time.

use std::num::NonZeroUsize;
use std::sync::Arc;

use booky_core::{BookyError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Fans independent tasks out over blocking threads.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// A pool with `workers` slots, or one per available core when `None`.
    /// Counts beyond what a semaphore can hold are clamped.
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers
            .filter(|&n| n > 0)
            .unwrap_or_else(available_workers)
            .min(Semaphore::MAX_PERMITS);
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` on every item and return the results in input order.
    ///
    /// On the first failure (error or panic) no further queued items are
    /// started; items already running are waited for, then that first error
    /// is returned.
    pub async fn run<T, R, F>(&self, items: Vec<T>, task: F) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Result<R> + Send + Sync + 'static,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let task = Arc::clone(&task);
            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(TaskError::Skipped);
                };
                let outcome = tokio::task::spawn_blocking(move || task(item))
                    .await
                    .map_err(|err| {
                        if err.is_panic() {
                            BookyError::Worker(format!("task {index} panicked"))
                        } else {
                            BookyError::Worker(format!("task {index} was cancelled"))
                        }
                    })
                    .and_then(|result| result);
                outcome.map(|value| (index, value)).map_err(TaskError::Failed)
            });
        }

        let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<BookyError> = None;

        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => Err(TaskError::Failed(BookyError::Worker(format!("worker task failed: {err}")))),
            };
            match outcome {
                Ok((index, value)) => results[index] = Some(value),
                Err(TaskError::Skipped) => {}
                Err(TaskError::Failed(err)) => {
                    if first_error.is_none() {
                        warn!(%err, "Task failed, cancelling queued tasks");
                        semaphore.close();
                        first_error = Some(err);
                    } else {
                        debug!(%err, "Further task failure");
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        results
            .into_iter()
            .map(|slot| slot.ok_or_else(|| BookyError::Worker("task produced no result".into())))
            .collect()
    }
}

/// Why a pooled task produced no value.
enum TaskError {
    /// Never started because the pool was shut down after a failure.
    Skipped,
    Failed(BookyError),
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
