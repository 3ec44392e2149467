//! Bounded-concurrency task pool.
//!
//! Every submitted unit of work is spawned immediately and then waits for a
//! semaphore permit, so `submit` never blocks the caller and excess work
//! queues inside the semaphore.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::{BenchError, Result};

/// Handle to a unit of work submitted to a `TaskPool`
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for this unit of work to finish
    pub async fn join(self) -> Result<T> {
        Ok(self.inner.await?)
    }
}

/// Worker pool that runs at most `max_concurrency` units at once
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    shut_down: AtomicBool,
}

impl TaskPool {
    /// Create a new pool. Submitting work requires a running tokio runtime.
    pub fn new(max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(BenchError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of units currently holding a slot
    pub fn running(&self) -> usize {
        self.max_concurrency - self.semaphore.available_permits()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Submit a unit of work. Fails only once the pool has been shut down.
    pub fn submit<F, T>(&self, work: F) -> Result<TaskHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_shutdown() {
            return Err(BenchError::PoolShutdown);
        }

        let semaphore = Arc::clone(&self.semaphore);
        let inner = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits
            let _permit = semaphore.acquire_owned().await.ok();
            work.await
        });

        Ok(TaskHandle { inner })
    }

    /// Wait for every handle and return the outputs in submission order
    pub async fn join_all<T>(handles: Vec<TaskHandle<T>>) -> Result<Vec<T>> {
        let outputs = futures::future::try_join_all(handles.into_iter().map(|h| h.inner)).await?;
        Ok(outputs)
    }

    /// Stop accepting work. Units submitted earlier still run to completion.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            tracing::debug!("Task pool already shut down");
            return;
        }
        tracing::debug!(
            max_concurrency = self.max_concurrency,
            running = self.running(),
            "Task pool shut down"
        );
    }
}
