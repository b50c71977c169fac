//! Bounded pool of tokio workers that run message callbacks.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PoolError;

pub const DEFAULT_THREAD_COUNT: usize = 10;
pub const DEFAULT_QUEUE_SIZE: usize = 1000;

/// Queue size and worker count for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub queue_size: usize,
    pub thread_count: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            thread_count: DEFAULT_THREAD_COUNT,
        }
    }
}

type Task = BoxFuture<'static, ()>;

/// Runs submitted tasks on a fixed number of workers.
///
/// `add_task` waits while the queue is full. After `shutdown` no new tasks
/// are accepted; queued tasks still run before the workers exit.
pub struct CallbackPool {
    name: String,
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl CallbackPool {
    /// Must be called from within a tokio runtime.
    pub fn new(queue_size: usize, thread_count: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Task>(queue_size.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..thread_count.max(1))
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                let worker_name = format!("{name}-{index}");
                tokio::spawn(async move {
                    loop {
                        let task = receiver.lock().await.recv().await;
                        match task {
                            Some(task) => task.await,
                            None => break,
                        }
                    }
                    debug!(worker = %worker_name, "pool worker exiting");
                })
            })
            .collect();

        Self {
            name,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    pub fn with_settings(settings: PoolSettings, name: impl Into<String>) -> Self {
        Self::new(settings.queue_size, settings.thread_count, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn add_task(&self, task: Task) -> Result<(), PoolError> {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or_else(|| PoolError::Shutdown(self.name.clone()))?;
        sender
            .send(task)
            .await
            .map_err(|_| PoolError::Shutdown(self.name.clone()))
    }

    /// Stops accepting tasks and waits for the workers to drain the queue.
    pub async fn shutdown(&self) {
        // Workers stop once every sender clone is gone.
        self.sender.lock().await.take();
        let workers: Vec<_> = self.workers.lock().await.drain(..).collect();
        for worker in workers {
            if let Err(err) = worker.await {
                warn!(pool = %self.name, "pool worker failed: {err}");
            }
        }
    }
}

impl std::fmt::Debug for CallbackPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackPool").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_tasks_run_before_shutdown_completes() {
        let pool = CallbackPool::new(4, 2, "test");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.add_task(Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_add_after_shutdown_fails() {
        let pool = CallbackPool::new(1, 1, "closed");
        pool.shutdown().await;

        let result = pool.add_task(Box::pin(async {})).await;
        assert!(matches!(result, Err(PoolError::Shutdown(name)) if name == "closed"));
    }

    #[tokio::test]
    async fn test_zero_sizes_are_clamped() {
        let pool = CallbackPool::new(0, 0, "tiny");
        let (tx, rx) = tokio::sync::oneshot::channel();
        pool.add_task(Box::pin(async move {
            let _ = tx.send(7);
        }))
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap(), 7);
        pool.shutdown().await;
    }
}
