//! Submit-only background work

use std::future::Future;
use tokio_util::task::TaskTracker;

/// Background task queue with no result channel
///
/// Tasks run on the ambient tokio runtime. [`BackgroundQueue::drain`] lets a
/// short-lived process wait for outstanding work before exiting.
#[derive(Debug, Clone, Default)]
pub struct BackgroundQueue {
    tracker: TaskTracker,
}

impl BackgroundQueue {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    pub fn submit<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = tokio::spawn(task);
        self.tracker.spawn(async move {
            if let Err(e) = inner.await {
                tracing::error!(task = label, error = %e, "background task aborted");
            }
        });
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Close the queue and wait for every submitted task
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
