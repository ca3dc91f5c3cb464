//! Tracking of fire-and-forget work.
//!
//! Background cache writes and revalidation fetches never block the
//! response, but the worker still owns them so callers can wait for them
//! to finish with [`BackgroundTasks::settle`].

use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinSet;

#[derive(Debug, Default)]
pub struct BackgroundTasks {
    set: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task on the current runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Number of tasks not yet reaped.
    pub fn pending(&self) -> usize {
        self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Wait until every spawned task, including ones spawned meanwhile, is done.
    pub async fn settle(&self) {
        loop {
            let mut set = {
                let mut guard = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                std::mem::take(&mut *guard)
            };
            if set.is_empty() {
                return;
            }
            while let Some(result) = set.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background task failed");
                }
            }
        }
    }
}
