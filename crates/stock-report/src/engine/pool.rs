//! Bounded spawner for async work

use crate::error::{ReportError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// Semaphore-bounded pool of tokio tasks
///
/// At most `size` spawned futures run at once; the rest wait for a permit.
/// After [`shutdown`](Self::shutdown) waiting and newly spawned work resolves
/// to [`ReportError::Orchestration`] without running.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(name: &'static str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name,
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn spawn<F>(&self, work: F) -> JoinHandle<Result<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let name = self.name;
        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| ReportError::Orchestration(format!("{name} pool is shut down")))?;
            Ok(work.await)
        })
    }

    /// Stop handing out permits; running work is not interrupted
    pub fn shutdown(&self) {
        debug!(pool = self.name, "Shutting down worker pool");
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}
