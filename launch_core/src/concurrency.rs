//! Concurrency Configurator: the worker-pool width for one run.
//!
//! The bound is a dedicated rayon pool rather than the global one. Everything
//! after installation runs inside [`WorkerPool::run`], so every parallel
//! region of the simulation observes the configured width, and dropping the
//! pool releases it. Nothing process-wide is mutated; repeated launches in
//! one process each see their own width.

use crate::error::LaunchError;
use std::num::NonZeroUsize;
use tracing::info;

/// Maximum concurrency the platform reports, at least 1.
pub fn detected_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Scoped worker pool. Owned by the dispatcher for the duration of the run.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    width: usize,
}

impl WorkerPool {
    /// Build a pool of `requested` workers, or the detected maximum when `None`.
    pub fn install(requested: Option<usize>) -> Result<WorkerPool, LaunchError> {
        let width = requested.unwrap_or_else(detected_parallelism).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("mpm-worker-{i}"))
            .build()
            .map_err(|e| LaunchError::WorkerPool(e.to_string()))?;
        info!(
            width,
            requested = requested.is_some(),
            "worker pool installed"
        );
        Ok(WorkerPool { pool, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `f` with this pool as the active rayon pool.
    pub fn run<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("width", &self.width)
            .finish()
    }
}
