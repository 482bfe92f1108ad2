// src/engine/pool.rs
//
// Worker pool management for background filter computation.
//
// Workspaces share one lazily-built global pool unless the config asks for a
// dedicated thread count. The global pool reserves one core for the host's UI
// thread so filter work never starves the event loop.
//
// **IMPORTANT**:
// - Pool is initialized lazily on first use
// - Changes to the environment after initialization have NO effect

use crate::error::WorkspaceError;
use rayon::ThreadPool;
use std::sync::{Arc, OnceLock};

/// Maximum threads a dedicated pool may request
pub const MAX_WORKER_THREADS: usize = 256;

/// Minimum number of worker threads to ensure at least some parallelism
const MIN_WORKER_THREADS: usize = 1;

/// Cores left to the host's UI thread
const UI_THREAD_RESERVE: usize = 1;

static GLOBAL_THREAD_POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();

fn thread_name(index: usize) -> String {
    format!("image-workspace-filter-{index}")
}

/// Threads for the shared pool: available cores minus the UI reserve.
pub fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKER_THREADS)
        .saturating_sub(UI_THREAD_RESERVE)
        .max(MIN_WORKER_THREADS)
}

/// The shared pool, built on first use.
pub fn get_pool() -> Result<Arc<ThreadPool>, WorkspaceError> {
    if let Some(pool) = GLOBAL_THREAD_POOL.get() {
        return Ok(pool.clone());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(default_worker_threads())
        .thread_name(thread_name)
        .build()
        .or_else(|e| {
            tracing::warn!(target: "image_workspace::pool", error = %e, "falling back to a single worker thread");
            rayon::ThreadPoolBuilder::new()
                .num_threads(MIN_WORKER_THREADS)
                .thread_name(thread_name)
                .build()
        })
        .map_err(|e| WorkspaceError::internal_panic(format!("failed to create filter pool: {e}")))?;
    // A racing caller may have won; everyone shares the stored pool.
    Ok(GLOBAL_THREAD_POOL.get_or_init(|| Arc::new(pool)).clone())
}

/// Build a pool with exactly `threads` workers.
pub fn build_pool(threads: usize) -> Result<Arc<ThreadPool>, WorkspaceError> {
    if threads == 0 || threads > MAX_WORKER_THREADS {
        return Err(WorkspaceError::invalid_argument(
            "worker_threads",
            threads.to_string(),
            format!("must be between 1 and {MAX_WORKER_THREADS}"),
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(thread_name)
        .build()
        .map(Arc::new)
        .map_err(|e| WorkspaceError::internal_panic(format!("failed to build filter pool: {e}")))
}

/// Shared pool for `None`, a dedicated one otherwise.
pub fn pool_for(threads: Option<usize>) -> Result<Arc<ThreadPool>, WorkspaceError> {
    match threads {
        Some(n) => build_pool(n),
        None => get_pool(),
    }
}
