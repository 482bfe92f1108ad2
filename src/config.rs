// src/config.rs
//
// Workspace configuration: pending-filter policy, dispatch mode, worker pool,
// result cache, and upload limits.

use crate::engine::limits::ImageLimits;
use crate::engine::pool::MAX_WORKER_THREADS;
use crate::error::WorkspaceError;

pub const ENV_POLICY: &str = "IMAGE_WORKSPACE_POLICY";
pub const ENV_DISPATCH: &str = "IMAGE_WORKSPACE_DISPATCH";
pub const ENV_THREADS: &str = "IMAGE_WORKSPACE_THREADS";

const DEFAULT_CACHE_CAPACITY: usize = 32;

/// What happens when a filter is requested while another is still pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Every request starts immediately; only the newest result is kept.
    #[default]
    LastRequestWins,
    /// Requests run one at a time in issue order; every result is kept.
    Queue,
}

impl PendingPolicy {
    pub fn parse(value: &str) -> Result<Self, WorkspaceError> {
        match value.trim().to_lowercase().as_str() {
            "latest" | "last-request-wins" | "last" => Ok(Self::LastRequestWins),
            "queue" | "sequential" => Ok(Self::Queue),
            other => Err(WorkspaceError::invalid_argument(
                "policy",
                other.to_string(),
                "Expected latest or queue",
            )),
        }
    }
}

/// Where filter computation runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dispatch {
    /// On the calling thread, before `request_filter` returns.
    Inline,
    /// On the worker pool; results are picked up by `poll`/`wait_idle`.
    #[default]
    Background,
}

impl Dispatch {
    pub fn parse(value: &str) -> Result<Self, WorkspaceError> {
        match value.trim().to_lowercase().as_str() {
            "inline" | "sync" => Ok(Self::Inline),
            "background" | "async" => Ok(Self::Background),
            other => Err(WorkspaceError::invalid_argument(
                "dispatch",
                other.to_string(),
                "Expected inline or background",
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub policy: PendingPolicy,
    pub dispatch: Dispatch,
    /// Dedicated pool size; `None` shares the global pool.
    pub worker_threads: Option<usize>,
    /// Entries kept by the result cache; 0 disables caching.
    pub cache_capacity: usize,
    pub limits: ImageLimits,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            policy: PendingPolicy::default(),
            dispatch: Dispatch::default(),
            worker_threads: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            limits: ImageLimits::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Everything on the calling thread, no cache. Deterministic; used by
    /// tests and by hosts without an event loop.
    pub fn inline() -> Self {
        Self {
            dispatch: Dispatch::Inline,
            cache_capacity: 0,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: PendingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_limits(mut self, limits: ImageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Defaults overlaid with `IMAGE_WORKSPACE_*` environment variables.
    pub fn from_env() -> Result<Self, WorkspaceError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay settings from a key lookup (the environment, or a map in tests).
    pub fn overlay(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, WorkspaceError> {
        if let Some(raw) = lookup(ENV_POLICY) {
            self.policy = PendingPolicy::parse(&raw)?;
        }
        if let Some(raw) = lookup(ENV_DISPATCH) {
            self.dispatch = Dispatch::parse(&raw)?;
        }
        if let Some(raw) = lookup(ENV_THREADS) {
            let threads = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_WORKER_THREADS).contains(n))
                .ok_or_else(|| {
                    WorkspaceError::invalid_argument(
                        "worker_threads",
                        raw.clone(),
                        format!("Expected an integer between 1 and {MAX_WORKER_THREADS}"),
                    )
                })?;
            self.worker_threads = Some(threads);
        }
        Ok(self)
    }
}
