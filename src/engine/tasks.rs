// src/engine/tasks.rs
//
// Filter request scheduling.
//
// Each request gets a monotonically increasing token. Results travel back
// through a completion queue tagged with the token and the generation that
// was current when the request was issued. The owner commits a result only
// if it still matches:
// - the generation (nothing invalidated the source since), and
// - under LastRequestWins, the latest issued token.
//
// Everything else is dropped. Every ticket resolves exactly once.

use crate::config::{Dispatch, PendingPolicy};
use crate::engine::common::run_with_panic_policy;
use crate::engine::filter::FilterEngine;
use crate::engine::io::Image;
use crate::error::WorkspaceError;
use crate::ops::FilterSpec;
use parking_lot::{Condvar, Mutex};
use rayon::ThreadPool;
use std::collections::VecDeque;
use std::sync::Arc;

/// Receipt for a filter request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterTicket {
    token: u64,
    spec: FilterSpec,
}

impl FilterTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }
}

/// How a filter request resolved.
#[derive(Debug)]
pub enum FilterOutcome {
    /// Result committed as the workspace's filtered image.
    Applied { ticket: FilterTicket, image: Image },
    /// The engine failed; the workspace did not change.
    Failed {
        ticket: FilterTicket,
        error: WorkspaceError,
    },
    /// Superseded or invalidated before it could be committed.
    Discarded { ticket: FilterTicket },
}

impl FilterOutcome {
    pub fn ticket(&self) -> &FilterTicket {
        match self {
            Self::Applied { ticket, .. }
            | Self::Failed { ticket, .. }
            | Self::Discarded { ticket } => ticket,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded { .. })
    }
}

/// A finished computation waiting to be judged.
pub(crate) struct Completed {
    pub ticket: FilterTicket,
    pub generation: u64,
    pub result: Result<Image, WorkspaceError>,
}

/// Whether a completed result may still be committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Current,
    Stale,
}

/// Results handed back from workers, with blocking wait.
#[derive(Default)]
struct CompletionQueue {
    state: Mutex<VecDeque<Completed>>,
    cvar: Condvar,
}

impl CompletionQueue {
    fn push(&self, completed: Completed) {
        self.state.lock().push_back(completed);
        self.cvar.notify_all();
    }

    fn try_pop(&self) -> Option<Completed> {
        self.state.lock().pop_front()
    }

    fn wait_pop(&self) -> Completed {
        let mut queue = self.state.lock();
        loop {
            if let Some(completed) = queue.pop_front() {
                return completed;
            }
            self.cvar.wait(&mut queue);
        }
    }
}

pub(crate) struct FilterScheduler {
    engine: Arc<dyn FilterEngine>,
    policy: PendingPolicy,
    dispatch: Dispatch,
    pool: Option<Arc<ThreadPool>>,
    completions: Arc<CompletionQueue>,
    next_token: u64,
    latest_token: u64,
    generation: u64,
    in_flight: usize,
    queued: VecDeque<FilterTicket>,
    cancelled: Vec<FilterTicket>,
}

impl FilterScheduler {
    pub fn new(
        engine: Arc<dyn FilterEngine>,
        policy: PendingPolicy,
        dispatch: Dispatch,
        pool: Option<Arc<ThreadPool>>,
    ) -> Self {
        Self {
            engine,
            policy,
            dispatch,
            pool,
            completions: Arc::new(CompletionQueue::default()),
            next_token: 1,
            latest_token: 0,
            generation: 0,
            in_flight: 0,
            queued: VecDeque::new(),
            cancelled: Vec::new(),
        }
    }

    /// Requests dispatched or queued and not yet resolved.
    pub fn pending(&self) -> usize {
        self.in_flight + self.queued.len()
    }

    /// Issue a request against `source`.
    pub fn submit(&mut self, source: &Image, spec: FilterSpec) -> FilterTicket {
        let ticket = FilterTicket {
            token: self.next_token,
            spec,
        };
        self.next_token += 1;
        self.latest_token = ticket.token;

        if self.policy == PendingPolicy::Queue && self.in_flight > 0 {
            tracing::debug!(target: "image_workspace::tasks", token = ticket.token, spec = %ticket.spec, "queued behind in-flight request");
            self.queued.push_back(ticket.clone());
        } else {
            self.dispatch(source, ticket.clone());
        }
        ticket
    }

    /// Start the next queued request, if nothing is running.
    pub fn dispatch_queued(&mut self, source: Option<&Image>) {
        if self.in_flight > 0 {
            return;
        }
        let Some(source) = source else {
            return;
        };
        if let Some(ticket) = self.queued.pop_front() {
            self.dispatch(source, ticket);
        }
    }

    fn dispatch(&mut self, source: &Image, ticket: FilterTicket) {
        self.in_flight += 1;
        let engine = Arc::clone(&self.engine);
        let completions = Arc::clone(&self.completions);
        let generation = self.generation;
        let source = source.clone();

        let job = move || {
            let result = run_with_panic_policy("filter", || engine.apply(&source, &ticket.spec))
                .map_err(|err| match err {
                    // A panicking engine is still a failed filter, attributed to its spec.
                    WorkspaceError::InternalPanic { message } => {
                        WorkspaceError::filter_failed(ticket.spec.clone(), message)
                    }
                    other => other,
                });
            completions.push(Completed {
                ticket,
                generation,
                result,
            });
        };

        match (self.dispatch, &self.pool) {
            (Dispatch::Background, Some(pool)) => pool.spawn(job),
            _ => job(),
        }
    }

    /// Drop everything pending: in-flight results will arrive stale, queued
    /// requests never start.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if !self.queued.is_empty() {
            tracing::debug!(target: "image_workspace::tasks", count = self.queued.len(), "cancelled queued requests");
        }
        self.cancelled.extend(self.queued.drain(..));
    }

    /// Tickets cancelled before they were dispatched.
    pub fn take_cancelled(&mut self) -> Vec<FilterTicket> {
        std::mem::take(&mut self.cancelled)
    }

    pub fn try_next(&mut self) -> Option<Completed> {
        let completed = self.completions.try_pop()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completed)
    }

    /// Block until the next result arrives; `None` when nothing is in flight.
    pub fn wait_next(&mut self) -> Option<Completed> {
        if self.in_flight == 0 {
            return self.try_next();
        }
        let completed = self.completions.wait_pop();
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completed)
    }

    pub fn judge(&self, completed: &Completed) -> Verdict {
        if completed.generation != self.generation {
            return Verdict::Stale;
        }
        match self.policy {
            PendingPolicy::LastRequestWins if completed.ticket.token != self.latest_token => {
                Verdict::Stale
            }
            _ => Verdict::Current,
        }
    }
}
