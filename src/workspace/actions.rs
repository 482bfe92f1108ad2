// src/workspace/actions.rs
//
// The user-facing commands. `Workspace` owns the state, the canvas and the
// filter scheduler; every command takes `&mut self`, so commands never
// interleave.
//
// Commit order for a filter result: original still present, render (when a
// surface is attached), then store as filtered. A failure at any step leaves
// state and canvas as they were.

use crate::config::{Dispatch, WorkspaceConfig};
use crate::engine::pool::pool_for;
use crate::engine::tasks::{Completed, FilterScheduler, Verdict};
use crate::engine::{encode, CachingEngine, FilterEngine, FilterOutcome, FilterTicket, Image};
use crate::error::WorkspaceError;
use crate::ops::{FilterSpec, OutputFormat};
use crate::workspace::canvas::CanvasSurface;
use crate::workspace::navigation::NavigationBridge;
use crate::workspace::state::{WorkspaceState, WorkspaceStatus};
use crate::workspace::store::{ImageStore, SavedId};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

type ActionResult<T> = std::result::Result<T, WorkspaceError>;

pub struct Workspace {
    config: WorkspaceConfig,
    state: WorkspaceState,
    canvas: CanvasSurface,
    scheduler: FilterScheduler,
    /// Outcomes resolved while `apply_filter` waited on its own ticket, and
    /// tickets cancelled before dispatch. Handed out by the next poll.
    resolved: VecDeque<FilterOutcome>,
}

impl Workspace {
    /// Create an empty workspace and seed it from `navigation` (taken once).
    ///
    /// The seeded image is shown as soon as a surface is attached.
    pub fn mount<E, B>(config: WorkspaceConfig, engine: E, navigation: &B) -> ActionResult<Self>
    where
        E: FilterEngine + 'static,
        B: NavigationBridge + ?Sized,
    {
        let engine: Arc<dyn FilterEngine> = if config.cache_capacity > 0 {
            Arc::new(CachingEngine::new(engine, config.cache_capacity))
        } else {
            Arc::new(engine)
        };
        let pool = match config.dispatch {
            Dispatch::Background => Some(pool_for(config.worker_threads)?),
            Dispatch::Inline => None,
        };
        let scheduler = FilterScheduler::new(engine, config.policy, config.dispatch, pool);

        let mut state = WorkspaceState::new();
        if let Some(image) = navigation.take_selected_image() {
            tracing::debug!(target: "image_workspace::navigation", image = image.id().get(), "seeded from navigation");
            state.set_original(Some(image));
        }

        Ok(Self {
            config,
            state,
            canvas: CanvasSurface::new(),
            scheduler,
            resolved: VecDeque::new(),
        })
    }

    /// Leave the workspace. Pending results are dropped.
    pub fn unmount(mut self) {
        self.invalidate_pending();
        tracing::debug!(
            target: "image_workspace::state",
            pending = self.scheduler.pending(),
            status = %self.state.status(),
            "unmounted"
        );
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn status(&self) -> WorkspaceStatus {
        self.state.status()
    }

    pub fn current(&self) -> Option<&Image> {
        self.state.current()
    }

    pub fn canvas(&self) -> &CanvasSurface {
        &self.canvas
    }

    /// Filter requests issued and not yet resolved.
    pub fn is_busy(&self) -> bool {
        self.scheduler.pending() > 0
    }

    // -------------------------------------------------------------------------
    // Surface binding
    // -------------------------------------------------------------------------

    /// Attach a drawing target and show the current image on it. On failure
    /// the previous surface, if any, stays as it was.
    pub fn attach_surface(&mut self, width: u32, height: u32) -> ActionResult<()> {
        let mut canvas = CanvasSurface::new();
        canvas.attach(width, height)?;
        if let Some(current) = self.state.current() {
            canvas.render(current)?;
        }
        self.canvas = canvas;
        Ok(())
    }

    pub fn detach_surface(&mut self) {
        self.canvas.detach();
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Make `image` the new original. Any filter and any pending request is
    /// dropped.
    pub fn upload(&mut self, image: Image) -> ActionResult<()> {
        self.require_surface()?;
        self.canvas.render(&image)?;
        self.invalidate_pending();
        self.state.set_original(Some(image));
        Ok(())
    }

    /// Decode an uploaded buffer (within the configured limits) and upload it.
    pub fn upload_bytes(&mut self, bytes: &[u8], name: impl Into<String>) -> ActionResult<()> {
        self.require_surface()?;
        let image = Image::decode(bytes, name, &self.config.limits)?;
        self.upload(image)
    }

    pub fn upload_path(&mut self, path: impl AsRef<Path>) -> ActionResult<()> {
        self.require_surface()?;
        let image = Image::open(path, &self.config.limits)?;
        self.upload(image)
    }

    /// Apply `spec` to the original and show the result, blocking until this
    /// request resolves. On failure nothing changes.
    ///
    /// Outcomes of other requests that resolve meanwhile are kept for the
    /// next [`poll`](Self::poll).
    pub fn apply_filter(&mut self, spec: FilterSpec) -> ActionResult<Image> {
        let ticket = self.request_filter(spec)?;
        loop {
            let Some(completed) = self.scheduler.wait_next() else {
                return Err(WorkspaceError::internal_panic(format!(
                    "filter request {} vanished",
                    ticket.token()
                )));
            };
            let outcome = self.resolve(completed);
            if outcome.ticket() != &ticket {
                self.resolved.push_back(outcome);
                continue;
            }
            return match outcome {
                FilterOutcome::Applied { image, .. } => Ok(image),
                FilterOutcome::Failed { error, .. } => Err(error),
                FilterOutcome::Discarded { ticket } => Err(WorkspaceError::filter_failed(
                    ticket.spec().clone(),
                    "superseded before it could be applied",
                )),
            };
        }
    }

    /// Start applying `spec` to the original without waiting for it.
    pub fn request_filter(&mut self, spec: FilterSpec) -> ActionResult<FilterTicket> {
        let original = self
            .state
            .original()
            .ok_or_else(|| WorkspaceError::invalid_state("apply a filter", self.state.status().as_str()))?;
        self.require_surface()?;
        let ticket = self.scheduler.submit(original, spec);
        tracing::debug!(target: "image_workspace::tasks", token = ticket.token(), spec = %ticket.spec(), "filter requested");
        Ok(ticket)
    }

    /// Commit whatever has resolved, without blocking.
    pub fn poll(&mut self) -> Vec<FilterOutcome> {
        let mut outcomes = self.drain_resolved();
        while let Some(completed) = self.scheduler.try_next() {
            outcomes.push(self.resolve(completed));
        }
        outcomes
    }

    /// Block until no request is pending, committing results as they arrive.
    pub fn wait_idle(&mut self) -> Vec<FilterOutcome> {
        let mut outcomes = self.drain_resolved();
        while let Some(completed) = self.scheduler.wait_next() {
            outcomes.push(self.resolve(completed));
        }
        outcomes
    }

    /// Back to the unfiltered original.
    pub fn remove_filter(&mut self) -> ActionResult<()> {
        let original = self
            .state
            .original()
            .ok_or_else(|| WorkspaceError::invalid_state("remove the filter", self.state.status().as_str()))?;
        self.require_surface()?;
        self.canvas.render(original)?;
        self.invalidate_pending();
        self.state.reset();
        Ok(())
    }

    /// Drop everything and blank the surface. Works with or without a surface.
    pub fn discard_image(&mut self) {
        self.invalidate_pending();
        self.state.discard();
        self.canvas.clear();
    }

    /// Hand a snapshot of the canvas to `store`.
    pub fn save<S: ImageStore + ?Sized>(&mut self, store: &mut S) -> ActionResult<SavedId> {
        let snapshot = self.snapshot()?;
        store.store(snapshot)
    }

    /// Encode a snapshot of the canvas for download.
    pub fn export(&self, format: &OutputFormat) -> ActionResult<Vec<u8>> {
        let snapshot = self.snapshot()?;
        let bytes = encode(snapshot.pixels(), format)?;
        tracing::debug!(
            target: "image_workspace::state",
            format = format.extension(),
            len = bytes.len(),
            "exported"
        );
        Ok(bytes)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn require_surface(&self) -> ActionResult<()> {
        if self.canvas.is_attached() {
            Ok(())
        } else {
            Err(WorkspaceError::no_surface())
        }
    }

    fn snapshot(&self) -> ActionResult<Image> {
        if self.state.current().is_none() {
            return Err(WorkspaceError::nothing_to_save());
        }
        self.require_surface()?;
        self.canvas.export_current()
    }

    fn invalidate_pending(&mut self) {
        self.scheduler.invalidate();
        for ticket in self.scheduler.take_cancelled() {
            self.resolved.push_back(FilterOutcome::Discarded { ticket });
        }
    }

    fn drain_resolved(&mut self) -> Vec<FilterOutcome> {
        let mut outcomes: Vec<_> = self.resolved.drain(..).collect();
        outcomes.extend(
            self.scheduler
                .take_cancelled()
                .into_iter()
                .map(|ticket| FilterOutcome::Discarded { ticket }),
        );
        outcomes
    }

    fn resolve(&mut self, completed: Completed) -> FilterOutcome {
        let verdict = self.scheduler.judge(&completed);
        let Completed { ticket, result, .. } = completed;

        let outcome = match (verdict, result) {
            (Verdict::Stale, _) => {
                tracing::debug!(target: "image_workspace::tasks", token = ticket.token(), spec = %ticket.spec(), "dropped stale result");
                FilterOutcome::Discarded { ticket }
            }
            (Verdict::Current, Ok(image)) => match self.commit(image.clone()) {
                Ok(()) => FilterOutcome::Applied { ticket, image },
                Err(error) => {
                    tracing::warn!(target: "image_workspace::tasks", token = ticket.token(), %error, "could not commit filter result");
                    FilterOutcome::Failed { ticket, error }
                }
            },
            (Verdict::Current, Err(error)) => {
                tracing::warn!(target: "image_workspace::tasks", token = ticket.token(), spec = %ticket.spec(), %error, "filter failed");
                FilterOutcome::Failed { ticket, error }
            }
        };

        self.scheduler.dispatch_queued(self.state.original());
        outcome
    }

    fn commit(&mut self, image: Image) -> ActionResult<()> {
        if self.state.original().is_none() {
            return Err(WorkspaceError::invalid_state(
                "set a filtered image",
                self.state.status().as_str(),
            ));
        }
        // Detached: committed now, drawn by the next attach_surface.
        if self.canvas.is_attached() {
            self.canvas.render(&image)?;
        }
        self.state.set_filtered(image)
    }
}
