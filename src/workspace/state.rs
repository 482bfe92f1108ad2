// src/workspace/state.rs
//
// The original/filtered pair every widget reads. Pure in-memory state; it
// never touches the canvas.

use crate::engine::Image;
use crate::error::WorkspaceError;
use std::fmt;

/// Derived view of [`WorkspaceState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkspaceStatus {
    Empty,
    HasOriginal,
    HasFiltered,
}

impl WorkspaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::HasOriginal => "showing the original",
            Self::HasFiltered => "showing a filtered image",
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `filtered` is only ever the product of the current `original`: replacing
/// or clearing the original always clears it.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceState {
    original: Option<Image>,
    filtered: Option<Image>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn original(&self) -> Option<&Image> {
        self.original.as_ref()
    }

    pub fn filtered(&self) -> Option<&Image> {
        self.filtered.as_ref()
    }

    /// Replace the original. Any filtered image is dropped, even when `image`
    /// is the same handle.
    pub fn set_original(&mut self, image: Option<Image>) {
        tracing::debug!(
            target: "image_workspace::state",
            image = image.as_ref().map(|i| i.id().get()),
            had_filtered = self.filtered.is_some(),
            "set original"
        );
        self.original = image;
        self.filtered = None;
    }

    pub fn set_filtered(&mut self, image: Image) -> Result<(), WorkspaceError> {
        if self.original.is_none() {
            return Err(WorkspaceError::invalid_state(
                "set a filtered image",
                self.status().as_str(),
            ));
        }
        tracing::debug!(target: "image_workspace::state", image = image.id().get(), "set filtered");
        self.filtered = Some(image);
        Ok(())
    }

    /// Drop the filtered image, keeping the original.
    pub fn reset(&mut self) {
        if self.filtered.take().is_some() {
            tracing::debug!(target: "image_workspace::state", "filter removed");
        }
    }

    pub fn discard(&mut self) {
        if self.original.is_some() {
            tracing::debug!(target: "image_workspace::state", "discarded");
        }
        self.original = None;
        self.filtered = None;
    }

    /// What gets rendered and saved: filtered if present, else original.
    pub fn current(&self) -> Option<&Image> {
        self.filtered.as_ref().or(self.original.as_ref())
    }

    pub fn status(&self) -> WorkspaceStatus {
        match (&self.original, &self.filtered) {
            (None, _) => WorkspaceStatus::Empty,
            (Some(_), None) => WorkspaceStatus::HasOriginal,
            (Some(_), Some(_)) => WorkspaceStatus::HasFiltered,
        }
    }

    /// Original next to filtered, for side-by-side preview.
    pub fn preview(&self) -> (Option<&Image>, Option<&Image>) {
        (self.original.as_ref(), self.filtered.as_ref())
    }
}
