// src/workspace/navigation.rs
//
// One-shot hand-off of a selected image from another view into the workspace.

use crate::engine::Image;
use parking_lot::Mutex;

/// What a navigation event carries into the workspace.
#[derive(Clone, Debug, Default)]
pub struct NavigationPayload {
    pub selected_image: Option<Image>,
}

impl NavigationPayload {
    pub fn with_image(image: Image) -> Self {
        Self {
            selected_image: Some(image),
        }
    }
}

/// Source of the image pre-selected on entry.
///
/// `take_selected_image` returns the pending image once and clears it; later
/// calls return `None` until a new navigation event delivers another.
pub trait NavigationBridge: Send + Sync {
    fn take_selected_image(&self) -> Option<Image>;
}

/// A bridge with nothing to deliver, for workspaces entered directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNavigation;

impl NavigationBridge for NoNavigation {
    fn take_selected_image(&self) -> Option<Image> {
        None
    }
}

/// In-memory navigation state shared (via `Arc`) between the view that
/// selects an image and the workspace that consumes it.
#[derive(Debug, Default)]
pub struct NavigationSlot {
    pending: Mutex<Option<Image>>,
}

impl NavigationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A navigation event. Replaces any payload not yet taken.
    pub fn deliver(&self, payload: NavigationPayload) {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            tracing::debug!(target: "image_workspace::navigation", "replacing untaken payload");
        }
        tracing::debug!(
            target: "image_workspace::navigation",
            image = payload.selected_image.as_ref().map(|i| i.id().get()),
            "delivered"
        );
        *pending = payload.selected_image;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl NavigationBridge for NavigationSlot {
    fn take_selected_image(&self) -> Option<Image> {
        let taken = self.pending.lock().take();
        if let Some(image) = &taken {
            tracing::debug!(target: "image_workspace::navigation", image = image.id().get(), "taken");
        }
        taken
    }
}

impl<B: NavigationBridge + ?Sized> NavigationBridge for std::sync::Arc<B> {
    fn take_selected_image(&self) -> Option<Image> {
        (**self).take_selected_image()
    }
}

impl<B: NavigationBridge + ?Sized> NavigationBridge for &B {
    fn take_selected_image(&self) -> Option<Image> {
        (**self).take_selected_image()
    }
}
