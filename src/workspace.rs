// src/workspace.rs
//
// The image workspace: what the upload control, the preview, the action
// buttons and the saved-images view all share.
//
// - state:      original/filtered pair and its derived status
// - canvas:     the drawing target that shows the current image
// - navigation: one-shot hand-off of a selected image on entry
// - store:      saved images and the way back into the workspace
// - actions:    the commands tying them together

mod actions;
mod canvas;
mod navigation;
mod state;
mod store;

pub use actions::Workspace;
pub use canvas::CanvasSurface;
pub use navigation::{NavigationBridge, NavigationPayload, NavigationSlot, NoNavigation};
pub use state::{WorkspaceState, WorkspaceStatus};
pub use store::{ImageStore, MemoryStore, SavedId};
