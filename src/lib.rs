// lib.rs
//
// image-workspace: load an image, try filters on it, compare against the
// original, and pass images between the workspace and a saved-images view.
//
// Design goals:
// - One owner for the original/filtered pair; the canvas always shows it
// - Filter work off the calling thread, with stale results never committed
// - Swappable filter engines behind a small trait
// - One-shot navigation hand-off that cannot seed a workspace twice

pub mod config;
pub mod engine;
pub mod error;
pub mod ops;
pub mod workspace;

pub use config::{Dispatch, PendingPolicy, WorkspaceConfig};
pub use engine::{
    CachingEngine, FilterEngine, FilterOutcome, FilterTicket, Image, ImageId, ImageLimits, Source,
    StandardEngine,
};
pub use error::{ErrorCategory, Result, WorkspaceError};
pub use ops::{FilterContract, FilterEffect, FilterSpec, OutputFormat};
pub use workspace::{
    CanvasSurface, ImageStore, MemoryStore, NavigationBridge, NavigationPayload, NavigationSlot,
    NoNavigation, SavedId, Workspace, WorkspaceState, WorkspaceStatus,
};
