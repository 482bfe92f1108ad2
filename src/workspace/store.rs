// src/workspace/store.rs
//
// Saved images: the persistence collaborator `save` hands snapshots to, and
// the in-memory "saved images" view that can send one back to the workspace.

use crate::engine::Image;
use crate::error::WorkspaceError;
use crate::workspace::navigation::{NavigationPayload, NavigationSlot};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier assigned by a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SavedId(u64);

impl SavedId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SavedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "saved#{}", self.0)
    }
}

pub trait ImageStore {
    fn store(&mut self, image: Image) -> Result<SavedId, WorkspaceError>;
}

/// Saved images kept in memory, in save order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: BTreeMap<SavedId, Image>,
    next_id: u64,
    max_entries: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses new images once `max_entries` are held.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn list(&self) -> impl Iterator<Item = (SavedId, &Image)> + '_ {
        self.images.iter().map(|(id, image)| (*id, image))
    }

    pub fn get(&self, id: SavedId) -> Option<&Image> {
        self.images.get(&id)
    }

    pub fn remove(&mut self, id: SavedId) -> Option<Image> {
        let removed = self.images.remove(&id);
        if removed.is_some() {
            tracing::debug!(target: "image_workspace::store", id = id.get(), "removed");
        }
        removed
    }

    /// Send a saved image to the workspace: it seeds the next mount.
    pub fn open_in_workspace(
        &self,
        id: SavedId,
        navigation: &NavigationSlot,
    ) -> Result<(), WorkspaceError> {
        let image = self.images.get(&id).ok_or_else(|| {
            WorkspaceError::invalid_argument("saved_id", id.to_string(), "no saved image with this id")
        })?;
        tracing::debug!(target: "image_workspace::store", id = id.get(), "opening in workspace");
        navigation.deliver(NavigationPayload::with_image(image.clone()));
        Ok(())
    }
}

impl ImageStore for MemoryStore {
    fn store(&mut self, image: Image) -> Result<SavedId, WorkspaceError> {
        if let Some(max) = self.max_entries {
            if self.images.len() >= max {
                return Err(WorkspaceError::store_failed(format!(
                    "store is full ({max} images)"
                )));
            }
        }
        self.next_id += 1;
        let id = SavedId(self.next_id);
        tracing::debug!(target: "image_workspace::store", id = id.get(), image = image.id().get(), "stored");
        self.images.insert(id, image);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::navigation::NavigationBridge;
    use image::{DynamicImage, RgbImage};

    fn create_test_image() -> Image {
        Image::from_pixels(DynamicImage::ImageRgb8(RgbImage::new(1, 1)))
    }

    #[test]
    fn store_list_get_remove() {
        let mut store = MemoryStore::new();
        let a = create_test_image();
        let b = create_test_image();
        let id_a = store.store(a.clone()).unwrap();
        let id_b = store.store(b.clone()).unwrap();
        assert_ne!(id_a, id_b);
        let listed: Vec<_> = store.list().map(|(id, _)| id).collect();
        assert_eq!(listed, vec![id_a, id_b]);
        assert_eq!(store.get(id_b), Some(&b));
        assert_eq!(store.remove(id_a), Some(a));
        assert_eq!(store.remove(id_a), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut store = MemoryStore::new();
        let first = store.store(create_test_image()).unwrap();
        store.remove(first);
        let second = store.store(create_test_image()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn bounded_store_rejects_overflow() {
        let mut store = MemoryStore::bounded(1);
        store.store(create_test_image()).unwrap();
        let err = store.store(create_test_image()).unwrap_err();
        assert!(matches!(err, WorkspaceError::StoreFailed { .. }));
    }

    #[test]
    fn open_in_workspace_delivers_once() {
        let mut store = MemoryStore::new();
        let img = create_test_image();
        let id = store.store(img.clone()).unwrap();
        let slot = NavigationSlot::new();
        store.open_in_workspace(id, &slot).unwrap();
        assert_eq!(slot.take_selected_image(), Some(img));
        assert_eq!(slot.take_selected_image(), None);
    }

    #[test]
    fn open_unknown_id_fails() {
        let store = MemoryStore::new();
        let slot = NavigationSlot::new();
        assert!(store.open_in_workspace(SavedId::new(7), &slot).is_err());
        assert!(!slot.has_pending());
    }
}
