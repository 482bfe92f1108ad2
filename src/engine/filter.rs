// src/engine/filter.rs
//
// The FilterEngine boundary: the only place pixel transformation happens.

use crate::engine::io::{Image, ImageId, Source};
use crate::engine::pipeline::{apply_filter, verify_contract};
use crate::error::WorkspaceError;
use crate::ops::FilterSpec;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Turns `(image, spec)` into a new image.
///
/// Implementations must be deterministic: the same input image and spec give
/// pixel-identical output. That is what makes [`CachingEngine`] sound.
/// Failures are reported as `WorkspaceError::FilterApplication` carrying the
/// spec. Engines run on worker threads, hence `Send + Sync`.
pub trait FilterEngine: Send + Sync {
    fn apply(&self, image: &Image, spec: &FilterSpec) -> Result<Image, WorkspaceError>;
}

/// Plain functions and closures are engines too (handy for hosts and tests).
impl<F> FilterEngine for F
where
    F: Fn(&Image, &FilterSpec) -> Result<Image, WorkspaceError> + Send + Sync,
{
    fn apply(&self, image: &Image, spec: &FilterSpec) -> Result<Image, WorkspaceError> {
        self(image, spec)
    }
}

/// Engine for the built-in [`FilterSpec`] catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEngine;

impl FilterEngine for StandardEngine {
    fn apply(&self, image: &Image, spec: &FilterSpec) -> Result<Image, WorkspaceError> {
        let out = apply_filter(image.pixels(), spec)?;
        verify_contract(spec, image.pixels(), &out)?;
        Ok(Image::new(
            out,
            Source::Filtered {
                parent: image.id(),
                spec: spec.clone(),
            },
        ))
    }
}

struct LruCache {
    capacity: usize,
    entries: HashMap<(ImageId, FilterSpec), Image>,
    order: VecDeque<(ImageId, FilterSpec)>,
}

impl LruCache {
    fn get(&mut self, key: &(ImageId, FilterSpec)) -> Option<Image> {
        let hit = self.entries.get(key)?.clone();
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
        Some(hit)
    }

    fn insert(&mut self, key: (ImageId, FilterSpec), image: Image) {
        if self.entries.insert(key.clone(), image).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// Memoizes another engine's results by `(source image, spec)`.
///
/// Re-applying a filter the user already tried (toggling between two
/// filters, say) returns the earlier result handle without recomputing.
/// Errors are never cached.
pub struct CachingEngine<E> {
    inner: E,
    cache: Mutex<LruCache>,
}

impl<E: FilterEngine> CachingEngine<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache {
                capacity,
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.order.clear();
    }
}

impl<E: FilterEngine> FilterEngine for CachingEngine<E> {
    fn apply(&self, image: &Image, spec: &FilterSpec) -> Result<Image, WorkspaceError> {
        let key = (image.id(), spec.clone());
        if let Some(hit) = self.cache.lock().get(&key) {
            tracing::trace!(target: "image_workspace::engine", image = image.id().get(), %spec, "cache hit");
            return Ok(hit);
        }
        // Compute without holding the lock; two racing misses both compute,
        // which is harmless for a deterministic engine.
        let result = self.inner.apply(image, spec)?;
        let mut cache = self.cache.lock();
        if cache.capacity > 0 {
            cache.insert(key, result.clone());
        }
        Ok(result)
    }
}
