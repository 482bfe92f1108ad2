// src/engine/io.rs
//
// Image handles: identity, provenance, and loading from memory or disk.

use crate::engine::decoder::decode_image;
use crate::engine::limits::ImageLimits;
use crate::error::WorkspaceError;
use crate::ops::FilterSpec;
use image::DynamicImage;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an image handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where an image came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Uploaded bytes, with the name the user picked them under
    Upload { name: String },
    /// Loaded from a file path
    File(PathBuf),
    /// Produced by applying `spec` to `parent`
    Filtered { parent: ImageId, spec: FilterSpec },
    /// Snapshot of what the canvas displayed for `of`
    CanvasExport { of: ImageId },
    /// Built in memory by the host
    Memory,
}

/// Immutable handle to decoded pixels plus metadata.
///
/// Cloning is cheap and yields the *same* image (same id, shared pixels).
/// Every transformation produces a new handle with a new id.
#[derive(Clone, Debug)]
pub struct Image {
    id: ImageId,
    source: Source,
    pixels: Arc<DynamicImage>,
}

impl Image {
    pub fn new(pixels: DynamicImage, source: Source) -> Self {
        Self::from_shared(Arc::new(pixels), source)
    }

    pub(crate) fn from_shared(pixels: Arc<DynamicImage>, source: Source) -> Self {
        Self {
            id: ImageId::next(),
            source,
            pixels,
        }
    }

    /// Wrap pixels built by the host.
    pub fn from_pixels(pixels: DynamicImage) -> Self {
        Self::new(pixels, Source::Memory)
    }

    /// Decode an uploaded buffer. EXIF orientation is applied so the image
    /// displays upright.
    pub fn decode(
        bytes: &[u8],
        name: impl Into<String>,
        limits: &ImageLimits,
    ) -> Result<Self, WorkspaceError> {
        limits.enforce_source_len(bytes.len())?;
        let pixels = decode_image(bytes, limits)?;
        Ok(Self::new(pixels, Source::Upload { name: name.into() }))
    }

    /// Decode an image file through a read-only memory map.
    pub fn open(path: impl AsRef<Path>, limits: &ImageLimits) -> Result<Self, WorkspaceError> {
        let path = path.as_ref();
        let display = path.to_string_lossy().to_string();
        let file =
            File::open(path).map_err(|e| WorkspaceError::file_read_failed(display.clone(), e))?;
        // SAFETY: the map is read-only and dropped before this function returns;
        // decoding copies every pixel out of it.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| WorkspaceError::file_read_failed(display, e))?;
        limits.enforce_source_len(mmap.len())?;
        let pixels = decode_image(&mmap, limits)?;
        Ok(Self::new(pixels, Source::File(path.to_path_buf())))
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub(crate) fn shared_pixels(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.pixels)
    }

    /// Pixel-level equality, independent of identity.
    pub fn same_pixels(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
            || (self.pixels.color() == other.pixels.color()
                && self.dimensions() == other.dimensions()
                && self.pixels.as_bytes() == other.pixels.as_bytes())
    }
}

/// Handle identity: two `Image`s are equal when they are the same image.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Image {}
