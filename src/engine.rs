// src/engine.rs
//
// The pixel side of the workspace:
// 1. Image handles and their provenance
// 2. Decoding uploads / encoding exports
// 3. The FilterEngine boundary and the built-in filter catalog
// 4. Scheduling filter requests on a worker pool
//
// This file is a facade that delegates to the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod decoder;
mod encoder;
mod filter;
mod io;
pub(crate) mod limits;
mod pipeline;
pub(crate) mod pool;
pub(crate) mod tasks;

pub use decoder::{apply_orientation, decode_image, detect_format, read_dimensions, read_orientation};
pub use encoder::{encode, encode_jpeg, encode_png, encode_webp};
pub use filter::{CachingEngine, FilterEngine, StandardEngine};
pub use io::{Image, ImageId, Source};
pub use limits::ImageLimits;
pub use pipeline::{
    apply_filter, calc_fit_dimensions, fast_resize_owned, verify_contract, ResizeError,
};
pub use pool::{build_pool, default_worker_threads, get_pool, MAX_WORKER_THREADS};
pub use tasks::{FilterOutcome, FilterTicket};
