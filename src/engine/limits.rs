// src/engine/limits.rs
//
// Upload size limits and enforcement helpers.

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::WorkspaceError;

const STRICT_MAX_DIMENSION: u32 = 8192;
const STRICT_MAX_PIXELS: u64 = 40_000_000; // ~8K x 5K
const STRICT_MAX_BYTES: u64 = 32 * 1024 * 1024; // 32MB input cap
const LENIENT_MAX_PIXELS: u64 = 75_000_000; // generous but below global MAX_PIXELS
const LENIENT_MAX_BYTES: u64 = 48 * 1024 * 1024; // 48MB input cap

/// Bounds applied to every image entering the workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_dimension: u32,
    pub max_pixels: u64,
    pub max_bytes: Option<u64>,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
            max_bytes: None,
        }
    }
}

impl ImageLimits {
    pub fn strict() -> Self {
        Self {
            max_dimension: STRICT_MAX_DIMENSION,
            max_pixels: STRICT_MAX_PIXELS,
            max_bytes: Some(STRICT_MAX_BYTES),
        }
    }

    pub fn lenient() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            max_pixels: LENIENT_MAX_PIXELS,
            max_bytes: Some(LENIENT_MAX_BYTES),
        }
    }

    /// The crate-wide security limits, with no cap on encoded size.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn enforce_source_len(&self, len: usize) -> Result<(), WorkspaceError> {
        if let Some(limit) = self.max_bytes {
            let len_u64 = len as u64;
            if len_u64 > limit {
                return Err(WorkspaceError::input_too_large(len_u64, limit));
            }
        }
        Ok(())
    }

    /// Check decoded (or header-reported) dimensions against the limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), WorkspaceError> {
        let max_dimension = self.max_dimension.min(MAX_DIMENSION);
        if width > max_dimension || height > max_dimension {
            return Err(WorkspaceError::dimension_exceeds_limit(
                width.max(height),
                max_dimension,
            ));
        }
        let pixels = width as u64 * height as u64;
        let max_pixels = self.max_pixels.min(MAX_PIXELS);
        if pixels > max_pixels {
            return Err(WorkspaceError::pixel_count_exceeds_limit(pixels, max_pixels));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_global_limits() {
        let limits = ImageLimits::default();
        assert!(limits.check_dimensions(MAX_DIMENSION, 1).is_ok());
        assert!(matches!(
            limits.check_dimensions(MAX_DIMENSION + 1, 1),
            Err(WorkspaceError::DimensionExceedsLimit { .. })
        ));
    }

    #[test]
    fn strict_caps_pixels() {
        let limits = ImageLimits::strict();
        assert!(matches!(
            limits.check_dimensions(8000, 6000),
            Err(WorkspaceError::PixelCountExceedsLimit { pixels: 48_000_000, .. })
        ));
        assert!(matches!(
            limits.check_dimensions(9000, 100),
            Err(WorkspaceError::DimensionExceedsLimit { dimension: 9000, max: 8192 })
        ));
        assert!(limits.check_dimensions(6000, 6000).is_ok());
        assert!(limits.check_dimensions(4000, 3000).is_ok());
    }

    #[test]
    fn pixel_count_is_checked_separately() {
        let limits = ImageLimits {
            max_dimension: 1000,
            max_pixels: 100,
            max_bytes: None,
        };
        assert!(matches!(
            limits.check_dimensions(11, 10),
            Err(WorkspaceError::PixelCountExceedsLimit { pixels: 110, max: 100 })
        ));
    }

    #[test]
    fn source_length_cap() {
        let limits = ImageLimits::strict();
        assert!(limits.enforce_source_len(1024).is_ok());
        assert!(matches!(
            limits.enforce_source_len(STRICT_MAX_BYTES as usize + 1),
            Err(WorkspaceError::InputTooLarge { .. })
        ));
        assert!(ImageLimits::unbounded()
            .enforce_source_len(usize::MAX / 2)
            .is_ok());
    }
}
