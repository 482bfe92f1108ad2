// src/ops.rs
//
// Filter specifications and output formats.
// These are cheap value types - the expensive work happens in a FilterEngine.

use crate::error::WorkspaceError;
use bitflags::bitflags;
use std::fmt;

/// A filter plus its parameters.
///
/// Value type: comparable and hashable so it can key a result cache.
/// Parameters are integers on purpose (no floats means `Eq`/`Hash` hold).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterSpec {
    /// Luma conversion
    Grayscale,

    /// Warm brown tone
    Sepia,

    /// Invert RGB, keep alpha
    Invert,

    /// Adjust brightness (-100 to 100)
    Brightness { value: i32 },

    /// Adjust contrast (-100 to 100)
    Contrast { value: i32 },

    /// Gaussian blur, radius in pixels (1 to 50)
    Blur { radius: u32 },

    /// Rotate hue by degrees (any value, wraps at 360)
    HueRotate { degrees: i32 },

    /// Black/white by luminance threshold (0 to 255)
    Threshold { level: u8 },

    /// Flip horizontally
    FlipH,

    /// Flip vertically
    FlipV,

    /// Rotate by 90, 180, or 270 degrees (and negatives)
    Rotate { degrees: i32 },
}

bitflags! {
    /// What a filter does to the shape of its input.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FilterEffect: u8 {
        /// Output dimensions may differ from the input
        const RESHAPES = 0b0000_0001;
        /// Output has no alpha channel
        const DROPS_ALPHA = 0b0000_0010;
    }
}

/// Static description of a filter, used to sanity-check engine output.
#[derive(Clone, Copy, Debug)]
pub struct FilterContract {
    pub name: &'static str,
    pub effects: FilterEffect,
}

impl FilterSpec {
    /// Parse a filter from its name and an optional numeric parameter.
    ///
    /// Parameterized filters fall back to a sensible default when `value` is
    /// `None`; range checks happen when the filter is applied.
    pub fn parse(name: &str, value: Option<i32>) -> Result<Self, WorkspaceError> {
        let spec = match name.to_lowercase().as_str() {
            "grayscale" | "greyscale" | "gray" | "grey" => Self::Grayscale,
            "sepia" => Self::Sepia,
            "invert" | "negative" => Self::Invert,
            "brightness" | "brighten" => Self::Brightness {
                value: value.unwrap_or(20),
            },
            "contrast" => Self::Contrast {
                value: value.unwrap_or(20),
            },
            "blur" => Self::Blur {
                radius: value.unwrap_or(2).max(0) as u32,
            },
            "hue" | "hue-rotate" | "huerotate" => Self::HueRotate {
                degrees: value.unwrap_or(90),
            },
            "threshold" => Self::Threshold {
                level: value.unwrap_or(128).clamp(0, 255) as u8,
            },
            "fliph" | "flip-h" | "mirror" => Self::FlipH,
            "flipv" | "flip-v" | "flip" => Self::FlipV,
            "rotate" => Self::Rotate {
                degrees: value.unwrap_or(90),
            },
            _ => return Err(WorkspaceError::unknown_filter(name.to_string())),
        };
        Ok(spec)
    }

    pub fn name(&self) -> &'static str {
        self.contract().name
    }

    pub fn contract(&self) -> FilterContract {
        let (name, effects) = match self {
            Self::Grayscale => ("grayscale", FilterEffect::DROPS_ALPHA),
            Self::Sepia => ("sepia", FilterEffect::empty()),
            Self::Invert => ("invert", FilterEffect::empty()),
            Self::Brightness { .. } => ("brightness", FilterEffect::empty()),
            Self::Contrast { .. } => ("contrast", FilterEffect::empty()),
            Self::Blur { .. } => ("blur", FilterEffect::empty()),
            Self::HueRotate { .. } => ("hue-rotate", FilterEffect::empty()),
            Self::Threshold { .. } => ("threshold", FilterEffect::DROPS_ALPHA),
            Self::FlipH => ("fliph", FilterEffect::empty()),
            Self::FlipV => ("flipv", FilterEffect::empty()),
            Self::Rotate { .. } => ("rotate", FilterEffect::RESHAPES),
        };
        FilterContract { name, effects }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness { value } | Self::Contrast { value } => {
                write!(f, "{}({})", self.name(), value)
            }
            Self::Blur { radius } => write!(f, "{}({})", self.name(), radius),
            Self::HueRotate { degrees } | Self::Rotate { degrees } => {
                write!(f, "{}({})", self.name(), degrees)
            }
            Self::Threshold { level } => write!(f, "{}({})", self.name(), level),
            _ => f.write_str(self.name()),
        }
    }
}

/// Output format for encoding an export
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
    /// Lossless only; the image crate has no lossy WebP encoder
    WebP,
}

impl OutputFormat {
    pub fn from_str(format: &str, quality: Option<u8>) -> Result<Self, WorkspaceError> {
        let q = quality.unwrap_or(80);
        match format.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg { quality: q }),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(WorkspaceError::invalid_argument(
                "format",
                other.to_string(),
                "Expected jpeg, png, or webp",
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_known_names() {
        assert_eq!(FilterSpec::parse("Grayscale", None).unwrap(), FilterSpec::Grayscale);
        assert_eq!(FilterSpec::parse("grey", None).unwrap(), FilterSpec::Grayscale);
        assert_eq!(
            FilterSpec::parse("brightness", Some(-30)).unwrap(),
            FilterSpec::Brightness { value: -30 }
        );
        assert_eq!(
            FilterSpec::parse("blur", None).unwrap(),
            FilterSpec::Blur { radius: 2 }
        );
        assert_eq!(
            FilterSpec::parse("threshold", Some(999)).unwrap(),
            FilterSpec::Threshold { level: 255 }
        );
    }

    #[test]
    fn output_format_extensions() {
        assert_eq!(OutputFormat::from_str("JPG", None).unwrap().extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::WebP.extension(), "webp");
    }

    #[test]
    fn parse_unknown_name_fails() {
        let err = FilterSpec::parse("vintage", None).unwrap_err();
        assert!(matches!(err, WorkspaceError::UnknownFilter { .. }));
    }

    #[test]
    fn specs_are_hashable_values() {
        let mut set = HashSet::new();
        set.insert(FilterSpec::Brightness { value: 10 });
        set.insert(FilterSpec::Brightness { value: 10 });
        set.insert(FilterSpec::Brightness { value: 11 });
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn only_rotate_reshapes() {
        assert!(FilterSpec::Rotate { degrees: 90 }
            .contract()
            .effects
            .contains(FilterEffect::RESHAPES));
        assert!(!FilterSpec::FlipH.contract().effects.contains(FilterEffect::RESHAPES));
    }

    #[test]
    fn display_includes_parameters() {
        assert_eq!(FilterSpec::Contrast { value: 15 }.to_string(), "contrast(15)");
        assert_eq!(FilterSpec::Sepia.to_string(), "sepia");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!(
            OutputFormat::from_str("JPG", Some(90)).unwrap(),
            OutputFormat::Jpeg { quality: 90 }
        );
        assert_eq!(OutputFormat::from_str("webp", None).unwrap(), OutputFormat::WebP);
        assert!(OutputFormat::from_str("tiff", None).is_err());
    }
}
