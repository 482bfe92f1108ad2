// src/error.rs
//
// Unified error handling for image-workspace
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid input, recoverable
// - StateError: Action not allowed in the current workspace state
// - CodecError: Format/encoding issues and filter failures
// - ResourceLimit: Memory/dimension/surface limits
// - InternalBug: Library bugs (should not happen)

use crate::ops::FilterSpec;
use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy for action initiators.
///
/// Lets a host decide how to present a failure without matching on every
/// variant:
/// - UserError: Invalid input, recoverable by user
/// - StateError: The action does not apply to what the workspace holds
/// - CodecError: Format/encoding issues, failing filters
/// - ResourceLimit: Memory/dimension/surface limits
/// - InternalBug: Library bugs (should not happen)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Action attempted in a state that forbids it
    StateError,
    /// Format/encoding issues and filter failures
    CodecError,
    /// Memory/dimension/surface limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// image-workspace error types
#[derive(Debug, Error)]
pub enum WorkspaceError {
    // Workspace state errors
    #[error("Cannot {operation} while the workspace is {state}")]
    InvalidState {
        operation: Cow<'static, str>,
        state: Cow<'static, str>,
    },

    #[error("No drawing surface is attached")]
    NoSurface,

    #[error("Nothing to save: the workspace has no current image")]
    NothingToSave,

    // Filter errors
    #[error("Filter {spec} failed: {message}")]
    FilterApplication {
        spec: FilterSpec,
        message: Cow<'static, str>,
    },

    #[error("Failed to render onto the surface: {message}")]
    RenderFailed { message: Cow<'static, str> },

    #[error("Unknown filter: '{name}'")]
    UnknownFilter { name: Cow<'static, str> },

    // File I/O Errors
    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Decode / Encode Errors
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("Input size {bytes} bytes exceeds maximum {max} bytes")]
    InputTooLarge { bytes: u64, max: u64 },

    // Configuration Errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Persistence collaborator
    #[error("Failed to store image: {message}")]
    StoreFailed { message: Cow<'static, str> },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl WorkspaceError {
    pub fn invalid_state(
        operation: impl Into<Cow<'static, str>>,
        state: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.into(),
        }
    }

    pub fn no_surface() -> Self {
        Self::NoSurface
    }

    pub fn nothing_to_save() -> Self {
        Self::NothingToSave
    }

    pub fn filter_failed(spec: FilterSpec, message: impl Into<Cow<'static, str>>) -> Self {
        Self::FilterApplication {
            spec,
            message: message.into(),
        }
    }

    pub fn render_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::RenderFailed {
            message: message.into(),
        }
    }

    pub fn unknown_filter(name: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownFilter { name: name.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn input_too_large(bytes: u64, max: u64) -> Self {
        Self::InputTooLarge { bytes, max }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn store_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::StoreFailed {
            message: message.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// The filter spec a failed filter application was attempted with.
    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        match self {
            Self::FilterApplication { spec, .. } => Some(spec),
            _ => None,
        }
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category():
    /// - UserError, StateError and ResourceLimit are recoverable
    /// - CodecError and InternalBug are not
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::StateError | ErrorCategory::ResourceLimit => {
                true
            }
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownFilter { .. }
            | Self::InvalidArgument { .. }
            | Self::FileReadFailed { .. } => ErrorCategory::UserError,

            Self::InvalidState { .. } | Self::NothingToSave => ErrorCategory::StateError,

            Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. }
            | Self::RenderFailed { .. }
            | Self::FilterApplication { .. } => ErrorCategory::CodecError,

            // NoSurface is a resource problem: the host has not given us a
            // drawing target yet, which it can fix by attaching one.
            Self::NoSurface
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::InputTooLarge { .. }
            | Self::StoreFailed { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::StateError => "StateError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }

    /// Stable code string for this category, suitable for host-side matching
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "IMAGE_WORKSPACE_USER_ERROR",
            ErrorCategory::StateError => "IMAGE_WORKSPACE_STATE_ERROR",
            ErrorCategory::CodecError => "IMAGE_WORKSPACE_CODEC_ERROR",
            ErrorCategory::ResourceLimit => "IMAGE_WORKSPACE_RESOURCE_LIMIT",
            ErrorCategory::InternalBug => "IMAGE_WORKSPACE_INTERNAL_BUG",
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, WorkspaceError>;
