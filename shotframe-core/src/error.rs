//! Error types for editor and surface operations.

use thiserror::Error;

use crate::canvas::CanvasId;
use crate::object::ObjectId;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Result type for drawing-surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Errors raised by a drawing surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// The surface was already disposed.
    #[error("Surface already disposed")]
    Disposed,

    /// The object does not exist on this surface.
    #[error("Object not found on surface: {0}")]
    ObjectNotFound(ObjectId),

    /// Width or height was not a positive finite number.
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },

    /// Rasterization failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Snapshot could not be restored.
    #[error("Snapshot restore failed: {0}")]
    Restore(String),
}

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// An operation needed a selected canvas but none is selected.
    #[error("Please select a canvas first.")]
    NoCanvasSelected,

    /// The collection has no canvases to operate on.
    #[error("No canvases available.")]
    NoCanvases,

    /// The active object is not a device frame image.
    #[error("Please select a phone frame first.")]
    NoFrameSelected,

    /// The surface already holds the maximum number of frames.
    #[error("You can only add up to {limit} frames.")]
    FrameLimitReached {
        /// Maximum frames per surface.
        limit: usize,
    },

    /// The canvas exists but its surface has not attached yet.
    #[error("Canvas {0} is not ready yet")]
    SurfaceNotReady(CanvasId),

    /// The canvas is not part of the collection.
    #[error("Canvas not found: {0}")]
    CanvasNotFound(CanvasId),

    /// A render order was not a permutation of the collection.
    #[error("Invalid render order: {0}")]
    InvalidReorder(String),

    /// An image could not be loaded or decoded.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// A translation document failed validation.
    #[error("Invalid translation JSON: {0}")]
    InvalidTranslation(String),

    /// An uploaded asset exceeds the per-entry size cap.
    #[error("File is too big! ({size} bytes, limit {limit})")]
    AssetTooLarge {
        /// Size of the rejected asset in bytes.
        size: usize,
        /// Per-entry limit in bytes.
        limit: usize,
    },

    /// The asset list is already at capacity.
    #[error("Can only upload {limit} images!")]
    AssetLibraryFull {
        /// Maximum number of stored assets.
        limit: usize,
    },

    /// The asset is not an image data URI.
    #[error("Not an image: {0}")]
    NotAnImage(String),

    /// The drawing surface reported an error.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// JSON serialization or parsing failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Whether this error is a user precondition failure that should be shown
    /// as a notice rather than logged as a fault.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NoCanvasSelected
                | Self::NoCanvases
                | Self::NoFrameSelected
                | Self::FrameLimitReached { .. }
                | Self::SurfaceNotReady(_)
                | Self::InvalidTranslation(_)
                | Self::AssetTooLarge { .. }
                | Self::AssetLibraryFull { .. }
                | Self::NotAnImage(_)
                | Self::Serialization(_)
                | Self::ImageLoad(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_user_facing() {
        assert!(EditorError::NoCanvasSelected.is_user_facing());
        assert!(EditorError::FrameLimitReached { limit: 2 }.is_user_facing());
        assert!(!EditorError::Surface(SurfaceError::Disposed).is_user_facing());
    }

    #[test]
    fn test_frame_limit_message() {
        let err = EditorError::FrameLimitReached { limit: 2 };
        assert_eq!(err.to_string(), "You can only add up to 2 frames.");
    }
}
