//! Renderer error types.

use shotframe_core::{ExportMode, SurfaceError};
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The SVG intermediate could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Rasterization failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Encoding the raster failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Fewer than two canvases were offered for export.
    #[error("You must provide at least two screenshots to export.")]
    TooFewScreenshots {
        /// Canvases available.
        have: usize,
    },

    /// The export mode needs more canvases than are available.
    #[error("Mode \"{}\" requires at least {} canvases. You only have {have}.", .mode.as_str(), .mode.required_count())]
    ModeMinimum {
        /// Selected mode.
        mode: ExportMode,
        /// Canvases available.
        have: usize,
    },

    /// A surface failed to rasterize during export.
    #[error("Failed to export screenshot {index}: {reason}")]
    Export {
        /// 1-based render position.
        index: usize,
        /// Underlying failure.
        reason: String,
    },

    /// Packaging the archive failed.
    #[error("Archive error: {0}")]
    Archive(String),

    /// The drawing surface reported an error.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether this is an export validation failure, reported before any
    /// rasterization starts.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::TooFewScreenshots { .. } | Self::ModeMinimum { .. })
    }
}

impl From<RenderError> for SurfaceError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Surface(inner) => inner,
            other => Self::Raster(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_message_names_counts() {
        let err = RenderError::ModeMinimum {
            mode: ExportMode::AppHighlyRecommended,
            have: 3,
        };
        assert_eq!(
            err.to_string(),
            "Mode \"app-highly-recommended\" requires at least 4 canvases. You only have 3."
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_surface_error_passthrough() {
        let err: SurfaceError = RenderError::Surface(SurfaceError::Disposed).into();
        assert_eq!(err, SurfaceError::Disposed);
        let err: SurfaceError = RenderError::Encode("bad".to_string()).into();
        assert!(matches!(err, SurfaceError::Raster(_)));
    }
}
