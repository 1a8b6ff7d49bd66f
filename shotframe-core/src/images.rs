//! Image loading collaborator.
//!
//! Editor operations that place images only need an image's source and
//! natural size; decoding and resampling live behind [`ImageSource`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{EditorError, EditorResult};

/// A loaded image ready to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Source URL or data URI the scene should reference.
    pub src: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

/// Loads images by URL or data URI.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Load an image and report its natural size.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ImageLoad`] if the image cannot be read or
    /// decoded.
    async fn load(&self, src: &str) -> EditorResult<LoadedImage>;

    /// Resample an image so it is at least `min_width` x `min_height`.
    ///
    /// Images already large enough on both axes are returned unchanged. The
    /// default implementation never resamples.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ImageLoad`] if resampling fails.
    async fn upscale(
        &self,
        image: &LoadedImage,
        _min_width: u32,
        _min_height: u32,
    ) -> EditorResult<LoadedImage> {
        Ok(image.clone())
    }
}

/// Image source backed by a table of known sizes.
///
/// Used where images are described rather than decoded, e.g. project files
/// that declare frame artwork dimensions.
#[derive(Debug, Clone, Default)]
pub struct FixedImageSource {
    sizes: HashMap<String, (u32, u32)>,
}

impl FixedImageSource {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image size.
    #[must_use]
    pub fn with_image(mut self, src: impl Into<String>, width: u32, height: u32) -> Self {
        self.sizes.insert(src.into(), (width, height));
        self
    }
}

#[async_trait]
impl ImageSource for FixedImageSource {
    async fn load(&self, src: &str) -> EditorResult<LoadedImage> {
        let (width, height) = self
            .sizes
            .get(src)
            .copied()
            .ok_or_else(|| EditorError::ImageLoad(format!("unknown image {src}")))?;
        Ok(LoadedImage {
            src: src.to_string(),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_source_lookup() {
        let images = FixedImageSource::new().with_image("frame.png", 400, 800);
        let image = images.load("frame.png").await.expect("known image");
        assert_eq!((image.width, image.height), (400, 800));
        assert!(matches!(
            images.load("missing.png").await,
            Err(EditorError::ImageLoad(_))
        ));
    }

    #[tokio::test]
    async fn test_default_upscale_is_identity() {
        let images = FixedImageSource::new().with_image("shot.png", 10, 10);
        let image = images.load("shot.png").await.expect("known image");
        let same = images.upscale(&image, 100, 100).await.expect("upscale");
        assert_eq!(same, image);
    }
}
