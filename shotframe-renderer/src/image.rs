//! Image decoding and resampling.
//!
//! Images arrive as file paths or base64 data URIs. [`DecodingImageSource`]
//! is the [`ImageSource`] the editor uses when real pixels are available:
//! it reads and decodes off the async runtime and produces upscaled copies
//! as PNG data URIs.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use image::imageops::FilterType;
use image::DynamicImage;
use shotframe_core::images::{ImageSource, LoadedImage};
use shotframe_core::{EditorError, EditorResult};

use crate::error::{RenderError, RenderResult};

/// A parsed data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared MIME type, e.g. `image/png`.
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Parse a data URI such as `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns an error if the URI is malformed or the payload cannot be decoded.
pub fn parse_data_uri(uri: &str) -> RenderResult<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let (mime, is_base64) = match metadata.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (metadata, false),
    };
    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    Ok(DataUri {
        mime: mime.to_string(),
        bytes,
    })
}

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

/// Decode image bytes.
///
/// # Errors
///
/// Returns an error if the format is unknown or the data is corrupt.
pub fn decode(bytes: &[u8]) -> RenderResult<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))
}

/// Resample so the image is at least `min_width` x `min_height`.
///
/// Each axis grows independently and never shrinks. Returns `None` when the
/// image is already large enough on both axes.
#[must_use]
pub fn upscale_to_min(image: &DynamicImage, min_width: u32, min_height: u32) -> Option<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    let target = (width.max(min_width), height.max(min_height));
    if target == (width, height) {
        return None;
    }
    Some(image.resize_exact(target.0, target.1, FilterType::Triangle))
}

/// Encode an image as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(image: &DynamicImage) -> RenderResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// [`ImageSource`] that reads and decodes real image data.
///
/// Relative paths are resolved against the base directory. Data URIs are
/// decoded in place.
#[derive(Debug, Clone, Default)]
pub struct DecodingImageSource {
    base_dir: Option<PathBuf>,
}

impl DecodingImageSource {
    /// Source resolving paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source resolving relative paths against `dir`.
    #[must_use]
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read_bytes(&self, src: &str) -> EditorResult<Vec<u8>> {
        if src.starts_with("data:") {
            return parse_data_uri(src)
                .map(|uri| uri.bytes)
                .map_err(|e| EditorError::ImageLoad(e.to_string()));
        }
        let path = self.resolve(src);
        tokio::fs::read(&path)
            .await
            .map_err(|e| EditorError::ImageLoad(format!("{}: {e}", path.display())))
    }

    async fn decode_blocking(bytes: Vec<u8>) -> EditorResult<DynamicImage> {
        tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| EditorError::ImageLoad(format!("decode task failed: {e}")))?
            .map_err(|e| EditorError::ImageLoad(e.to_string()))
    }
}

#[async_trait]
impl ImageSource for DecodingImageSource {
    async fn load(&self, src: &str) -> EditorResult<LoadedImage> {
        let bytes = self.read_bytes(src).await?;
        let image = Self::decode_blocking(bytes).await?;
        tracing::debug!("Loaded image {}x{}", image.width(), image.height());
        Ok(LoadedImage {
            src: src.to_string(),
            width: image.width(),
            height: image.height(),
        })
    }

    async fn upscale(
        &self,
        image: &LoadedImage,
        min_width: u32,
        min_height: u32,
    ) -> EditorResult<LoadedImage> {
        if image.width >= min_width && image.height >= min_height {
            return Ok(image.clone());
        }
        let bytes = self.read_bytes(&image.src).await?;
        tokio::task::spawn_blocking(move || {
            let decoded = decode(&bytes)?;
            let Some(resized) = upscale_to_min(&decoded, min_width, min_height) else {
                return Ok(None);
            };
            let png = encode_png(&resized)?;
            Ok::<_, RenderError>(Some(LoadedImage {
                src: encode_data_uri("image/png", &png),
                width: resized.width(),
                height: resized.height(),
            }))
        })
        .await
        .map_err(|e| EditorError::ImageLoad(format!("upscale task failed: {e}")))?
        .map_err(|e| EditorError::ImageLoad(e.to_string()))
        .map(|resized| {
            resized.map_or_else(
                || image.clone(),
                |resized| {
                    tracing::debug!(
                        "Upscaled image {}x{} to {}x{}",
                        image.width,
                        image.height,
                        resized.width,
                        resized.height
                    );
                    resized
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_uri() -> String {
        format!("data:image/png;base64,{PNG_1X1}")
    }

    #[test]
    fn test_data_uri_parsing() {
        let uri = parse_data_uri(&png_uri()).expect("parse");
        assert_eq!(uri.mime, "image/png");
        let image = decode(&uri.bytes).expect("decode");
        assert_eq!((image.width(), image.height()), (1, 1));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(parse_data_uri("not a data uri").is_err());
        assert!(parse_data_uri("data:image/png").is_err());
        assert!(parse_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        let uri = parse_data_uri("data:text/plain,a%20b").expect("parse");
        assert_eq!(uri.bytes, b"a b");
    }

    #[test]
    fn test_upscale_never_shrinks() {
        let image = DynamicImage::new_rgba8(10, 40);
        let resized = upscale_to_min(&image, 20, 20).expect("resized");
        assert_eq!((resized.width(), resized.height()), (20, 40));
        assert!(upscale_to_min(&image, 5, 5).is_none());
    }

    #[tokio::test]
    async fn test_load_data_uri() {
        let source = DecodingImageSource::new();
        let loaded = source.load(&png_uri()).await.expect("load");
        assert_eq!((loaded.width, loaded.height), (1, 1));
        assert_eq!(loaded.src, png_uri());
    }

    #[tokio::test]
    async fn test_load_relative_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let png = encode_png(&DynamicImage::new_rgba8(3, 5)).expect("png");
        std::fs::write(dir.path().join("frame.png"), png).expect("write");

        let source = DecodingImageSource::with_base_dir(dir.path());
        let loaded = source.load("frame.png").await.expect("load");
        assert_eq!((loaded.width, loaded.height), (3, 5));
        assert!(matches!(
            source.load("missing.png").await,
            Err(EditorError::ImageLoad(_))
        ));
    }

    #[tokio::test]
    async fn test_upscale_produces_png_data_uri() {
        let source = DecodingImageSource::new();
        let loaded = source.load(&png_uri()).await.expect("load");
        let upscaled = source.upscale(&loaded, 4, 2).await.expect("upscale");
        assert_eq!((upscaled.width, upscaled.height), (4, 2));
        assert!(upscaled.src.starts_with("data:image/png;base64,"));

        let same = source.upscale(&loaded, 1, 1).await.expect("upscale");
        assert_eq!(same, loaded);
    }
}
