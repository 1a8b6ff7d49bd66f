//! Raster drawing surfaces.
//!
//! [`RasterSurface`] is the concrete [`DrawingSurface`]: it keeps a
//! [`Scene`] and rasterizes it by way of [`scene_to_svg`], usvg and
//! tiny-skia. Font discovery happens once per [`Rasterizer`], which every
//! surface created by a [`RasterSurfaceFactory`] shares.

use std::path::PathBuf;
use std::sync::Arc;

use image::ImageEncoder;
use shotframe_core::background::Background;
use shotframe_core::surface::{
    DrawingSurface, RasterFormat, RasterImage, RasterOptions, SurfaceFactory, SurfaceHandle,
};
use shotframe_core::{Scene, SurfaceResult};

use crate::error::{RenderError, RenderResult};
use crate::svg::scene_to_svg;

/// Color transparent pixels are flattened onto for JPEG output.
const JPEG_MATTE: [u8; 3] = [255, 255, 255];

/// Shared SVG rasterization state.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    resources_dir: Option<PathBuf>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Rasterizer with the system fonts loaded.
    #[must_use]
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!("Loaded {} font faces", fontdb.len());
        Self::with_fontdb(fontdb)
    }

    /// Rasterizer using the given font database.
    #[must_use]
    pub fn with_fontdb(fontdb: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(fontdb),
            resources_dir: None,
        }
    }

    /// Resolve relative image paths against `dir`.
    #[must_use]
    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = Some(dir.into());
        self
    }

    /// Rasterize a scene and encode it.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG intermediate cannot be parsed or the
    /// pixels cannot be encoded.
    pub fn render(&self, scene: &Scene, options: &RasterOptions) -> RenderResult<RasterImage> {
        let svg = scene_to_svg(scene, options.multiplier);
        let pixmap = self.rasterize_svg(&svg)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        let bytes = match options.format {
            RasterFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?,
            RasterFormat::Jpeg => encode_jpeg(&pixmap, options.quality)?,
        };
        tracing::debug!(
            "Rasterized {}x{} scene to {width}x{height} {:?} ({} bytes)",
            scene.width(),
            scene.height(),
            options.format,
            bytes.len()
        );
        Ok(RasterImage {
            format: options.format,
            width,
            height,
            bytes,
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options {
            resources_dir: self.resources_dir.clone(),
            ..usvg::Options::default()
        };
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Flatten premultiplied RGBA onto the matte and encode as JPEG.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(pixmap: &tiny_skia::Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for (channel, matte) in pixel[..3].iter().zip(JPEG_MATTE) {
            rgb.push(f32::from(matte).mul_add(inv, f32::from(*channel)).round() as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// A drawing surface that rasterizes through [`Rasterizer`].
#[derive(Debug)]
pub struct RasterSurface {
    scene: Scene,
    rasterizer: Arc<Rasterizer>,
}

impl RasterSurface {
    /// Create a surface.
    ///
    /// # Errors
    ///
    /// Returns [`shotframe_core::SurfaceError::InvalidDimensions`] for
    /// non-positive sizes.
    pub fn new(
        width: f32,
        height: f32,
        background: Background,
        rasterizer: Arc<Rasterizer>,
    ) -> SurfaceResult<Self> {
        Ok(Self {
            scene: Scene::new(width, height, background)?,
            rasterizer,
        })
    }
}

impl DrawingSurface for RasterSurface {
    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn to_raster(&self, options: &RasterOptions) -> SurfaceResult<RasterImage> {
        let scene = self.live_scene()?;
        Ok(self.rasterizer.render(scene, options)?)
    }
}

/// Creates [`RasterSurface`]s sharing one [`Rasterizer`].
#[derive(Debug, Clone, Default)]
pub struct RasterSurfaceFactory {
    rasterizer: Arc<Rasterizer>,
}

impl RasterSurfaceFactory {
    /// Factory over `rasterizer`.
    #[must_use]
    pub fn new(rasterizer: Rasterizer) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
        }
    }

    /// The shared rasterizer.
    #[must_use]
    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn create(
        &self,
        width: f32,
        height: f32,
        background: &Background,
    ) -> SurfaceResult<SurfaceHandle> {
        let surface = RasterSurface::new(
            width,
            height,
            background.clone(),
            Arc::clone(&self.rasterizer),
        )?;
        Ok(SurfaceHandle::new(surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotframe_core::SurfaceError;

    fn factory() -> RasterSurfaceFactory {
        RasterSurfaceFactory::new(Rasterizer::with_fontdb(usvg::fontdb::Database::new()))
    }

    #[test]
    fn test_png_has_multiplied_size() {
        let surface = factory()
            .create(450.0, 800.0, &Background::solid("#3b82f6"))
            .expect("surface");
        let options = RasterOptions {
            multiplier: 2.4,
            ..RasterOptions::default()
        };
        let raster = surface.read(|s| s.to_raster(&options)).expect("raster");
        assert_eq!((raster.width, raster.height), (1080, 1920));
        assert!(raster.bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_jpeg_output() {
        let surface = factory()
            .create(100.0, 200.0, &Background::default())
            .expect("surface");
        let options = RasterOptions {
            format: RasterFormat::Jpeg,
            quality: 80,
            multiplier: 1.0,
        };
        let raster = surface.read(|s| s.to_raster(&options)).expect("raster");
        assert_eq!(raster.format, RasterFormat::Jpeg);
        assert!(raster.bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
        let decoded = image::load_from_memory(&raster.bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (100, 200));
    }

    #[test]
    fn test_solid_background_pixels() {
        let surface = factory()
            .create(4.0, 4.0, &Background::solid("#ff0000"))
            .expect("surface");
        let raster = surface
            .read(|s| s.to_raster(&RasterOptions::default()))
            .expect("raster");
        let decoded = image::load_from_memory(&raster.bytes)
            .expect("decode")
            .to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_disposed_surface_cannot_rasterize() {
        let surface = factory()
            .create(100.0, 100.0, &Background::default())
            .expect("surface");
        surface.dispose().expect("dispose");
        let result = surface.read(|s| s.to_raster(&RasterOptions::default()));
        assert_eq!(result, Err(SurfaceError::Disposed));
    }
}
