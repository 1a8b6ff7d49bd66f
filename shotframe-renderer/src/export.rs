//! Screenshot export pipeline.
//!
//! Exports every mounted canvas, in render order, to an image of the
//! selected store resolution and packages the results into one zip archive.
//!
//! ```text
//! validate ─▶ resolve target size ─▶ rasterize (concurrent) ─▶ zip
//! ```
//!
//! Validation failures return before any rasterization is scheduled.
//! Rasterization runs on the blocking pool, one task per canvas, and every
//! result lands in the slot of its render position, so the archive layout
//! does not depend on completion order. A single failure aborts the export.

use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use shotframe_core::surface::{RasterFormat, RasterImage, RasterOptions};
use shotframe_core::{CanvasStore, ExportMode, StorePreset};
use zip::write::SimpleFileOptions;

use crate::error::{RenderError, RenderResult};

/// Smallest accepted side, in pixels.
pub const MIN_DIMENSION: u32 = 320;

/// Largest accepted side, in pixels.
pub const MAX_DIMENSION: u32 = 3840;

/// Download name of the screenshot archive.
pub const ARCHIVE_NAME: &str = "play-store-screenshots.zip";

/// Download name of the translation document.
pub const TRANSLATIONS_FILE: &str = "translations.json";

/// JPEG quality used unless highest quality is requested.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Requested screenshot orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy, adjustable quality.
    #[default]
    Jpeg,
    /// Lossless.
    Png,
}

impl OutputFormat {
    /// Raster format produced by surfaces.
    #[must_use]
    pub const fn raster_format(self) -> RasterFormat {
        match self {
            Self::Jpeg => RasterFormat::Jpeg,
            Self::Png => RasterFormat::Png,
        }
    }
}

/// User-selected export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Base store resolution.
    pub preset: StorePreset,
    /// Orientation the preset is swapped to.
    pub orientation: Orientation,
    /// Output encoding.
    pub format: OutputFormat,
    /// Export JPEG at full quality.
    pub high_quality: bool,
    /// Completeness mode that sets the minimum canvas count.
    pub mode: ExportMode,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            preset: StorePreset::PhonePortrait,
            orientation: Orientation::Portrait,
            format: OutputFormat::Jpeg,
            high_quality: false,
            mode: ExportMode::Minimum,
        }
    }
}

impl ExportSettings {
    /// JPEG quality, 1..=100. PNG ignores it.
    #[must_use]
    pub const fn quality(&self) -> u8 {
        if self.high_quality {
            100
        } else {
            DEFAULT_JPEG_QUALITY
        }
    }

    /// Final output size after orientation and clamping.
    #[must_use]
    pub fn target_dimensions(&self) -> (u32, u32) {
        resolve_target_dimensions(self.preset, self.orientation)
    }
}

/// Resolve the output size for a preset.
///
/// The preset is swapped to match `orientation`, each side is clamped to
/// `MIN_DIMENSION..=MAX_DIMENSION`, and if the longer side then exceeds twice
/// the shorter, the shorter side is raised to half the longer (rounded up)
/// and clamped again.
#[must_use]
pub fn resolve_target_dimensions(preset: StorePreset, orientation: Orientation) -> (u32, u32) {
    let (base_w, base_h) = preset.dimensions();
    let (mut width, mut height) = match orientation {
        Orientation::Portrait if base_w > base_h => (base_h, base_w),
        Orientation::Landscape if base_h > base_w => (base_h, base_w),
        _ => (base_w, base_h),
    };
    width = width.clamp(MIN_DIMENSION, MAX_DIMENSION);
    height = height.clamp(MIN_DIMENSION, MAX_DIMENSION);

    let (long, short) = (width.max(height), width.min(height));
    if long > short * 2 {
        let raised = long.div_ceil(2).clamp(MIN_DIMENSION, MAX_DIMENSION);
        if width < height {
            width = raised;
        } else {
            height = raised;
        }
    }
    (width, height)
}

/// Check the canvas count against the two-screenshot floor and the mode.
///
/// # Errors
///
/// Returns [`RenderError::TooFewScreenshots`] below two canvases, else
/// [`RenderError::ModeMinimum`] below the mode's count.
pub fn validate(count: usize, mode: ExportMode) -> RenderResult<()> {
    if count < 2 {
        return Err(RenderError::TooFewScreenshots { have: count });
    }
    if count < mode.required_count() {
        return Err(RenderError::ModeMinimum { mode, have: count });
    }
    Ok(())
}

/// A packaged export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArchive {
    /// Zip bytes.
    pub bytes: Vec<u8>,
    /// Entry names in archive order.
    pub file_names: Vec<String>,
}

impl ExportArchive {
    /// Suggested download name.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        ARCHIVE_NAME
    }
}

/// Runs one export with fixed settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportPipeline {
    settings: ExportSettings,
}

impl ExportPipeline {
    /// Pipeline for `settings`.
    #[must_use]
    pub const fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub const fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Rasterize every mounted canvas and package the archive.
    ///
    /// The store is only read.
    ///
    /// # Errors
    ///
    /// Returns a validation error (see [`validate`]) before any work starts,
    /// [`RenderError::Export`] naming the first failed position, or
    /// [`RenderError::Archive`] if packaging fails.
    #[allow(clippy::cast_precision_loss)]
    pub async fn export_all(&self, store: &CanvasStore) -> RenderResult<ExportArchive> {
        let surfaces: Vec<_> = store
            .render_items()
            .into_iter()
            .filter_map(|item| item.surface)
            .collect();
        validate(surfaces.len(), self.settings.mode)?;

        let (target_width, target_height) = self.settings.target_dimensions();
        let format = self.settings.format.raster_format();
        let quality = self.settings.quality();
        tracing::debug!(
            "Exporting {} canvases at {target_width}x{target_height} as {format:?}",
            surfaces.len()
        );

        let mut tasks = Vec::with_capacity(surfaces.len());
        for (index, surface) in surfaces.into_iter().enumerate() {
            let (width, height) = (surface.width(), surface.height());
            let sized = width.is_finite() && width > 0.0 && height > 0.0;
            if !sized {
                tracing::warn!("Skipping canvas {} with no dimensions", index + 1);
                continue;
            }
            let options = RasterOptions {
                format,
                quality,
                multiplier: target_width as f32 / width,
            };
            let task =
                tokio::task::spawn_blocking(move || surface.read(|s| s.to_raster(&options)));
            tasks.push(async move { (index, task.await) });
        }

        let mut slots: Vec<Option<RasterImage>> = Vec::new();
        for (index, outcome) in futures::future::join_all(tasks).await {
            let raster = match outcome {
                Ok(Ok(raster)) => raster,
                Ok(Err(e)) => {
                    return Err(RenderError::Export {
                        index: index + 1,
                        reason: e.to_string(),
                    })
                }
                Err(e) => {
                    return Err(RenderError::Export {
                        index: index + 1,
                        reason: format!("rasterization task failed: {e}"),
                    })
                }
            };
            if slots.len() <= index {
                slots.resize(index + 1, None);
            }
            slots[index] = Some(raster);
        }

        let archive = package(&slots, format)?;
        tracing::info!(
            "Exported {} screenshots ({} bytes)",
            archive.file_names.len(),
            archive.bytes.len()
        );
        Ok(archive)
    }
}

/// Zip the rasters, naming each by its 1-based render position.
fn package(slots: &[Option<RasterImage>], format: RasterFormat) -> RenderResult<ExportArchive> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut file_names = Vec::new();
    for (index, raster) in slots.iter().enumerate() {
        let Some(raster) = raster else { continue };
        let name = format!("screenshot-{}.{}", index + 1, format.extension());
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&raster.bytes)?;
        file_names.push(name);
    }
    let bytes = writer.finish()?.into_inner();
    Ok(ExportArchive { bytes, file_names })
}

/// Which panel of the export dialog is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportStep {
    /// Choosing preset, orientation and format.
    #[default]
    Settings,
    /// Choosing the mode and running the export.
    Export,
}

/// Export dialog state.
///
/// Holds the settings between runs and resets its step and loading flag
/// after every run, whatever the outcome.
#[derive(Debug, Clone, Default)]
pub struct ExportSession {
    /// Current settings.
    pub settings: ExportSettings,
    step: ExportStep,
    loading: bool,
}

impl ExportSession {
    /// Session starting at the settings step.
    #[must_use]
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> ExportStep {
        self.step
    }

    /// Whether an export is running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Move to the export step.
    pub fn next(&mut self) {
        self.step = ExportStep::Export;
    }

    /// Return to the settings step.
    pub fn back(&mut self) {
        self.step = ExportStep::Settings;
    }

    /// Run the export with the current settings.
    ///
    /// # Errors
    ///
    /// Propagates [`ExportPipeline::export_all`] failures; the session is
    /// reset either way.
    pub async fn run(&mut self, store: &CanvasStore) -> RenderResult<ExportArchive> {
        self.loading = true;
        let result = ExportPipeline::new(self.settings).export_all(store).await;
        if let Err(e) = &result {
            if e.is_validation() {
                tracing::debug!("Export rejected: {e}");
            } else {
                tracing::error!("Export failed: {e}");
            }
        }
        self.loading = false;
        self.step = ExportStep::Settings;
        result
    }
}
