//! Background editing for the selected canvas.

use crate::background::{Background, BackgroundImage, Fill, GradientDirection, ImageFit};
use crate::catalog::BACKGROUND_PRESETS;
use crate::error::{EditorError, EditorResult, SurfaceError};
use crate::images::LoadedImage;
use crate::store::CanvasStore;
use crate::surface::SurfaceHandle;

/// Edits the background of whichever canvas is selected.
#[derive(Debug, Clone)]
pub struct BackgroundEditor {
    store: CanvasStore,
}

impl BackgroundEditor {
    /// Editor over a store.
    #[must_use]
    pub const fn new(store: CanvasStore) -> Self {
        Self { store }
    }

    /// Background of the selected canvas.
    ///
    /// # Errors
    ///
    /// Returns a selection error.
    pub fn current(&self) -> EditorResult<Background> {
        let surface = self.store.require_selected_surface()?;
        Ok(surface.read(|s| s.background().clone()))
    }

    /// Replace the fill with a solid color, keeping image and opacity.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_solid(&self, color: &str) -> EditorResult<()> {
        self.update(|_, bg| bg.fill = Fill::solid(color))
    }

    /// Replace the fill with a two-color gradient sized to the surface.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_gradient(
        &self,
        start: &str,
        end: &str,
        direction: GradientDirection,
    ) -> EditorResult<()> {
        self.update(|(w, h), bg| bg.fill = Fill::gradient(start, end, direction, w, h))
    }

    /// Apply a named quick preset (`Dark`, `Light`, ...).
    ///
    /// Returns `false` for unknown names.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn apply_preset(&self, name: &str) -> EditorResult<bool> {
        let Some((_, color)) = BACKGROUND_PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        else {
            return Ok(false);
        };
        self.set_solid(color)?;
        Ok(true)
    }

    /// Set the background image of the selected canvas.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_image(&self, image: &LoadedImage, fit: ImageFit) -> EditorResult<()> {
        let image = background_image(image, fit);
        self.update(|_, bg| bg.image = Some(image))
    }

    /// Change how the current background image is scaled. Returns `false`
    /// when there is no image.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_image_fit(&self, fit: ImageFit) -> EditorResult<bool> {
        let mut changed = false;
        self.update(|_, bg| {
            if let Some(image) = bg.image.as_mut() {
                image.fit = fit;
                changed = true;
            }
        })?;
        Ok(changed)
    }

    /// Remove the background image.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn remove_image(&self) -> EditorResult<()> {
        self.update(|_, bg| bg.image = None)
    }

    /// Set background opacity, clamped to `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_opacity(&self, opacity: f32) -> EditorResult<()> {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.update(|_, bg| bg.opacity = opacity)
    }

    /// Stretch an image over the background of every live canvas. Returns
    /// how many canvases were updated; disposed surfaces are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoCanvases`] for an empty collection.
    pub fn apply_image_to_all(&self, image: &LoadedImage) -> EditorResult<usize> {
        let items = self.store.items();
        if items.is_empty() {
            return Err(EditorError::NoCanvases);
        }
        let image = background_image(image, ImageFit::Stretch);
        let mut applied = 0;
        for item in items {
            let Some(surface) = item.surface else {
                continue;
            };
            match write_background(&surface, |_, bg| bg.image = Some(image.clone())) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("Skipping background image on {}: {e}", item.id),
            }
        }
        tracing::debug!("Applied background image to {applied} canvases");
        Ok(applied)
    }

    /// Resize the selected canvas.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoCanvasSelected`] without a selection.
    pub fn resize(&self, width: u32, height: u32) -> EditorResult<()> {
        let id = self
            .store
            .selected_id()
            .ok_or(EditorError::NoCanvasSelected)?;
        if !self.store.resize_item(&id, width, height) {
            return Err(EditorError::CanvasNotFound(id));
        }
        Ok(())
    }

    fn update(&self, f: impl FnOnce((f32, f32), &mut Background)) -> EditorResult<()> {
        let surface = self.store.require_selected_surface()?;
        write_background(&surface, f)?;
        Ok(())
    }
}

fn background_image(image: &LoadedImage, fit: ImageFit) -> BackgroundImage {
    BackgroundImage {
        src: image.src.clone(),
        width: image.width,
        height: image.height,
        fit,
    }
}

fn write_background(
    surface: &SurfaceHandle,
    f: impl FnOnce((f32, f32), &mut Background),
) -> Result<(), SurfaceError> {
    surface.write(|s| {
        let mut background = s.live_scene()?.background().clone();
        f((s.width(), s.height()), &mut background);
        s.set_background(background)?;
        s.render()
    })
}
