//! Project files.
//!
//! A project file lists the canvases to build, bottom to top in render
//! order:
//!
//! ```json
//! {
//!   "canvasWidth": 450,
//!   "canvasHeight": 800,
//!   "canvases": [
//!     {
//!       "background": "#1f2937",
//!       "device": "iphone-15",
//!       "screenshot": "shots/home.png",
//!       "texts": ["Track every habit"]
//!     },
//!     { "device": "pixel-8-pro", "layout": 3 }
//!   ]
//! }
//! ```
//!
//! Frame artwork is read from the device's catalog path (e.g.
//! `frames/iphone-15.png`) relative to the project directory.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use shotframe_core::catalog::{self, DeviceSpec, DEFAULT_BACKGROUND};
use shotframe_core::{
    attach_screenshot, CanvasStore, FrameRequest, LayoutFrame, MountOptions, StoreConfig,
    SurfaceFactory, SurfaceWrapper, TextEditor,
};
use shotframe_renderer::{DecodingImageSource, RasterSurfaceFactory, Rasterizer};

/// Project description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Width of canvases without their own size.
    #[serde(default = "ProjectFile::default_width")]
    pub canvas_width: u32,
    /// Height of canvases without their own size.
    #[serde(default = "ProjectFile::default_height")]
    pub canvas_height: u32,
    /// Canvases in render order.
    #[serde(default)]
    pub canvases: Vec<CanvasSpec>,
}

/// One canvas of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSpec {
    /// Width override.
    pub width: Option<u32>,
    /// Height override.
    pub height: Option<u32>,
    /// Background color.
    pub background: Option<String>,
    /// Catalog device id whose frame is placed on the canvas.
    pub device: Option<String>,
    /// Layout preset id for the frame.
    pub layout: Option<u32>,
    /// Screenshot composited into the frame.
    pub screenshot: Option<String>,
    /// Text objects, added top to bottom.
    #[serde(default)]
    pub texts: Vec<String>,
}

impl ProjectFile {
    const fn default_width() -> u32 {
        450
    }

    const fn default_height() -> u32 {
        800
    }

    /// Read a project file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a project.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading project {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing project {}", path.display()))
    }

    /// Build and mount every canvas.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown devices or layouts, unreadable images,
    /// or a rejected editor operation.
    pub async fn open(&self, base_dir: &Path) -> anyhow::Result<OpenProject> {
        let store = CanvasStore::new(StoreConfig {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            seed_first_canvas: false,
        });
        let rasterizer = Rasterizer::new().with_resources_dir(base_dir);
        let factory: Arc<dyn SurfaceFactory> = Arc::new(RasterSurfaceFactory::new(rasterizer));
        let images = DecodingImageSource::with_base_dir(base_dir);

        let mut wrappers = Vec::with_capacity(self.canvases.len());
        for (index, spec) in self.canvases.iter().enumerate() {
            let id = store.add_item();
            let wrapper = spec
                .build(&store, &id, Arc::clone(&factory), &images)
                .await
                .with_context(|| format!("building canvas {} ({id})", index + 1))?;
            wrappers.push(wrapper);
        }
        Ok(OpenProject { store, wrappers })
    }
}

impl CanvasSpec {
    async fn build(
        &self,
        store: &CanvasStore,
        id: &shotframe_core::CanvasId,
        factory: Arc<dyn SurfaceFactory>,
        images: &DecodingImageSource,
    ) -> anyhow::Result<SurfaceWrapper> {
        if let (Some(width), Some(height)) = (self.width, self.height) {
            store.resize_item(id, width, height);
        }
        let device = self.device()?;

        let mut options = MountOptions {
            background: self
                .background
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
            ..MountOptions::default()
        };
        if let (Some(layout), Some(device)) = (self.layout, device) {
            let preset =
                catalog::layout(layout).ok_or_else(|| anyhow!("unknown layout {layout}"))?;
            options.layout = Some(LayoutFrame {
                preset: *preset,
                src: device.image_url.to_string(),
                device: Some(device.kind),
            });
        }

        let mut wrapper = SurfaceWrapper::new(id.clone(), store.clone(), factory);
        wrapper
            .mount(&options, images)
            .await?
            .ok_or_else(|| anyhow!("canvas {id} was not accepted by the store"))?;
        store.select(id);

        if let Some(device) = device {
            if options.layout.is_none() {
                let request = FrameRequest::new(device.image_url).with_device(device.kind);
                store.add_frame(&request, images).await?;
            }
            if let Some(screenshot) = &self.screenshot {
                let surface = store.require_selected_surface()?;
                let frame =
                    surface.read(|s| s.objects().iter().rev().find(|o| o.is_frame()).map(|o| o.id));
                surface.set_active_object(frame)?;
                attach_screenshot(store, device, screenshot, images).await?;
            }
        } else if self.screenshot.is_some() {
            tracing::warn!("Canvas {id} has a screenshot but no device; skipping it");
        }

        let editor = TextEditor::new(store.clone());
        for text in &self.texts {
            store.add_text()?;
            editor.set_content(text)?;
        }
        Ok(wrapper)
    }

    fn device(&self) -> anyhow::Result<Option<&'static DeviceSpec>> {
        self.device
            .as_deref()
            .map(|id| catalog::device(id).ok_or_else(|| anyhow!("unknown device {id}")))
            .transpose()
    }
}

/// A project loaded into a store with mounted raster surfaces.
///
/// Dropping it unmounts every canvas.
#[derive(Debug)]
pub struct OpenProject {
    store: CanvasStore,
    wrappers: Vec<SurfaceWrapper>,
}

impl OpenProject {
    /// The canvas store.
    #[must_use]
    pub const fn store(&self) -> &CanvasStore {
        &self.store
    }

    /// Number of mounted canvases.
    #[must_use]
    pub fn mounted(&self) -> usize {
        self.wrappers.iter().filter(|w| w.is_mounted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let project: ProjectFile = serde_json::from_str("{}").expect("parse");
        assert_eq!((project.canvas_width, project.canvas_height), (450, 800));
        assert!(project.canvases.is_empty());
    }

    #[test]
    fn test_canvas_fields() {
        let project: ProjectFile = serde_json::from_str(
            r#"{"canvases": [{"device": "iphone-15", "layout": 2, "texts": ["Hi"], "width": 600, "height": 900}]}"#,
        )
        .expect("parse");
        let canvas = &project.canvases[0];
        assert_eq!(canvas.device.as_deref(), Some("iphone-15"));
        assert_eq!(canvas.layout, Some(2));
        assert_eq!(canvas.texts, vec!["Hi".to_string()]);
        assert_eq!((canvas.width, canvas.height), (Some(600), Some(900)));
    }

    #[test]
    fn test_unknown_device() {
        let spec = CanvasSpec {
            device: Some("nokia-3310".to_string()),
            ..CanvasSpec::default()
        };
        assert!(spec.device().is_err());
    }

    #[tokio::test]
    async fn test_open_text_only_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = ProjectFile {
            canvas_width: 450,
            canvas_height: 800,
            canvases: vec![
                CanvasSpec {
                    texts: vec!["First".to_string()],
                    ..CanvasSpec::default()
                },
                CanvasSpec {
                    background: Some("#ffffff".to_string()),
                    width: Some(600),
                    height: Some(900),
                    ..CanvasSpec::default()
                },
            ],
        };
        let open = project.open(dir.path()).await.expect("open");
        assert_eq!(open.mounted(), 2);

        let ids = open.store().render_ids();
        let first = open.store().surface(&ids[0]).expect("first");
        assert_eq!(
            first.read(|s| s.objects()[0].as_text().map(|(t, _)| t.to_string())),
            Some("First".to_string())
        );
        let second = open.store().surface(&ids[1]).expect("second");
        assert_eq!((second.width(), second.height()), (600.0, 900.0));
    }
}
