//! # Shotframe Core
//!
//! Editing state for a multi-canvas app-store screenshot editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 CanvasStore                 │
//! │  - stable + render order  - selection       │
//! │  - mount tickets          - clone seeds     │
//! ├─────────────────────────────────────────────┤
//! │  SurfaceWrapper  │  Editors                 │
//! │  - mount/unmount │  - frames, screenshots   │
//! │  - seed copy     │  - background, text      │
//! │  - overlays      │  - translations          │
//! ├─────────────────────────────────────────────┤
//! │  DrawingSurface (Scene + rasterizer)        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rasterizing surfaces and the export pipeline live in
//! `shotframe-renderer`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod background;
pub mod canvas;
pub mod catalog;
pub mod composite;
pub mod editors;
pub mod error;
pub mod fit;
pub mod images;
pub mod notice;
pub mod object;
pub mod scene;
pub mod shell;
pub mod store;
pub mod surface;
pub mod translation;
pub mod wrapper;

pub use assets::AssetLibrary;
pub use background::{Background, BackgroundImage, Fill, GradientDirection, ImageFit};
pub use canvas::{CanvasId, CanvasItem, Lifecycle};
pub use catalog::{DeviceKind, DeviceSpec, ExportMode, LayoutPreset, StorePreset};
pub use composite::attach_screenshot;
pub use editors::{BackgroundEditor, TextEditor, TextForm};
pub use error::{EditorError, EditorResult, SurfaceError, SurfaceResult};
pub use fit::frame_scale;
pub use images::{FixedImageSource, ImageSource, LoadedImage};
pub use notice::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use object::{ObjectId, ObjectKind, PlacedObject, Placement, TextStyle};
pub use scene::{Scene, SceneSnapshot};
pub use shell::{KeyEvent, Shell, ShortcutAction, Viewport};
pub use store::{ApplyReport, CanvasStore, FrameRequest, StoreConfig, SurfaceContext};
pub use surface::{
    DrawingSurface, MemorySurfaceFactory, RasterFormat, RasterImage, RasterOptions,
    SurfaceEvent, SurfaceFactory, SurfaceHandle,
};
pub use translation::{Language, TranslationDocument, TranslationOverlay};
pub use wrapper::{LayoutFrame, MountOptions, SurfaceWrapper};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
