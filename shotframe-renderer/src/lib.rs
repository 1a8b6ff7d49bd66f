//! # Shotframe Renderer
//!
//! Raster drawing surfaces and the screenshot export pipeline.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   Scene (shotframe-core)                    │
//! ├─────────────────────────────────────────────┤
//! │   SVG intermediate          (svg.rs)        │
//! ├─────────────────────────────────────────────┤
//! │   usvg + resvg + tiny-skia  (raster.rs)     │
//! ├──────────────────────┬──────────────────────┤
//! │ PNG / JPEG encoding  │ zip packaging        │
//! │                      │ (export.rs)          │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;
pub mod raster;
pub mod svg;

pub use error::{RenderError, RenderResult};
pub use export::{
    resolve_target_dimensions, ExportArchive, ExportPipeline, ExportSession, ExportSettings,
    ExportStep, Orientation, OutputFormat, ARCHIVE_NAME, TRANSLATIONS_FILE,
};
pub use self::image::DecodingImageSource;
pub use raster::{RasterSurface, RasterSurfaceFactory, Rasterizer};
pub use svg::scene_to_svg;
