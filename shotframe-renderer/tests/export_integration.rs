//! Integration tests for the screenshot export pipeline.
//!
//! Builds real raster surfaces through the canvas store and checks
//! validation, archive layout and output sizes.

use std::io::{Cursor, Read};
use std::sync::Arc;

use shotframe_core::{
    CanvasStore, ExportMode, FixedImageSource, MountOptions, StorePreset, SurfaceFactory,
    SurfaceWrapper,
};
use shotframe_renderer::{
    ExportPipeline, ExportSession, ExportSettings, ExportStep, Orientation, OutputFormat,
    RasterSurfaceFactory, Rasterizer, RenderError,
};

fn factory() -> Arc<dyn SurfaceFactory> {
    Arc::new(RasterSurfaceFactory::new(Rasterizer::with_fontdb(
        usvg::fontdb::Database::new(),
    )))
}

/// Store with `count` mounted canvases. The wrappers must outlive the export.
async fn mounted_store(count: usize) -> (CanvasStore, Vec<SurfaceWrapper>) {
    let store = CanvasStore::default();
    for _ in 1..count {
        store.add_item();
    }
    let factory = factory();
    let images = FixedImageSource::new();
    let mut wrappers = Vec::new();
    for id in store.stable_ids() {
        let mut wrapper = SurfaceWrapper::new(id, store.clone(), Arc::clone(&factory));
        wrapper
            .mount(&MountOptions::default(), &images)
            .await
            .expect("mount");
        wrappers.push(wrapper);
    }
    (store, wrappers)
}

fn entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).expect("zip");
    let mut file = zip.by_name(name).expect("entry");
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).expect("read");
    bytes
}

#[tokio::test]
async fn test_single_canvas_is_rejected() {
    let (store, _wrappers) = mounted_store(1).await;
    let err = ExportPipeline::default()
        .export_all(&store)
        .await
        .expect_err("too few");
    assert!(matches!(err, RenderError::TooFewScreenshots { have: 1 }));
    assert_eq!(
        err.to_string(),
        "You must provide at least two screenshots to export."
    );
}

#[tokio::test]
async fn test_mode_minimum_names_required_count() {
    let (store, _wrappers) = mounted_store(3).await;
    let settings = ExportSettings {
        mode: ExportMode::AppHighlyRecommended,
        ..ExportSettings::default()
    };
    let err = ExportPipeline::new(settings)
        .export_all(&store)
        .await
        .expect_err("mode minimum");
    assert!(err.to_string().contains("at least 4"));
}

#[tokio::test]
async fn test_png_export_follows_render_order() {
    let (store, _wrappers) = mounted_store(2).await;
    store.move_item(1, 0).expect("move");
    let settings = ExportSettings {
        format: OutputFormat::Png,
        ..ExportSettings::default()
    };
    let archive = ExportPipeline::new(settings)
        .export_all(&store)
        .await
        .expect("export");
    assert_eq!(
        archive.file_names,
        vec!["screenshot-1.png".to_string(), "screenshot-2.png".to_string()]
    );
    assert_eq!(archive.file_name(), "play-store-screenshots.zip");

    let image = image::load_from_memory(&entry(&archive.bytes, "screenshot-1.png"))
        .expect("decode");
    assert_eq!((image.width(), image.height()), (1080, 1920));
}

#[tokio::test]
async fn test_landscape_jpeg_export() {
    let (store, _wrappers) = mounted_store(2).await;
    let settings = ExportSettings {
        preset: StorePreset::PhonePortrait,
        orientation: Orientation::Landscape,
        format: OutputFormat::Jpeg,
        high_quality: true,
        mode: ExportMode::Minimum,
    };
    let archive = ExportPipeline::new(settings)
        .export_all(&store)
        .await
        .expect("export");
    let bytes = entry(&archive.bytes, "screenshot-2.jpg");
    assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
    // A 450-wide canvas is scaled to the 1920 target width.
    let image = image::load_from_memory(&bytes).expect("decode");
    assert_eq!(image.width(), 1920);
}

#[tokio::test]
async fn test_disposed_surface_aborts_export() {
    let (store, mut wrappers) = mounted_store(2).await;
    let surface = store.render_items()[1].surface.clone().expect("surface");
    surface.dispose().expect("dispose");

    let err = ExportPipeline::default()
        .export_all(&store)
        .await
        .expect_err("disposed");
    assert!(matches!(err, RenderError::Export { index: 2, .. }));
    wrappers.clear();
}

#[tokio::test]
async fn test_session_resets_after_run() {
    let (store, _wrappers) = mounted_store(1).await;
    let mut session = ExportSession::new(ExportSettings::default());
    session.next();
    assert_eq!(session.step(), ExportStep::Export);
    assert!(session.run(&store).await.is_err());
    assert_eq!(session.step(), ExportStep::Settings);
    assert!(!session.is_loading());
}
