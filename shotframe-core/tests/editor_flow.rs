//! Editor Flow Integration Tests
//!
//! Drives the public API the way an editor session does:
//! - Mounting wrappers for every canvas
//! - Frames, screenshots and text on the selected canvas
//! - Duplicating, reordering and deleting canvases
//! - Translation export and re-import

use std::collections::HashMap;
use std::sync::Arc;

use shotframe_core::catalog::device;
use shotframe_core::translation::Language;
use shotframe_core::{
    attach_screenshot, CanvasId, CanvasStore, EditorError, FixedImageSource, FrameRequest,
    Lifecycle, MemorySurfaceFactory, MountOptions, SurfaceFactory, SurfaceWrapper,
    TranslationDocument,
};

fn images() -> FixedImageSource {
    FixedImageSource::new()
        .with_image("frames/iphone-15.png", 400, 820)
        .with_image("shots/home.png", 1179, 2556)
}

/// Mount a wrapper for every canvas that does not have one yet.
async fn mount_missing(
    store: &CanvasStore,
    wrappers: &mut HashMap<CanvasId, SurfaceWrapper>,
    images: &FixedImageSource,
) {
    let factory: Arc<dyn SurfaceFactory> = Arc::new(MemorySurfaceFactory);
    for id in store.stable_ids() {
        if wrappers.contains_key(&id) {
            continue;
        }
        let mut wrapper = SurfaceWrapper::new(id.clone(), store.clone(), Arc::clone(&factory));
        wrapper
            .mount(&MountOptions::default(), images)
            .await
            .expect("mount");
        wrappers.insert(id, wrapper);
    }
}

#[tokio::test]
async fn test_full_session() {
    let store = CanvasStore::default();
    let images = images();
    let mut wrappers = HashMap::new();
    mount_missing(&store, &mut wrappers, &images).await;

    let phone = device("iphone-15").expect("device");
    store
        .add_frame(
            &FrameRequest::new(phone.image_url).with_device(phone.kind),
            &images,
        )
        .await
        .expect("frame");
    attach_screenshot(&store, phone, "shots/home.png", &images)
        .await
        .expect("composite");
    store.add_text().expect("text");

    let first = store.selected_id().expect("selected");
    let copy = store.duplicate_item(&first).expect("duplicate");
    mount_missing(&store, &mut wrappers, &images).await;
    let copy_surface = store.surface(&copy).expect("copy mounted");
    assert_eq!(copy_surface.read(|s| s.objects().len()), 2);
    assert!(store
        .selected_surface()
        .is_some_and(|s| s.ptr_eq(&copy_surface)));

    store.move_item(1, 0).expect("move");
    assert_eq!(store.render_ids(), vec![copy.clone(), first.clone()]);
    assert_eq!(store.stable_ids(), vec![first.clone(), copy.clone()]);

    let languages = [Language::new("en", "English"), Language::new("fr", "French")];
    let doc = TranslationDocument::export(&store, &languages).expect("export");
    let en = doc.section("en").expect("english");
    assert_eq!(en.canvases.len(), 2);
    assert_eq!(en.canvases[0].texts[0].canvas_id, copy.as_str());

    assert!(store.delete_item(&copy));
    wrappers.remove(&copy);
    assert_eq!(store.selected_id(), Some(first.clone()));
    assert!(store.selected_surface().is_some());

    let json = doc.to_json_pretty().expect("json");
    let parsed = TranslationDocument::parse(&json).expect("parse");
    assert_eq!(parsed.apply(&store, "en").expect("apply"), 1);
}

#[tokio::test]
async fn test_frame_cap_across_collection() {
    let store = CanvasStore::default();
    let images = images();
    let mut wrappers = HashMap::new();
    store.add_item();
    mount_missing(&store, &mut wrappers, &images).await;

    let request = FrameRequest::new("frames/iphone-15.png");
    for _ in 0..2 {
        store.add_frame(&request, &images).await.expect("frame");
    }
    let err = store
        .add_frame(&request, &images)
        .await
        .expect_err("cap reached");
    assert!(matches!(err, EditorError::FrameLimitReached { limit: 2 }));

    let report = store
        .apply_frame_to_all(&request, &images)
        .await
        .expect("apply");
    assert_eq!(report.applied, vec![CanvasId::numbered(1)]);
    assert_eq!(report.skipped.len(), 1);
}

#[tokio::test]
async fn test_unmount_then_delete() {
    let store = CanvasStore::default();
    let images = images();
    let mut wrappers = HashMap::new();
    mount_missing(&store, &mut wrappers, &images).await;

    let id = CanvasId::numbered(1);
    let surface = store.surface(&id).expect("surface");
    drop(wrappers.remove(&id));
    assert!(surface.is_disposed());
    assert!(matches!(store.lifecycle(&id), Some(Lifecycle::Disposed)));
    assert!(matches!(
        store.add_text(),
        Err(EditorError::SurfaceNotReady(_))
    ));
    assert!(store.delete_item(&id));
    assert!(store.is_empty());
    assert_eq!(store.selected_id(), None);
}
