//! Screenshot compositing: insert a screenshot behind the active device
//! frame and group the two.

use crate::catalog::DeviceSpec;
use crate::error::{EditorError, EditorResult, SurfaceError};
use crate::images::ImageSource;
use crate::object::{ClipRect, ObjectId, ObjectKind, PlacedObject, Placement};
use crate::store::CanvasStore;
use crate::surface::SurfaceHandle;

/// Horizontal overscan applied to the screenshot so it reaches under the
/// frame bezel.
pub const OVERSCAN_X: f32 = 1.025;

/// Vertical overscan.
pub const OVERSCAN_Y: f32 = 1.015;

/// Screenshot scale for a frame scaled by `(frame_scale_x, frame_scale_y)`.
///
/// Tablets cover the nominal screen, phones fit inside it.
#[must_use]
pub fn screenshot_scale(
    device: &DeviceSpec,
    frame_scale_x: f32,
    frame_scale_y: f32,
    image_width: f32,
    image_height: f32,
) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let sx = device.screen_width as f32 * frame_scale_x / image_width;
    #[allow(clippy::cast_precision_loss)]
    let sy = device.screen_height as f32 * frame_scale_y / image_height;
    if device.kind.is_tablet() {
        sx.max(sy)
    } else {
        sx.min(sy)
    }
}

/// Composite a screenshot into the active frame of the selected canvas.
///
/// The screenshot is upscaled to at least the device's screen size, clipped
/// to a rounded rectangle and grouped with a copy of the frame, which the
/// group replaces. The group gets a delete affordance and becomes active.
///
/// # Errors
///
/// Returns [`EditorError::NoCanvasSelected`] or
/// [`EditorError::SurfaceNotReady`] without a usable canvas,
/// [`EditorError::NoFrameSelected`] if the active object is not a frame, and
/// [`EditorError::ImageLoad`] if the screenshot cannot be loaded.
pub async fn attach_screenshot(
    store: &CanvasStore,
    device: &DeviceSpec,
    screenshot: &str,
    images: &dyn ImageSource,
) -> EditorResult<ObjectId> {
    let surface = store.require_selected_surface()?;
    let frame = active_frame(&surface)?;

    let loaded = images.load(screenshot).await?;
    let image = if loaded.width >= device.screen_width && loaded.height >= device.screen_height {
        loaded
    } else {
        images
            .upscale(&loaded, device.screen_width, device.screen_height)
            .await?
    };

    #[allow(clippy::cast_precision_loss)]
    let (iw, ih) = (image.width.max(1) as f32, image.height.max(1) as f32);
    let scale = screenshot_scale(
        device,
        frame.placement.scale_x,
        frame.placement.scale_y,
        iw,
        ih,
    );
    tracing::debug!(
        "Compositing {}x{} screenshot into frame {} at scale {scale}",
        image.width,
        image.height,
        frame.id
    );

    let mut inner = PlacedObject::new(ObjectKind::Image {
        src: image.src.clone(),
        width: image.width,
        height: image.height,
        clip: Some(ClipRect {
            width: iw,
            height: ih,
            rx: device.rx,
            ry: device.ry,
        }),
    })
    .with_placement(Placement {
        scale_x: scale * OVERSCAN_X,
        scale_y: scale * OVERSCAN_Y,
        angle: frame.placement.angle,
        ..Placement::centered(0.0, 0.0, 1.0)
    });
    inner.selectable = false;

    let mut frame_copy = frame.duplicate();
    frame_copy.placement.left = 0.0;
    frame_copy.placement.top = 0.0;

    let group = PlacedObject::new(ObjectKind::Group {
        children: vec![inner, frame_copy],
    })
    .with_placement(Placement::centered(
        frame.placement.left,
        frame.placement.top,
        1.0,
    ))
    .with_delete_control();

    let group_id = surface.write(|s| {
        // The frame may have gone away while the screenshot loaded.
        s.remove_object(frame.id)?;
        let id = s.add_object(group)?;
        s.render()?;
        Ok::<_, SurfaceError>(id)
    })?;
    surface.set_active_object(Some(group_id))?;
    Ok(group_id)
}

fn active_frame(surface: &SurfaceHandle) -> EditorResult<PlacedObject> {
    surface
        .read(|s| s.active_object().filter(|o| o.is_frame()).cloned())
        .ok_or(EditorError::NoFrameSelected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::device;
    use crate::images::{FixedImageSource, LoadedImage};
    use crate::store::{FrameRequest, SurfaceContext};
    use crate::surface::{MemorySurfaceFactory, SurfaceFactory};

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: FixedImageSource,
        upscales: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn load(&self, src: &str) -> EditorResult<LoadedImage> {
            self.inner.load(src).await
        }

        async fn upscale(
            &self,
            image: &LoadedImage,
            min_width: u32,
            min_height: u32,
        ) -> EditorResult<LoadedImage> {
            self.upscales.fetch_add(1, Ordering::SeqCst);
            Ok(LoadedImage {
                src: format!("{}#upscaled", image.src),
                width: image.width.max(min_width),
                height: image.height.max(min_height),
            })
        }
    }

    fn source() -> CountingSource {
        CountingSource {
            inner: FixedImageSource::new()
                .with_image("frame.png", 400, 800)
                .with_image("small.png", 100, 200)
                .with_image("big.png", 1290, 2796),
            upscales: AtomicUsize::new(0),
        }
    }

    fn mounted_store() -> CanvasStore {
        let store = CanvasStore::default();
        for id in store.stable_ids() {
            let plan = store.begin_mount(&id).expect("plan");
            #[allow(clippy::cast_precision_loss)]
            let surface = MemorySurfaceFactory
                .create(
                    plan.width as f32,
                    plan.height as f32,
                    &crate::background::Background::default(),
                )
                .expect("surface");
            assert!(store.on_surface_ready(&plan.ticket, surface, SurfaceContext::Primary));
        }
        store
    }

    #[test]
    fn test_screenshot_scale_phone_fits_tablet_covers() {
        let phone = device("iphone-15-pro-max").expect("device");
        let s = screenshot_scale(phone, 0.5, 0.5, 1290.0, 1398.0);
        assert!((s - 0.5).abs() < 1e-5);
        let tablet = device("ipad-pro-13").expect("device");
        #[allow(clippy::cast_precision_loss)]
        let w = tablet.screen_width as f32;
        let s = screenshot_scale(tablet, 1.0, 1.0, w, 1.0);
        assert!(s > 1.0);
    }

    #[tokio::test]
    async fn test_requires_selected_canvas() {
        let store = CanvasStore::default();
        let phone = device("iphone-15").expect("device");
        let err = attach_screenshot(&store, phone, "big.png", &source())
            .await
            .expect_err("not mounted");
        assert!(matches!(err, EditorError::SurfaceNotReady(_)));
    }

    #[tokio::test]
    async fn test_requires_active_frame() {
        let store = mounted_store();
        store.add_text().expect("text");
        let phone = device("iphone-15").expect("device");
        let err = attach_screenshot(&store, phone, "big.png", &source())
            .await
            .expect_err("text is active");
        assert!(matches!(err, EditorError::NoFrameSelected));
        assert_eq!(err.to_string(), "Please select a phone frame first.");
    }

    #[tokio::test]
    async fn test_replaces_frame_with_group() {
        let store = mounted_store();
        let images = source();
        let phone = device("iphone-15-pro-max").expect("device");
        let frame_id = store
            .add_frame(&FrameRequest::new("frame.png").with_device(phone.kind), &images)
            .await
            .expect("frame");
        let group_id = attach_screenshot(&store, phone, "small.png", &images)
            .await
            .expect("composite");

        assert_eq!(images.upscales.load(Ordering::SeqCst), 1);
        let surface = store.selected_surface().expect("surface");
        let objects = surface.read(|s| s.objects().to_vec());
        assert_eq!(objects.len(), 1);
        let group = &objects[0];
        assert_eq!(group.id, group_id);
        assert!(group.deletable);
        assert_eq!(
            surface.read(|s| s.active_object().map(|o| o.id)),
            Some(group_id)
        );

        let ObjectKind::Group { children } = &group.kind else {
            panic!("expected group");
        };
        assert_eq!(children.len(), 2);
        assert!(!children[0].selectable);
        assert!(matches!(
            &children[0].kind,
            ObjectKind::Image { src, width: 1290, height: 2796, clip: Some(_) } if src == "small.png#upscaled"
        ));
        assert!(children[1].is_frame());
        assert_ne!(children[1].id, frame_id);
        assert!(children[0].placement.scale_x > children[0].placement.scale_y);
    }

    #[tokio::test]
    async fn test_large_screenshot_is_not_resampled() {
        let store = mounted_store();
        let images = source();
        let phone = device("iphone-15-pro-max").expect("device");
        store
            .add_frame(&FrameRequest::new("frame.png"), &images)
            .await
            .expect("frame");
        attach_screenshot(&store, phone, "big.png", &images)
            .await
            .expect("composite");
        assert_eq!(images.upscales.load(Ordering::SeqCst), 0);
    }
}
