//! Surface wrapper: owns the one drawing surface of a mounted canvas.
//!
//! Mounting claims the canvas from the store, creates the surface, fills it
//! (clone seed, translation overlay, layout preset) and reports readiness.
//! Unmounting, explicit or on drop, disposes the surface exactly once.

use std::sync::Arc;

use crate::background::Background;
use crate::canvas::CanvasId;
use crate::catalog::{DeviceKind, LayoutPreset, DEFAULT_BACKGROUND};
use crate::error::{EditorResult, SurfaceError};
use crate::fit::{fit_min, PHONE_FRAME_RATIO};
use crate::images::ImageSource;
use crate::object::{ObjectKind, PlacedObject, Placement};
use crate::store::{CanvasStore, MountTicket, SurfaceContext};
use crate::surface::{SurfaceFactory, SurfaceHandle};
use crate::translation::TranslationOverlay;

/// Smallest size a drag-resize may produce.
pub const MIN_DRAG_SIZE: u32 = 120;

/// A layout preset bound to concrete frame artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutFrame {
    /// Arrangement.
    pub preset: LayoutPreset,
    /// Frame artwork URL.
    pub src: String,
    /// Device family of the artwork.
    pub device: Option<DeviceKind>,
}

/// What to put on a surface when it mounts.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Background color for surfaces without a clone seed.
    pub background: String,
    /// Rendering context.
    pub context: SurfaceContext,
    /// Translation overlay.
    pub translation: Option<TranslationOverlay>,
    /// Layout preset frame.
    pub layout: Option<LayoutFrame>,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_string(),
            context: SurfaceContext::Primary,
            translation: None,
            layout: None,
        }
    }
}

impl MountOptions {
    /// Options for a preview mount carrying a translation overlay.
    #[must_use]
    pub fn preview(overlay: TranslationOverlay) -> Self {
        Self {
            context: SurfaceContext::Preview,
            translation: Some(overlay),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
enum Mount {
    Idle,
    /// Installed in the store under this ticket.
    Managed {
        ticket: MountTicket,
        surface: SurfaceHandle,
    },
    /// Preview surface unknown to the store.
    Detached { surface: SurfaceHandle },
    Released,
}

/// Owner of one canvas's drawing surface.
pub struct SurfaceWrapper {
    id: CanvasId,
    store: CanvasStore,
    factory: Arc<dyn SurfaceFactory>,
    mount: Mount,
}

impl std::fmt::Debug for SurfaceWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceWrapper")
            .field("id", &self.id)
            .field("mount", &self.mount)
            .finish_non_exhaustive()
    }
}

impl SurfaceWrapper {
    /// Wrapper for a canvas. Nothing is created until [`Self::mount`].
    #[must_use]
    pub fn new(id: CanvasId, store: CanvasStore, factory: Arc<dyn SurfaceFactory>) -> Self {
        Self {
            id,
            store,
            factory,
            mount: Mount::Idle,
        }
    }

    /// Canvas ID.
    #[must_use]
    pub const fn id(&self) -> &CanvasId {
        &self.id
    }

    /// The owned surface, while mounted.
    #[must_use]
    pub fn surface(&self) -> Option<&SurfaceHandle> {
        match &self.mount {
            Mount::Managed { surface, .. } | Mount::Detached { surface } => Some(surface),
            Mount::Idle | Mount::Released => None,
        }
    }

    /// Whether a surface is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.surface().is_some()
    }

    /// Create and fill the surface, then report it ready.
    ///
    /// Returns `Ok(None)` when there is nothing to mount: the wrapper was
    /// already mounted, the canvas is mounted elsewhere, or the store
    /// rejected the ready report (the new surface is then disposed). Preview
    /// mounts of IDs unknown to the store get a detached surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be created.
    pub async fn mount(
        &mut self,
        options: &MountOptions,
        images: &dyn ImageSource,
    ) -> EditorResult<Option<SurfaceHandle>> {
        if !matches!(self.mount, Mount::Idle) {
            tracing::debug!("Wrapper for {} already mounted", self.id);
            return Ok(None);
        }

        let Some(plan) = self.store.begin_mount(&self.id) else {
            if options.context == SurfaceContext::Preview && !self.store.contains(&self.id) {
                return self.mount_detached(options, images).await.map(Some);
            }
            return Ok(None);
        };

        let mut pending = PendingMount {
            store: &self.store,
            ticket: plan.ticket,
            seed: plan.seed,
            surface: None,
            committed: false,
        };

        let seed_size = pending
            .seed
            .as_ref()
            .filter(|seed| !seed.is_disposed())
            .map(|seed| (seed.width(), seed.height()));
        #[allow(clippy::cast_precision_loss)]
        let (width, height) = seed_size.unwrap_or((plan.width as f32, plan.height as f32));

        let surface = self
            .factory
            .create(width, height, &Background::solid(&options.background))?;
        pending.surface = Some(surface.clone());

        if let Some(seed) = &pending.seed {
            copy_seed(seed, &surface);
        }
        populate(&surface, options, images).await;

        if !self
            .store
            .on_surface_ready(&pending.ticket, surface.clone(), options.context)
        {
            return Ok(None);
        }
        let ticket = pending.commit();
        self.mount = Mount::Managed {
            ticket,
            surface: surface.clone(),
        };
        Ok(Some(surface))
    }

    async fn mount_detached(
        &mut self,
        options: &MountOptions,
        images: &dyn ImageSource,
    ) -> EditorResult<SurfaceHandle> {
        let config = self.store.config();
        #[allow(clippy::cast_precision_loss)]
        let surface = self.factory.create(
            config.canvas_width as f32,
            config.canvas_height as f32,
            &Background::solid(&options.background),
        )?;
        populate(&surface, options, images).await;
        self.mount = Mount::Detached {
            surface: surface.clone(),
        };
        tracing::debug!("Preview surface {} mounted", self.id);
        Ok(surface)
    }

    /// Dispose the surface and tell the store. A second call is a no-op.
    pub fn unmount(&mut self) {
        match std::mem::replace(&mut self.mount, Mount::Released) {
            Mount::Managed { ticket, surface } => {
                release(&self.id, &surface);
                self.store.mark_disposed(ticket.id(), &surface);
            }
            Mount::Detached { surface } => release(&self.id, &surface),
            Mount::Idle | Mount::Released => {}
        }
    }

    /// Resize the canvas. Managed surfaces go through the store so the item
    /// override is recorded.
    pub fn resize(&self, width: u32, height: u32) {
        match &self.mount {
            Mount::Detached { surface } => {
                #[allow(clippy::cast_precision_loss)]
                let result = surface.write(|s| {
                    s.set_dimensions(width as f32, height as f32)?;
                    s.render()
                });
                if let Err(e) = result {
                    tracing::debug!("Ignoring resize failure on {}: {e}", self.id);
                }
            }
            _ => {
                self.store.resize_item(&self.id, width, height);
            }
        }
    }

    /// Resize from a drag gesture that started at `start` and moved by
    /// `delta` screen pixels at the given zoom. Returns the new size.
    pub fn resize_by_drag(&self, start: (u32, u32), delta: (f32, f32), zoom: f32) -> (u32, u32) {
        let size = drag_size(start, delta, zoom);
        self.resize(size.0, size.1);
        size
    }

    /// Duplicate this canvas in the store.
    pub fn duplicate(&self) -> Option<CanvasId> {
        self.store.duplicate_item(&self.id)
    }
}

impl Drop for SurfaceWrapper {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// New canvas size for a resize drag. Never smaller than
/// [`MIN_DRAG_SIZE`] on either side.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn drag_size(start: (u32, u32), delta: (f32, f32), zoom: f32) -> (u32, u32) {
    let scale = if zoom > 0.0 { zoom } else { 1.0 };
    let axis = |start: u32, d: f32| {
        let v = (start as f32 + d / scale).round().max(MIN_DRAG_SIZE as f32);
        v as u32
    };
    (axis(start.0, delta.0), axis(start.1, delta.1))
}

/// A claimed mount that has not reported ready yet.
///
/// Dropping it uncommitted (an error return, a rejected ready report, or the
/// mount future being dropped mid-flight) disposes the new surface and hands
/// the canvas and its clone seed back to the store.
struct PendingMount<'a> {
    store: &'a CanvasStore,
    ticket: MountTicket,
    seed: Option<SurfaceHandle>,
    surface: Option<SurfaceHandle>,
    committed: bool,
}

impl PendingMount<'_> {
    fn commit(mut self) -> MountTicket {
        self.committed = true;
        self.ticket.clone()
    }
}

impl Drop for PendingMount<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(surface) = self.surface.take() {
            release(self.ticket.id(), &surface);
        }
        self.store.abort_mount(&self.ticket, self.seed.take());
    }
}

fn release(id: &CanvasId, surface: &SurfaceHandle) {
    match surface.dispose() {
        Ok(()) => tracing::debug!("Released surface of {id}"),
        Err(SurfaceError::Disposed) => tracing::debug!("Surface of {id} already released"),
        Err(e) => tracing::warn!("Failed to release surface of {id}: {e}"),
    }
}

/// Copy the seed's background and objects (with fresh IDs) onto `target`.
fn copy_seed(seed: &SurfaceHandle, target: &SurfaceHandle) {
    let snapshot = match seed.read(|s| s.snapshot()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Clone seed unavailable: {e}");
            return;
        }
    };
    let result = target.write(|s| {
        s.set_background(snapshot.background.clone())?;
        for object in &snapshot.objects {
            s.add_object(object.duplicate())?;
        }
        s.render()
    });
    if let Err(e) = result {
        tracing::warn!("Failed to copy clone seed: {e}");
    }
}

/// Apply the translation overlay and the layout frame. Failures are logged;
/// the surface stays usable.
async fn populate(surface: &SurfaceHandle, options: &MountOptions, images: &dyn ImageSource) {
    if let Some(overlay) = &options.translation {
        if let Err(e) = surface.write(|s| overlay.apply_to(s)) {
            tracing::warn!("Failed to apply translation overlay: {e}");
        }
    }
    if let Some(layout) = &options.layout {
        if let Err(e) = place_layout_frame(surface, layout, images).await {
            tracing::warn!("Failed to place layout {}: {e}", layout.preset.id);
        }
    }
    if let Err(e) = surface.write(|s| s.render()) {
        tracing::debug!("Render after populate failed: {e}");
    }
}

async fn place_layout_frame(
    surface: &SurfaceHandle,
    layout: &LayoutFrame,
    images: &dyn ImageSource,
) -> EditorResult<()> {
    let image = images.load(&layout.src).await?;
    surface.write(|s| {
        #[allow(clippy::cast_precision_loss)]
        let scale = fit_min(
            s.width(),
            s.height(),
            image.width.max(1) as f32,
            image.height.max(1) as f32,
        ) * PHONE_FRAME_RATIO;
        let frame = PlacedObject::new(ObjectKind::Frame {
            src: image.src.clone(),
            width: image.width,
            height: image.height,
            device: layout.device,
        })
        .with_placement(Placement {
            angle: layout.preset.angle,
            ..Placement::centered(layout.preset.left, layout.preset.top, scale)
        })
        .with_locked(true);
        s.add_object(frame)?;
        Ok::<_, SurfaceError>(())
    })?;
    Ok(())
}

impl From<LayoutFrame> for MountOptions {
    fn from(layout: LayoutFrame) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }
}
