//! The canvas collection store.
//!
//! [`CanvasStore`] is the single owner of the canvas collection: the stable
//! (insertion) order, the user-controlled render order, the per-canvas
//! mount lifecycle and the selection. It is a cheap clonable handle over
//! shared state, so the shell, editors, wrappers and export pipeline can all
//! hold one without reaching for a global.
//!
//! Lock order is always store, then surface. Surface observers are never
//! invoked while the store lock is held.
//!
//! # Example
//!
//! ```
//! use shotframe_core::store::CanvasStore;
//!
//! let store = CanvasStore::default();
//! assert_eq!(store.len(), 1);
//!
//! let id = store.add_item();
//! assert_eq!(id.as_str(), "canvas-2");
//! assert_eq!(store.selected_id(), Some(id));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::canvas::{CanvasId, CanvasItem, CanvasRecord, Lifecycle};
use crate::catalog::DeviceKind;
use crate::error::{EditorError, EditorResult, SurfaceError};
use crate::fit::frame_scale;
use crate::images::{ImageSource, LoadedImage};
use crate::object::{ObjectId, ObjectKind, OriginX, OriginY, PlacedObject, Placement, TextStyle};
use crate::surface::SurfaceHandle;

/// Maximum number of device frames on one surface.
pub const MAX_FRAMES_PER_SURFACE: usize = 2;

/// Content of a freshly added text object.
pub const DEFAULT_TEXT: &str = "Insert your text here";

/// Top offset of a freshly added text object.
const DEFAULT_TEXT_TOP: f32 = 30.0;

/// Collection-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Canvas width used when an item has no override.
    pub canvas_width: u32,
    /// Canvas height used when an item has no override.
    pub canvas_height: u32,
    /// Start with a `canvas-1` entry.
    pub seed_first_canvas: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            canvas_width: 450,
            canvas_height: 800,
            seed_first_canvas: true,
        }
    }
}

/// Rendering context a surface was mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceContext {
    /// The main editing view.
    Primary,
    /// A secondary view such as a translated-language preview.
    Preview,
}

/// Proof that a wrapper owns the pending mount of one canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTicket {
    id: CanvasId,
    generation: u64,
}

impl MountTicket {
    /// Canvas being mounted.
    #[must_use]
    pub const fn id(&self) -> &CanvasId {
        &self.id
    }

    /// Mount generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything a wrapper needs to create a surface for a canvas.
#[derive(Debug, Clone)]
pub struct MountPlan {
    /// Ticket to present when the surface is ready.
    pub ticket: MountTicket,
    /// Width from the item override or the store default.
    pub width: u32,
    /// Height from the item override or the store default.
    pub height: u32,
    /// Surface to copy contents from, if this canvas is a duplicate.
    pub seed: Option<SurfaceHandle>,
}

/// A device frame to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRequest {
    /// Frame artwork URL.
    pub src: String,
    /// Device family, if known.
    pub device: Option<DeviceKind>,
    /// Cover the surface instead of the default contain scaling.
    pub fill: bool,
}

impl FrameRequest {
    /// Request for the given artwork with default scaling.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            device: None,
            fill: false,
        }
    }

    /// Set the device family.
    #[must_use]
    pub const fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = Some(device);
        self
    }

    /// Use cover scaling.
    #[must_use]
    pub const fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }
}

/// Why a canvas was skipped by a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The surface already holds the maximum number of frames.
    FrameLimit,
    /// The surface is not mounted or was disposed.
    NotReady,
    /// The surface reported an error.
    Failed(String),
}

/// Outcome of [`CanvasStore::apply_frame_to_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Canvases that received the frame.
    pub applied: Vec<CanvasId>,
    /// Canvases that were skipped.
    pub skipped: Vec<(CanvasId, SkipReason)>,
}

impl ApplyReport {
    /// Aggregate warning for the skipped canvases.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let names: Vec<&str> = self.skipped.iter().map(|(id, _)| id.as_str()).collect();
        Some(format!(
            "Frame not added to {} canvas(es): {}",
            self.skipped.len(),
            names.join(", ")
        ))
    }
}

#[derive(Debug, Default)]
struct Collection {
    /// Insertion order.
    stable: Vec<CanvasId>,
    /// User-controlled order; always a permutation of `stable`.
    render_order: Vec<CanvasId>,
    records: HashMap<CanvasId, CanvasRecord>,
    selected_id: Option<CanvasId>,
    selected_surface: Option<SurfaceHandle>,
    /// Read-once sources for duplicated canvases.
    clone_seeds: HashMap<CanvasId, SurfaceHandle>,
    next_generation: u64,
}

impl Collection {
    fn item(&self, id: &CanvasId) -> Option<CanvasItem> {
        self.records.get(id).map(|record| CanvasItem {
            id: id.clone(),
            surface: record.lifecycle.surface().cloned(),
            width: record.width,
            height: record.height,
        })
    }

    fn live_surface(&self, id: &CanvasId) -> Option<SurfaceHandle> {
        self.records
            .get(id)
            .and_then(|r| r.lifecycle.surface().cloned())
    }

    fn insert_after(order: &mut Vec<CanvasId>, anchor: &CanvasId, id: CanvasId) {
        match order.iter().position(|x| x == anchor) {
            Some(pos) => order.insert(pos + 1, id),
            None => order.push(id),
        }
    }
}

/// Shared handle to the canvas collection.
#[derive(Debug, Clone)]
pub struct CanvasStore {
    config: StoreConfig,
    state: Arc<RwLock<Collection>>,
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl CanvasStore {
    /// Create a store. Seeds `canvas-1` (selected) when configured to.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let mut collection = Collection::default();
        if config.seed_first_canvas {
            let id = CanvasId::numbered(1);
            collection.stable.push(id.clone());
            collection.render_order.push(id.clone());
            collection.records.insert(id.clone(), CanvasRecord::default());
            collection.selected_id = Some(id);
        }
        Self {
            config,
            state: Arc::new(RwLock::new(collection)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Collection> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collection> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Number of canvases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().stable.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().stable.is_empty()
    }

    /// Whether a canvas exists.
    #[must_use]
    pub fn contains(&self, id: &CanvasId) -> bool {
        self.read().records.contains_key(id)
    }

    /// Canvas IDs in stable order.
    #[must_use]
    pub fn stable_ids(&self) -> Vec<CanvasId> {
        self.read().stable.clone()
    }

    /// Canvas IDs in render order.
    #[must_use]
    pub fn render_ids(&self) -> Vec<CanvasId> {
        self.read().render_order.clone()
    }

    /// Items in stable order.
    #[must_use]
    pub fn items(&self) -> Vec<CanvasItem> {
        let state = self.read();
        state.stable.iter().filter_map(|id| state.item(id)).collect()
    }

    /// Items in render order.
    #[must_use]
    pub fn render_items(&self) -> Vec<CanvasItem> {
        let state = self.read();
        state
            .render_order
            .iter()
            .filter_map(|id| state.item(id))
            .collect()
    }

    /// One item.
    #[must_use]
    pub fn item(&self, id: &CanvasId) -> Option<CanvasItem> {
        self.read().item(id)
    }

    /// Live surface of a canvas.
    #[must_use]
    pub fn surface(&self, id: &CanvasId) -> Option<SurfaceHandle> {
        self.read().live_surface(id)
    }

    /// Lifecycle of a canvas.
    #[must_use]
    pub fn lifecycle(&self, id: &CanvasId) -> Option<Lifecycle> {
        self.read().records.get(id).map(|r| r.lifecycle.clone())
    }

    /// Selected canvas ID.
    #[must_use]
    pub fn selected_id(&self) -> Option<CanvasId> {
        self.read().selected_id.clone()
    }

    /// Live surface of the selected canvas.
    #[must_use]
    pub fn selected_surface(&self) -> Option<SurfaceHandle> {
        self.read().selected_surface.clone()
    }

    /// Effective `(width, height)` of a canvas.
    #[must_use]
    pub fn dimensions(&self, id: &CanvasId) -> Option<(u32, u32)> {
        self.item(id)
            .map(|item| item.dimensions_or(self.config.canvas_width, self.config.canvas_height))
    }

    // ---------------------------------------------------------------------
    // Structural mutations
    // ---------------------------------------------------------------------

    /// Append a new canvas named `canvas-<max + 1>` and select it.
    pub fn add_item(&self) -> CanvasId {
        let mut state = self.write();
        let mut next = state
            .stable
            .iter()
            .filter_map(CanvasId::default_number)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let mut id = CanvasId::numbered(next);
        while state.records.contains_key(&id) {
            next = next.saturating_add(1);
            id = CanvasId::numbered(next);
        }

        state.stable.push(id.clone());
        state.render_order.push(id.clone());
        state.records.insert(id.clone(), CanvasRecord::default());
        state.clone_seeds.remove(&id);
        state.selected_id = Some(id.clone());
        state.selected_surface = None;
        tracing::debug!("Added canvas {id} ({} total)", state.stable.len());
        id
    }

    /// Duplicate a ready canvas.
    ///
    /// The copy is named `<base> (<k>)` with the smallest free `k`, placed
    /// right after the source, and selected. Its first mount copies the
    /// source surface. Returns `None` if the source has no live surface.
    pub fn duplicate_item(&self, id: &CanvasId) -> Option<CanvasId> {
        let mut state = self.write();
        let Some(record) = state.records.get(id) else {
            tracing::debug!("Ignoring duplicate of unknown canvas {id}");
            return None;
        };
        let Some(source) = record.lifecycle.surface().cloned() else {
            tracing::debug!("Ignoring duplicate of {id}: no live surface");
            return None;
        };
        let (width, height) = (record.width, record.height);

        let mut k = 1;
        let mut new_id = id.with_copy_suffix(k);
        while state.records.contains_key(&new_id) {
            k += 1;
            new_id = id.with_copy_suffix(k);
        }

        Collection::insert_after(&mut state.stable, id, new_id.clone());
        Collection::insert_after(&mut state.render_order, id, new_id.clone());
        state.records.insert(
            new_id.clone(),
            CanvasRecord {
                lifecycle: Lifecycle::Unmounted,
                width,
                height,
            },
        );
        state.clone_seeds.insert(new_id.clone(), source);
        state.selected_id = Some(new_id.clone());
        state.selected_surface = None;
        tracing::debug!("Duplicated canvas {id} as {new_id}");
        Some(new_id)
    }

    /// Delete a canvas, releasing its surface.
    ///
    /// If the deleted canvas was selected, selection moves to the next canvas
    /// in stable order, else the previous one, else none. Disposal failures
    /// are logged and ignored. Returns whether a canvas was removed.
    pub fn delete_item(&self, id: &CanvasId) -> bool {
        let mut state = self.write();
        let Some(pos) = state.stable.iter().position(|x| x == id) else {
            tracing::debug!("Ignoring delete of unknown canvas {id}");
            return false;
        };

        if let Some(record) = state.records.remove(id) {
            if let Lifecycle::Ready(surface) = record.lifecycle {
                if let Err(e) = surface.dispose() {
                    tracing::warn!("Failed to dispose surface of {id}: {e}");
                }
            }
        }
        state.stable.remove(pos);
        state.render_order.retain(|x| x != id);
        state.clone_seeds.remove(id);

        if state.selected_id.as_ref() == Some(id) {
            let next = state
                .stable
                .get(pos)
                .or_else(|| pos.checked_sub(1).and_then(|p| state.stable.get(p)))
                .cloned();
            state.selected_surface = next.as_ref().and_then(|n| state.live_surface(n));
            state.selected_id = next;
        }
        tracing::debug!(
            "Deleted canvas {id}; selection now {:?}",
            state.selected_id.as_ref().map(CanvasId::as_str)
        );
        true
    }

    /// Replace the render order.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidReorder`] unless `order` is a
    /// permutation of the current canvas IDs. State is untouched on error.
    pub fn reorder(&self, order: Vec<CanvasId>) -> EditorResult<()> {
        let mut state = self.write();
        if order.len() != state.stable.len() {
            return Err(EditorError::InvalidReorder(format!(
                "expected {} ids, got {}",
                state.stable.len(),
                order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(order.len());
        for id in &order {
            if !state.records.contains_key(id) {
                return Err(EditorError::InvalidReorder(format!("unknown canvas {id}")));
            }
            if !seen.insert(id) {
                return Err(EditorError::InvalidReorder(format!("duplicate canvas {id}")));
            }
        }
        state.render_order = order;
        tracing::debug!("Render order updated");
        Ok(())
    }

    /// Move the canvas at render position `from` to position `to`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidReorder`] if either index is out of
    /// range.
    pub fn move_item(&self, from: usize, to: usize) -> EditorResult<()> {
        let mut order = self.render_ids();
        if from >= order.len() || to >= order.len() {
            return Err(EditorError::InvalidReorder(format!(
                "move {from} -> {to} out of range for {} canvases",
                order.len()
            )));
        }
        let id = order.remove(from);
        order.insert(to, id);
        self.reorder(order)
    }

    /// Select a canvas. Returns `false` for unknown or disposed canvases.
    pub fn select(&self, id: &CanvasId) -> bool {
        let mut state = self.write();
        let Some(record) = state.records.get(id) else {
            tracing::debug!("Ignoring select of unknown canvas {id}");
            return false;
        };
        if matches!(record.lifecycle, Lifecycle::Disposed) {
            tracing::debug!("Ignoring select of disposed canvas {id}");
            return false;
        }
        let surface = record.lifecycle.surface().cloned();
        state.selected_id = Some(id.clone());
        state.selected_surface = surface;
        true
    }

    /// Update a canvas's size and push it to the live surface.
    ///
    /// Errors from a concurrently disposed surface are ignored. Returns
    /// `false` for unknown or disposed canvases.
    pub fn resize_item(&self, id: &CanvasId, width: u32, height: u32) -> bool {
        let surface = {
            let mut state = self.write();
            let Some(record) = state.records.get_mut(id) else {
                return false;
            };
            if matches!(record.lifecycle, Lifecycle::Disposed) {
                return false;
            }
            record.width = Some(width);
            record.height = Some(height);
            record.lifecycle.surface().cloned()
        };

        if let Some(surface) = surface {
            #[allow(clippy::cast_precision_loss)]
            let result = surface.write(|s| {
                s.set_dimensions(width as f32, height as f32)?;
                s.render()
            });
            if let Err(e) = result {
                tracing::debug!("Ignoring resize failure on {id}: {e}");
            }
        }
        tracing::debug!("Resized canvas {id} to {width}x{height}");
        true
    }

    // ---------------------------------------------------------------------
    // Mount lifecycle
    // ---------------------------------------------------------------------

    /// Claim the mount of an unmounted canvas.
    ///
    /// Hands out the canvas's clone seed at most once. Returns `None` if the
    /// canvas is unknown or is not `Unmounted`.
    pub fn begin_mount(&self, id: &CanvasId) -> Option<MountPlan> {
        let mut state = self.write();
        state.next_generation += 1;
        let generation = state.next_generation;
        let config = self.config;

        let record = state.records.get_mut(id)?;
        if !matches!(record.lifecycle, Lifecycle::Unmounted) {
            tracing::debug!(
                "Refusing mount of {id}: already {}",
                record.lifecycle.name()
            );
            return None;
        }
        record.lifecycle = Lifecycle::Mounting { generation };
        let width = record.width.unwrap_or(config.canvas_width);
        let height = record.height.unwrap_or(config.canvas_height);
        let seed = state.clone_seeds.remove(id);

        Some(MountPlan {
            ticket: MountTicket {
                id: id.clone(),
                generation,
            },
            width,
            height,
            seed,
        })
    }

    /// Give up a pending mount, returning the canvas to `Unmounted`.
    pub fn cancel_mount(&self, ticket: &MountTicket) {
        let mut state = self.write();
        if let Some(record) = state.records.get_mut(&ticket.id) {
            if matches!(record.lifecycle, Lifecycle::Mounting { generation } if generation == ticket.generation)
            {
                record.lifecycle = Lifecycle::Unmounted;
            }
        }
    }

    /// Hand back a mount that never reported ready.
    ///
    /// Like [`Self::cancel_mount`], but the clone seed goes back to the store
    /// so the next mount still copies it. Stale tickets are ignored.
    pub fn abort_mount(&self, ticket: &MountTicket, seed: Option<SurfaceHandle>) {
        let mut state = self.write();
        let Some(record) = state.records.get_mut(&ticket.id) else {
            return;
        };
        if !matches!(record.lifecycle, Lifecycle::Mounting { generation } if generation == ticket.generation)
        {
            return;
        }
        record.lifecycle = Lifecycle::Unmounted;
        if let Some(seed) = seed.filter(|s| !s.is_disposed()) {
            state.clone_seeds.insert(ticket.id.clone(), seed);
        }
        tracing::debug!("Mount of {} abandoned", ticket.id);
    }

    /// Install a ready surface.
    ///
    /// Returns `false` (and installs nothing) if the canvas was deleted, the
    /// ticket is stale, or a surface is already installed; the caller must
    /// then dispose the surface it created. Primary-context surfaces of the
    /// selected canvas become the selected surface. Preview-context surfaces
    /// never do.
    pub fn on_surface_ready(
        &self,
        ticket: &MountTicket,
        surface: SurfaceHandle,
        context: SurfaceContext,
    ) -> bool {
        let mut state = self.write();
        let Some(record) = state.records.get_mut(&ticket.id) else {
            tracing::debug!("Surface ready for deleted canvas {}", ticket.id);
            return false;
        };
        match record.lifecycle {
            Lifecycle::Mounting { generation } if generation == ticket.generation => {}
            _ => {
                tracing::debug!(
                    "Stale ready for {} (generation {}, state {})",
                    ticket.id,
                    ticket.generation,
                    record.lifecycle.name()
                );
                return false;
            }
        }
        record.lifecycle = Lifecycle::Ready(surface.clone());

        if context == SurfaceContext::Primary && state.selected_id.as_ref() == Some(&ticket.id) {
            state.selected_surface = Some(surface);
        }
        tracing::debug!("Canvas {} ready ({context:?})", ticket.id);
        true
    }

    /// Record that a wrapper released the given surface. Terminal.
    ///
    /// Returns `false` unless `surface` is the canvas's installed surface.
    pub fn mark_disposed(&self, id: &CanvasId, surface: &SurfaceHandle) -> bool {
        let mut state = self.write();
        let Some(record) = state.records.get_mut(id) else {
            return false;
        };
        match &record.lifecycle {
            Lifecycle::Ready(current) if current.ptr_eq(surface) => {}
            _ => return false,
        }
        record.lifecycle = Lifecycle::Disposed;
        if state
            .selected_surface
            .as_ref()
            .is_some_and(|s| s.ptr_eq(surface))
        {
            state.selected_surface = None;
        }
        tracing::debug!("Canvas {id} disposed");
        true
    }

    // ---------------------------------------------------------------------
    // Object operations on the selected surface
    // ---------------------------------------------------------------------

    /// The selected canvas's live surface.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoCanvasSelected`] without a selection and
    /// [`EditorError::SurfaceNotReady`] if its surface is absent or
    /// disposed.
    pub fn require_selected_surface(&self) -> EditorResult<SurfaceHandle> {
        let state = self.read();
        let id = state
            .selected_id
            .clone()
            .ok_or(EditorError::NoCanvasSelected)?;
        match &state.selected_surface {
            Some(surface) if !surface.is_disposed() => Ok(surface.clone()),
            _ => Err(EditorError::SurfaceNotReady(id)),
        }
    }

    /// Add a device frame to the selected surface and make it active.
    ///
    /// # Errors
    ///
    /// Returns a selection error, [`EditorError::FrameLimitReached`] if the
    /// surface already holds two frames (nothing is added), or an image
    /// load error.
    pub async fn add_frame(
        &self,
        request: &FrameRequest,
        images: &dyn ImageSource,
    ) -> EditorResult<ObjectId> {
        let surface = self.require_selected_surface()?;
        if surface.read(|s| s.scene().frame_count()) >= MAX_FRAMES_PER_SURFACE {
            return Err(EditorError::FrameLimitReached {
                limit: MAX_FRAMES_PER_SURFACE,
            });
        }
        let image = images.load(&request.src).await?;
        place_frame(&surface, &image, request)
    }

    /// Add a device frame to every ready surface.
    ///
    /// The image is loaded once. Canvases at the frame cap or without a live
    /// surface are skipped and listed in the report.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoCanvases`] for an empty collection or an
    /// image load error.
    pub async fn apply_frame_to_all(
        &self,
        request: &FrameRequest,
        images: &dyn ImageSource,
    ) -> EditorResult<ApplyReport> {
        let targets: Vec<(CanvasId, Option<SurfaceHandle>)> = {
            let state = self.read();
            state
                .stable
                .iter()
                .map(|id| (id.clone(), state.live_surface(id)))
                .collect()
        };
        if targets.is_empty() {
            return Err(EditorError::NoCanvases);
        }
        let image = images.load(&request.src).await?;

        let mut report = ApplyReport::default();
        for (id, surface) in targets {
            let Some(surface) = surface else {
                report.skipped.push((id, SkipReason::NotReady));
                continue;
            };
            match place_frame(&surface, &image, request) {
                Ok(_) => report.applied.push(id),
                Err(EditorError::FrameLimitReached { .. }) => {
                    report.skipped.push((id, SkipReason::FrameLimit));
                }
                Err(EditorError::Surface(SurfaceError::Disposed)) => {
                    report.skipped.push((id, SkipReason::NotReady));
                }
                Err(e) => report.skipped.push((id, SkipReason::Failed(e.to_string()))),
            }
        }
        if let Some(warning) = report.warning() {
            tracing::warn!("{warning}");
        }
        Ok(report)
    }

    /// Add the default text object to the selected surface, centered
    /// horizontally near the top, and make it active.
    ///
    /// # Errors
    ///
    /// Returns a selection error or a surface error.
    pub fn add_text(&self) -> EditorResult<ObjectId> {
        let surface = self.require_selected_surface()?;
        let id = surface.write(|s| {
            let text = PlacedObject::new(ObjectKind::Text {
                content: DEFAULT_TEXT.to_string(),
                style: TextStyle::default(),
            })
            .with_placement(Placement {
                left: s.width() / 2.0,
                top: DEFAULT_TEXT_TOP,
                origin_x: OriginX::Center,
                origin_y: OriginY::Top,
                ..Placement::default()
            });
            let id = s.add_object(text)?;
            s.render()?;
            Ok::<_, SurfaceError>(id)
        })?;
        surface.set_active_object(Some(id))?;
        Ok(id)
    }

    /// Remove one object from the selected surface (the delete affordance).
    /// Returns whether the object existed.
    ///
    /// # Errors
    ///
    /// Returns a selection error.
    pub fn delete_object(&self, object: ObjectId) -> EditorResult<bool> {
        let surface = self.require_selected_surface()?;
        match surface.remove_object(object) {
            Ok(_) => {
                if let Err(e) = surface.write(|s| s.render()) {
                    tracing::debug!("Render after object delete failed: {e}");
                }
                Ok(true)
            }
            Err(SurfaceError::ObjectNotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Place a frame centered on a surface, scaled by the fit policy, with a
/// delete affordance, and make it active.
fn place_frame(
    surface: &SurfaceHandle,
    image: &LoadedImage,
    request: &FrameRequest,
) -> EditorResult<ObjectId> {
    let is_tablet = request.device.is_some_and(DeviceKind::is_tablet);
    let id = surface.write(|s| {
        if s.live_scene()?.frame_count() >= MAX_FRAMES_PER_SURFACE {
            return Err(EditorError::FrameLimitReached {
                limit: MAX_FRAMES_PER_SURFACE,
            });
        }
        let (wc, hc) = (s.width(), s.height());
        #[allow(clippy::cast_precision_loss)]
        let scale = frame_scale(
            wc,
            hc,
            image.width.max(1) as f32,
            image.height.max(1) as f32,
            is_tablet,
            request.fill,
        );
        let frame = PlacedObject::new(ObjectKind::Frame {
            src: image.src.clone(),
            width: image.width,
            height: image.height,
            device: request.device,
        })
        .with_placement(Placement::centered(wc / 2.0, hc / 2.0, scale))
        .with_delete_control();
        let id = s.add_object(frame)?;
        s.render()?;
        Ok(id)
    })?;
    surface.set_active_object(Some(id))?;
    tracing::debug!("Placed frame {} ({})", id, image.src);
    Ok(id)
}
