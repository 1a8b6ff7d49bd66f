//! In-memory state backing one drawing surface.
//!
//! A [`Scene`] holds the pixel dimensions, the background and the z-ordered
//! object stack of a surface, plus the active object and registered
//! selection observers. [`SceneSnapshot`] is its serializable form (the
//! "full canvas" state embedded in translation documents).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::background::Background;
use crate::error::{SurfaceError, SurfaceResult};
use crate::object::{ObjectId, ObjectKind, PlacedObject};
use crate::surface::{SelectionObserver, SurfaceEvent};

/// Snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1";

/// Mutable state of one drawing surface.
#[derive(Clone)]
pub struct Scene {
    width: f32,
    height: f32,
    background: Background,
    /// Objects bottom to top.
    objects: Vec<PlacedObject>,
    active: Option<ObjectId>,
    observers: Vec<(u64, SelectionObserver)>,
    next_token: u64,
    revision: u64,
    disposed: bool,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("objects", &self.objects.len())
            .field("active", &self.active)
            .field("observers", &self.observers.len())
            .field("revision", &self.revision)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidDimensions`] unless both sides are
    /// positive and finite.
    pub fn new(width: f32, height: f32, background: Background) -> SurfaceResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            background,
            objects: Vec::new(),
            active: None,
            observers: Vec::new(),
            next_token: 1,
            revision: 0,
            disposed: false,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Change the pixel dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidDimensions`] for non-positive sizes.
    pub fn set_dimensions(&mut self, width: f32, height: f32) -> SurfaceResult<()> {
        check_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Current background.
    #[must_use]
    pub const fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Push an object on top of the stack.
    pub fn add_object(&mut self, object: PlacedObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Insert an object at a stack position (clamped to the top).
    pub fn insert_object(&mut self, index: usize, object: PlacedObject) -> ObjectId {
        let id = object.id;
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
        id
    }

    /// Remove an object. Clears the active object if it was removed.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::ObjectNotFound`] if no such object exists.
    pub fn remove_object(&mut self, id: ObjectId) -> SurfaceResult<PlacedObject> {
        let index = self
            .index_of(id)
            .ok_or(SurfaceError::ObjectNotFound(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        Ok(self.objects.remove(index))
    }

    /// Stack position of an object.
    #[must_use]
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get_object(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Get a mutable object by ID.
    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// All objects bottom to top.
    #[must_use]
    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    /// Keep only the objects matching the predicate.
    pub fn retain_objects(&mut self, mut keep: impl FnMut(&PlacedObject) -> bool) {
        self.objects.retain(|o| keep(o));
        if let Some(active) = self.active {
            if self.index_of(active).is_none() {
                self.active = None;
            }
        }
    }

    /// Number of device frames on the surface.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_frame()).count()
    }

    /// Number of objects on the surface.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// ID of the active object.
    #[must_use]
    pub const fn active_id(&self) -> Option<ObjectId> {
        self.active
    }

    /// The active object.
    #[must_use]
    pub fn active_object(&self) -> Option<&PlacedObject> {
        self.active.and_then(|id| self.get_object(id))
    }

    /// Make an object active (or clear with `None`), returning the selection
    /// event to emit, if the selection changed.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::ObjectNotFound`] if the object does not exist.
    pub fn set_active(&mut self, id: Option<ObjectId>) -> SurfaceResult<Option<SurfaceEvent>> {
        if let Some(id) = id {
            if self.index_of(id).is_none() {
                return Err(SurfaceError::ObjectNotFound(id));
            }
        }
        let previous = self.active;
        self.active = id;
        Ok(match (previous, id) {
            (None, Some(new)) => Some(SurfaceEvent::SelectionCreated(new)),
            (Some(old), Some(new)) if old != new => Some(SurfaceEvent::SelectionUpdated(new)),
            (Some(_), None) => Some(SurfaceEvent::SelectionCleared),
            _ => None,
        })
    }

    /// Register a selection observer, returning its token.
    pub fn add_observer(&mut self, observer: SelectionObserver) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.observers.push((token, observer));
        token
    }

    /// Drop a selection observer. Returns whether it was registered.
    pub fn remove_observer(&mut self, token: u64) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token);
        self.observers.len() != before
    }

    /// Clones of the registered observers.
    #[must_use]
    pub fn observers(&self) -> Vec<SelectionObserver> {
        self.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Count of completed renders.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a render pass.
    pub fn mark_rendered(&mut self) {
        self.revision += 1;
    }

    /// Whether the surface has been released.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release the scene. Drops every object and observer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] on a second call.
    pub fn dispose(&mut self) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        self.disposed = true;
        self.objects.clear();
        self.observers.clear();
        self.active = None;
        Ok(())
    }

    /// Serializable copy of the visual state.
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            objects: self.objects.clone(),
        }
    }

    /// Replace the visual state with a snapshot. Observers are kept, the
    /// active object is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Restore`] for an unknown version or invalid
    /// dimensions.
    pub fn restore(&mut self, snapshot: &SceneSnapshot) -> SurfaceResult<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SurfaceError::Restore(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        check_dimensions(snapshot.width, snapshot.height)
            .map_err(|e| SurfaceError::Restore(e.to_string()))?;
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.background = snapshot.background.clone();
        self.objects = snapshot.objects.clone();
        self.active = None;
        Ok(())
    }
}

fn check_dimensions(width: f32, height: f32) -> SurfaceResult<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(SurfaceError::InvalidDimensions { width, height })
    }
}

/// Serializable visual state of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Format version.
    pub version: String,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Background.
    pub background: Background,
    /// Objects bottom to top.
    pub objects: Vec<PlacedObject>,
}

impl SceneSnapshot {
    /// Text objects in stack order.
    pub fn texts(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter().filter(|o| o.is_text())
    }

    /// Copy without any text objects.
    #[must_use]
    pub fn without_texts(&self) -> Self {
        let mut copy = self.clone();
        copy.objects.retain(|o| !matches!(o.kind, ObjectKind::Text { .. }));
        copy
    }

    /// Serialize to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Parse from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a snapshot.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
