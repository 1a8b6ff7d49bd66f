//! The drawing-surface contract.
//!
//! A [`DrawingSurface`] owns one [`Scene`] and knows how to rasterize it.
//! Implementors only provide scene access and rasterization; every other
//! operation is a provided method that refuses to touch a disposed scene.
//!
//! [`SurfaceHandle`] is the shared, lockable handle the store and editors
//! pass around. Selection observers are notified after the surface lock is
//! released, so an observer may read the surface it is watching.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde::{Deserialize, Serialize};

use crate::background::Background;
use crate::error::{SurfaceError, SurfaceResult};
use crate::object::{ObjectId, PlacedObject};
use crate::scene::{Scene, SceneSnapshot};

/// Selection change emitted by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// An object became active while nothing was.
    SelectionCreated(ObjectId),
    /// A different object became active.
    SelectionUpdated(ObjectId),
    /// The active object was cleared.
    SelectionCleared,
}

/// Callback invoked on selection changes.
pub type SelectionObserver = Arc<dyn Fn(&SurfaceEvent) + Send + Sync>;

/// Encoded raster format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl RasterFormat {
    /// File extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Rasterization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output encoding.
    pub format: RasterFormat,
    /// JPEG quality 1..=100. Ignored for PNG.
    pub quality: u8,
    /// Uniform scale applied to the surface size.
    pub multiplier: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            format: RasterFormat::Png,
            quality: 100,
            multiplier: 1.0,
        }
    }
}

/// An encoded raster produced by a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Encoding of `bytes`.
    pub format: RasterFormat,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// A drawing surface.
pub trait DrawingSurface: Send + Sync {
    /// The scene backing this surface.
    fn scene(&self) -> &Scene;

    /// Mutable access to the scene.
    fn scene_mut(&mut self) -> &mut Scene;

    /// Rasterize the current scene.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Raster`] if rendering or encoding fails.
    fn to_raster(&self, options: &RasterOptions) -> SurfaceResult<RasterImage>;

    /// Width in pixels.
    fn width(&self) -> f32 {
        self.scene().width()
    }

    /// Height in pixels.
    fn height(&self) -> f32 {
        self.scene().height()
    }

    /// Whether the surface has been released.
    fn is_disposed(&self) -> bool {
        self.scene().is_disposed()
    }

    /// The scene, failing once disposed.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn live_scene(&self) -> SurfaceResult<&Scene> {
        let scene = self.scene();
        if scene.is_disposed() {
            Err(SurfaceError::Disposed)
        } else {
            Ok(scene)
        }
    }

    /// Mutable scene, failing once disposed.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn live_scene_mut(&mut self) -> SurfaceResult<&mut Scene> {
        let scene = self.scene_mut();
        if scene.is_disposed() {
            Err(SurfaceError::Disposed)
        } else {
            Ok(scene)
        }
    }

    /// Add an object on top.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn add_object(&mut self, object: PlacedObject) -> SurfaceResult<ObjectId> {
        Ok(self.live_scene_mut()?.add_object(object))
    }

    /// Remove an object.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal or
    /// [`SurfaceError::ObjectNotFound`].
    fn remove_object(&mut self, id: ObjectId) -> SurfaceResult<PlacedObject> {
        self.live_scene_mut()?.remove_object(id)
    }

    /// Objects bottom to top.
    fn objects(&self) -> &[PlacedObject] {
        self.scene().objects()
    }

    /// The active object.
    fn active_object(&self) -> Option<&PlacedObject> {
        self.scene().active_object()
    }

    /// Change the active object, returning the event to emit.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal or
    /// [`SurfaceError::ObjectNotFound`].
    fn set_active_object(&mut self, id: Option<ObjectId>) -> SurfaceResult<Option<SurfaceEvent>> {
        self.live_scene_mut()?.set_active(id)
    }

    /// Change pixel dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] or
    /// [`SurfaceError::InvalidDimensions`].
    fn set_dimensions(&mut self, width: f32, height: f32) -> SurfaceResult<()> {
        self.live_scene_mut()?.set_dimensions(width, height)
    }

    /// Request a repaint.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn render(&mut self) -> SurfaceResult<()> {
        self.live_scene_mut()?.mark_rendered();
        Ok(())
    }

    /// Current background.
    fn background(&self) -> &Background {
        self.scene().background()
    }

    /// Replace the background.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn set_background(&mut self, background: Background) -> SurfaceResult<()> {
        self.live_scene_mut()?.set_background(background);
        Ok(())
    }

    /// Serializable state.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn snapshot(&self) -> SurfaceResult<SceneSnapshot> {
        Ok(self.live_scene()?.snapshot())
    }

    /// Load serialized state.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] or [`SurfaceError::Restore`].
    fn restore(&mut self, snapshot: &SceneSnapshot) -> SurfaceResult<()> {
        self.live_scene_mut()?.restore(snapshot)
    }

    /// Register a selection observer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    fn subscribe(&mut self, observer: SelectionObserver) -> SurfaceResult<u64> {
        Ok(self.live_scene_mut()?.add_observer(observer))
    }

    /// Remove a selection observer.
    fn unsubscribe(&mut self, token: u64) -> bool {
        self.scene_mut().remove_observer(token)
    }

    /// Release native resources.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] if already released.
    fn dispose(&mut self) -> SurfaceResult<()> {
        self.scene_mut().dispose()
    }
}

/// Shared handle to a drawing surface.
#[derive(Clone)]
pub struct SurfaceHandle {
    inner: Arc<RwLock<dyn DrawingSurface>>,
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

impl SurfaceHandle {
    /// Wrap a surface.
    pub fn new<S: DrawingSurface + 'static>(surface: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(surface)),
        }
    }

    /// Run a closure with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&dyn DrawingSurface) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Run a closure with exclusive access.
    ///
    /// Selection events returned by [`DrawingSurface::set_active_object`]
    /// inside the closure are not delivered; use
    /// [`SurfaceHandle::set_active_object`] for that.
    pub fn write<R>(&self, f: impl FnOnce(&mut dyn DrawingSurface) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Whether both handles point at the same surface.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle, for observers that need to read their surface.
    #[must_use]
    pub fn downgrade(&self) -> WeakSurfaceHandle {
        WeakSurfaceHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Change the active object and notify observers.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] or
    /// [`SurfaceError::ObjectNotFound`].
    pub fn set_active_object(&self, id: Option<ObjectId>) -> SurfaceResult<()> {
        let (event, observers) = self.write(|s| {
            let event = s.set_active_object(id)?;
            Ok::<_, SurfaceError>((event, s.scene().observers()))
        })?;
        if let Some(event) = event {
            for observer in observers {
                observer(&event);
            }
        }
        Ok(())
    }

    /// Remove an object, emitting `SelectionCleared` if it was active.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] or
    /// [`SurfaceError::ObjectNotFound`].
    pub fn remove_object(&self, id: ObjectId) -> SurfaceResult<PlacedObject> {
        let (removed, was_active, observers) = self.write(|s| {
            let was_active = s.scene().active_id() == Some(id);
            let removed = s.remove_object(id)?;
            Ok::<_, SurfaceError>((removed, was_active, s.scene().observers()))
        })?;
        if was_active {
            for observer in observers {
                observer(&SurfaceEvent::SelectionCleared);
            }
        }
        Ok(removed)
    }

    /// Register an observer for as long as the returned guard lives.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] after disposal.
    pub fn subscribe(
        &self,
        observer: impl Fn(&SurfaceEvent) + Send + Sync + 'static,
    ) -> SurfaceResult<Subscription> {
        let token = self.write(|s| s.subscribe(Arc::new(observer)))?;
        Ok(Subscription {
            surface: Arc::downgrade(&self.inner),
            token,
        })
    }

    /// Surface width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.read(|s| s.width())
    }

    /// Surface height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.read(|s| s.height())
    }

    /// Whether the surface has been released.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.read(|s| s.is_disposed())
    }

    /// Release the surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Disposed`] if already released.
    pub fn dispose(&self) -> SurfaceResult<()> {
        self.write(|s| s.dispose())
    }
}

/// Non-owning surface handle.
#[derive(Clone)]
pub struct WeakSurfaceHandle {
    inner: Weak<RwLock<dyn DrawingSurface>>,
}

impl WeakSurfaceHandle {
    /// The surface, if it is still referenced somewhere.
    #[must_use]
    pub fn upgrade(&self) -> Option<SurfaceHandle> {
        self.inner.upgrade().map(|inner| SurfaceHandle { inner })
    }
}

impl std::fmt::Debug for WeakSurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSurfaceHandle").finish_non_exhaustive()
    }
}

/// Scoped selection subscription. Unsubscribes on drop.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    surface: Weak<RwLock<dyn DrawingSurface>>,
    token: u64,
}

impl Subscription {
    /// Observer token.
    #[must_use]
    pub const fn token(&self) -> u64 {
        self.token
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.upgrade() {
            let mut guard = surface.write().unwrap_or_else(PoisonError::into_inner);
            guard.unsubscribe(self.token);
        }
    }
}

/// Creates drawing surfaces.
pub trait SurfaceFactory: Send + Sync {
    /// Construct a surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidDimensions`] for non-positive sizes.
    fn create(&self, width: f32, height: f32, background: &Background)
        -> SurfaceResult<SurfaceHandle>;
}

/// Headless surface that keeps a scene but cannot rasterize.
///
/// Used where only the object model matters (text interchange, tests).
#[derive(Debug)]
pub struct MemorySurface {
    scene: Scene,
}

impl MemorySurface {
    /// Create a surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidDimensions`] for non-positive sizes.
    pub fn new(width: f32, height: f32, background: Background) -> SurfaceResult<Self> {
        Ok(Self {
            scene: Scene::new(width, height, background)?,
        })
    }
}

impl DrawingSurface for MemorySurface {
    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn to_raster(&self, _options: &RasterOptions) -> SurfaceResult<RasterImage> {
        Err(SurfaceError::Raster(
            "memory surfaces cannot be rasterized".to_string(),
        ))
    }
}

/// Factory for [`MemorySurface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySurfaceFactory;

impl SurfaceFactory for MemorySurfaceFactory {
    fn create(
        &self,
        width: f32,
        height: f32,
        background: &Background,
    ) -> SurfaceResult<SurfaceHandle> {
        Ok(SurfaceHandle::new(MemorySurface::new(
            width,
            height,
            background.clone(),
        )?))
    }
}
