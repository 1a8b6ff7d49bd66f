//! Editor shell: keyboard shortcuts, delete confirmation, viewport and
//! notices.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::canvas::CanvasId;
use crate::error::{EditorError, EditorResult};
use crate::images::ImageSource;
use crate::notice::{Notice, Notifier};
use crate::object::ObjectId;
use crate::store::{CanvasStore, FrameRequest};

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name, e.g. `d`, `=`, `Delete`.
    pub key: String,
    /// Held modifiers.
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Key press without modifiers.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: KeyModifiers::default(),
        }
    }

    /// With Control held.
    #[must_use]
    pub const fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// With Shift held.
    #[must_use]
    pub const fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Duplicate the selected canvas.
    Duplicate,
    /// Append a new canvas.
    AddCanvas,
    /// Ask to delete the selected canvas.
    RequestDelete,
    /// Add a text object to the selected canvas.
    AddText,
}

/// A key binding. `keys` lists modifier names and the accepted keys.
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    /// Modifiers and keys.
    pub keys: &'static [&'static str],
    /// Bound action.
    pub action: ShortcutAction,
}

impl Shortcut {
    /// Whether `event` triggers this binding: the key is listed and every
    /// listed modifier is held. Unlisted modifiers are ignored.
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let key = event.key.to_lowercase();
        let listed = |name: &str| self.keys.iter().any(|k| *k == name);
        listed(&key)
            && (!listed("ctrl") || event.modifiers.ctrl)
            && (!listed("shift") || event.modifiers.shift)
            && (!listed("alt") || event.modifiers.alt)
            && (!listed("meta") || event.modifiers.meta)
    }
}

/// Default bindings.
pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        keys: &["ctrl", "d"],
        action: ShortcutAction::Duplicate,
    },
    Shortcut {
        keys: &["ctrl", "+", "="],
        action: ShortcutAction::AddCanvas,
    },
    Shortcut {
        keys: &["delete"],
        action: ShortcutAction::RequestDelete,
    },
    Shortcut {
        keys: &["ctrl", "backspace"],
        action: ShortcutAction::RequestDelete,
    },
    Shortcut {
        keys: &["ctrl", "shift", "t"],
        action: ShortcutAction::AddText,
    },
];

/// Default zoom.
pub const DEFAULT_ZOOM: f32 = 0.5;
/// Smallest zoom.
pub const MIN_ZOOM: f32 = 0.1;
/// Largest zoom.
pub const MAX_ZOOM: f32 = 3.0;
/// Zoom change per button press.
pub const ZOOM_BUTTON_STEP: f32 = 0.35;
/// Zoom change per wheel notch.
pub const ZOOM_WHEEL_STEP: f32 = 0.1;

/// Workspace zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            pan_x: 10.0,
            pan_y: 50.0,
        }
    }
}

impl Viewport {
    /// Current zoom.
    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Current pan offset.
    #[must_use]
    pub const fn pan(&self) -> (f32, f32) {
        (self.pan_x, self.pan_y)
    }

    /// Set the zoom, clamped to `MIN_ZOOM..=MAX_ZOOM`. Non-finite values
    /// are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Zoom in one button step.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_BUTTON_STEP);
    }

    /// Zoom out one button step.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_BUTTON_STEP);
    }

    /// Wheel zoom; only active while Control or Meta is held. Returns
    /// whether the wheel was consumed.
    pub fn wheel(&mut self, delta_y: f32, modifiers: KeyModifiers) -> bool {
        if !(modifiers.ctrl || modifiers.meta) {
            return false;
        }
        if delta_y > 0.0 {
            self.set_zoom(self.zoom - ZOOM_WHEEL_STEP);
        } else {
            self.set_zoom(self.zoom + ZOOM_WHEEL_STEP);
        }
        true
    }

    /// Pan by a screen-space offset.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}

/// Top-level editor controller.
///
/// Turns shortcuts into store operations and every failed operation into a
/// notice.
pub struct Shell {
    store: CanvasStore,
    notifier: Arc<dyn Notifier>,
    viewport: Viewport,
    confirm_delete: bool,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("viewport", &self.viewport)
            .field("confirm_delete", &self.confirm_delete)
            .finish_non_exhaustive()
    }
}

impl Shell {
    /// Shell over a store.
    #[must_use]
    pub fn new(store: CanvasStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            viewport: Viewport::default(),
            confirm_delete: false,
        }
    }

    /// The store.
    #[must_use]
    pub const fn store(&self) -> &CanvasStore {
        &self.store
    }

    /// Viewport state.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport state.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Whether the delete confirmation is open.
    #[must_use]
    pub const fn is_confirming_delete(&self) -> bool {
        self.confirm_delete
    }

    /// Handle a key press. Returns the triggered action, if any.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<ShortcutAction> {
        let action = SHORTCUTS.iter().find(|s| s.matches(event))?.action;
        tracing::debug!("Shortcut {:?} -> {action:?}", event.key);
        match action {
            ShortcutAction::Duplicate => {
                self.duplicate_selected();
            }
            ShortcutAction::AddCanvas => {
                self.store.add_item();
            }
            ShortcutAction::RequestDelete => self.request_delete(),
            ShortcutAction::AddText => {
                self.report(self.store.add_text());
            }
        }
        Some(action)
    }

    /// Duplicate the selected canvas.
    pub fn duplicate_selected(&self) -> Option<CanvasId> {
        let Some(id) = self.store.selected_id() else {
            self.notify_error(&EditorError::NoCanvasSelected);
            return None;
        };
        let copy = self.store.duplicate_item(&id);
        if copy.is_none() {
            self.notify_error(&EditorError::SurfaceNotReady(id));
        }
        copy
    }

    /// Open the delete confirmation.
    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    /// Confirm: delete the selected canvas and close the confirmation.
    /// Returns the deleted ID.
    pub fn confirm_delete(&mut self) -> Option<CanvasId> {
        if !std::mem::take(&mut self.confirm_delete) {
            return None;
        }
        let Some(id) = self.store.selected_id() else {
            self.notify_error(&EditorError::NoCanvasSelected);
            return None;
        };
        self.store.delete_item(&id).then_some(id)
    }

    /// Close the confirmation without deleting.
    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    /// Add a frame to the selected canvas, reporting failures.
    pub async fn add_frame(
        &self,
        request: &FrameRequest,
        images: &dyn ImageSource,
    ) -> Option<ObjectId> {
        self.report(self.store.add_frame(request, images).await)
    }

    /// Add a frame to every canvas, reporting skips as one warning.
    pub async fn apply_frame_to_all(&self, request: &FrameRequest, images: &dyn ImageSource) -> usize {
        let Some(report) = self.report(self.store.apply_frame_to_all(request, images).await)
        else {
            return 0;
        };
        if let Some(warning) = report.warning() {
            self.notifier.notify(Notice::warning(warning));
        }
        report.applied.len()
    }

    /// Pass a result through, turning an error into a notice.
    pub fn report<T>(&self, result: EditorResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.notify_error(&e);
                None
            }
        }
    }

    fn notify_error(&self, err: &EditorError) {
        if !err.is_user_facing() {
            tracing::error!("Editor operation failed: {err}");
        }
        self.notifier.notify(Notice::from(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::images::FixedImageSource;
    use crate::notice::{NoticeLevel, NoticeLog};
    use crate::store::SurfaceContext;
    use crate::surface::{MemorySurfaceFactory, SurfaceFactory};

    fn mount_all(store: &CanvasStore) {
        for id in store.stable_ids() {
            if let Some(plan) = store.begin_mount(&id) {
                let surface = MemorySurfaceFactory
                    .create(450.0, 800.0, &Background::default())
                    .expect("surface");
                store.on_surface_ready(&plan.ticket, surface, SurfaceContext::Primary);
            }
        }
    }

    fn shell() -> (Shell, Arc<NoticeLog>) {
        let log = Arc::new(NoticeLog::new());
        let store = CanvasStore::default();
        mount_all(&store);
        (Shell::new(store, log.clone()), log)
    }

    #[test]
    fn test_shortcut_matching() {
        let dup = &SHORTCUTS[0];
        assert!(dup.matches(&KeyEvent::new("D").ctrl()));
        assert!(!dup.matches(&KeyEvent::new("d")));
        assert!(dup.matches(&KeyEvent::new("d").ctrl().shift()));

        let add = &SHORTCUTS[1];
        assert!(add.matches(&KeyEvent::new("=").ctrl()));
        assert!(add.matches(&KeyEvent::new("+").ctrl()));

        let delete = &SHORTCUTS[2];
        assert!(delete.matches(&KeyEvent::new("Delete")));
        assert!(!SHORTCUTS[4].matches(&KeyEvent::new("t").ctrl()));
    }

    #[test]
    fn test_add_and_duplicate_shortcuts() {
        let (mut shell, _) = shell();
        assert_eq!(
            shell.handle_key(&KeyEvent::new("=").ctrl()),
            Some(ShortcutAction::AddCanvas)
        );
        assert_eq!(shell.store().len(), 2);

        mount_all(shell.store());
        shell.handle_key(&KeyEvent::new("d").ctrl());
        assert_eq!(
            shell.store().selected_id(),
            Some(CanvasId::new("canvas-2 (1)"))
        );
        assert_eq!(shell.handle_key(&KeyEvent::new("x")), None);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (mut shell, _) = shell();
        shell.store().add_item();
        shell.handle_key(&KeyEvent::new("Delete"));
        assert!(shell.is_confirming_delete());
        shell.cancel_delete();
        assert_eq!(shell.confirm_delete(), None);
        assert_eq!(shell.store().len(), 2);

        shell.handle_key(&KeyEvent::new("Backspace").ctrl());
        assert_eq!(shell.confirm_delete(), Some(CanvasId::numbered(2)));
        assert_eq!(shell.store().len(), 1);
        assert!(!shell.is_confirming_delete());
    }

    #[test]
    fn test_failures_become_notices() {
        let (mut shell, log) = shell();
        shell.store().add_item();
        shell.handle_key(&KeyEvent::new("t").ctrl().shift());
        let notices = log.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(notices[0].message.contains("not ready"));
    }

    #[tokio::test]
    async fn test_apply_to_all_warns_on_skips() {
        let (shell, log) = shell();
        let images = FixedImageSource::new().with_image("frame.png", 400, 800);
        let request = FrameRequest::new("frame.png");
        shell.add_frame(&request, &images).await.expect("first");
        shell.add_frame(&request, &images).await.expect("second");
        assert_eq!(shell.apply_frame_to_all(&request, &images).await, 0);
        let notices = log.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_viewport_clamps() {
        let mut viewport = Viewport::default();
        assert!((viewport.zoom() - DEFAULT_ZOOM).abs() < f32::EPSILON);
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert!((viewport.zoom() - MAX_ZOOM).abs() < f32::EPSILON);
        assert!(!viewport.wheel(1.0, KeyModifiers::default()));
        viewport.set_zoom(0.0);
        assert!((viewport.zoom() - MIN_ZOOM).abs() < f32::EPSILON);
        assert!(viewport.wheel(
            -1.0,
            KeyModifiers {
                ctrl: true,
                ..KeyModifiers::default()
            }
        ));
        assert!((viewport.zoom() - 0.2).abs() < 1e-5);
        viewport.pan_by(5.0, -5.0);
        assert_eq!(viewport.pan(), (15.0, 45.0));
    }
}
