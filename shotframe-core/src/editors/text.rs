//! Text editing for the active text object.
//!
//! The editor keeps a [`TextForm`] mirroring the active text of the selected
//! canvas. It follows selection events while attached, and every setter
//! writes through to the active text object only.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{EditorResult, SurfaceError};
use crate::object::{ObjectId, TextAlign, TextStyle};
use crate::store::CanvasStore;
use crate::surface::{Subscription, SurfaceEvent, SurfaceHandle};

/// Smallest accepted font size.
pub const MIN_FONT_SIZE: f32 = 1.0;
/// Largest accepted font size.
pub const MAX_FONT_SIZE: f32 = 120.0;
/// Largest accepted line height.
pub const MAX_LINE_HEIGHT: f32 = 10.0;

/// Form state mirroring one text object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextForm {
    /// The mirrored object.
    pub object: ObjectId,
    /// Text content.
    pub content: String,
    /// Styling.
    pub style: TextStyle,
}

type SharedForm = Arc<Mutex<Option<TextForm>>>;

struct Attachment {
    surface: SurfaceHandle,
    _subscription: Subscription,
}

/// Editor for the active text of the selected canvas.
pub struct TextEditor {
    store: CanvasStore,
    form: SharedForm,
    attachment: Option<Attachment>,
}

impl std::fmt::Debug for TextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEditor")
            .field("form", &self.form())
            .field("attached", &self.attachment.is_some())
            .finish_non_exhaustive()
    }
}

impl TextEditor {
    /// Detached editor.
    #[must_use]
    pub fn new(store: CanvasStore) -> Self {
        Self {
            store,
            form: Arc::new(Mutex::new(None)),
            attachment: None,
        }
    }

    /// Follow selection on the selected canvas.
    ///
    /// Re-attaching to the same surface keeps the existing subscription;
    /// switching canvases drops the old one.
    ///
    /// # Errors
    ///
    /// Returns a selection error, or [`SurfaceError::Disposed`] if the
    /// surface went away.
    pub fn attach(&mut self) -> EditorResult<()> {
        let surface = self.store.require_selected_surface()?;
        if self
            .attachment
            .as_ref()
            .is_some_and(|a| a.surface.ptr_eq(&surface))
        {
            return Ok(());
        }
        self.attachment = None;

        let weak = surface.downgrade();
        let form = Arc::clone(&self.form);
        let subscription = surface.subscribe(move |event| match event {
            SurfaceEvent::SelectionCleared => set_form(&form, None),
            SurfaceEvent::SelectionCreated(_) | SurfaceEvent::SelectionUpdated(_) => {
                if let Some(surface) = weak.upgrade() {
                    set_form(&form, read_form(&surface));
                }
            }
        })?;
        set_form(&self.form, read_form(&surface));
        self.attachment = Some(Attachment {
            surface,
            _subscription: subscription,
        });
        Ok(())
    }

    /// Stop following selection and clear the form.
    pub fn detach(&mut self) {
        self.attachment = None;
        set_form(&self.form, None);
    }

    /// Current form, if a text object is active.
    #[must_use]
    pub fn form(&self) -> Option<TextForm> {
        self.form
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the text content.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_content(&self, content: &str) -> EditorResult<bool> {
        self.edit(|text, _| *text = content.to_string())
    }

    /// Set the font size, clamped to `1..=120`.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_font_size(&self, size: f32) -> EditorResult<bool> {
        let size = if size.is_finite() {
            size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
        } else {
            TextStyle::default().font_size
        };
        self.edit(|_, style| style.font_size = size)
    }

    /// Set the font family.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_font_family(&self, family: &str) -> EditorResult<bool> {
        self.edit(|_, style| style.font_family = family.to_string())
    }

    /// Set the font weight (`normal`, `bold`, `100`..`900`).
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_font_weight(&self, weight: &str) -> EditorResult<bool> {
        self.edit(|_, style| style.font_weight = weight.to_string())
    }

    /// Set the line height, clamped to `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_line_height(&self, line_height: f32) -> EditorResult<bool> {
        let line_height = if line_height.is_finite() {
            line_height.clamp(1.0, MAX_LINE_HEIGHT)
        } else {
            TextStyle::default().line_height
        };
        self.edit(|_, style| style.line_height = line_height)
    }

    /// Set the fill color.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_fill(&self, color: &str) -> EditorResult<bool> {
        self.edit(|_, style| style.fill = color.to_string())
    }

    /// Set or clear the stroke color.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_stroke(&self, color: Option<&str>) -> EditorResult<bool> {
        self.edit(|_, style| style.stroke = color.map(str::to_string))
    }

    /// Set or clear the text background color.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_text_background(&self, color: Option<&str>) -> EditorResult<bool> {
        self.edit(|_, style| style.background = color.map(str::to_string))
    }

    /// Set the alignment.
    ///
    /// # Errors
    ///
    /// Returns a selection or surface error.
    pub fn set_alignment(&self, align: TextAlign) -> EditorResult<bool> {
        self.edit(|_, style| style.text_align = align)
    }

    /// Delete the active text object. Returns `false` when no text is
    /// active.
    ///
    /// # Errors
    ///
    /// Returns a selection error.
    pub fn delete(&self) -> EditorResult<bool> {
        let surface = self.store.require_selected_surface()?;
        let Some(id) = surface.read(|s| s.active_object().filter(|o| o.is_text()).map(|o| o.id))
        else {
            return Ok(false);
        };
        let removed = self.store.delete_object(id)?;
        set_form(&self.form, None);
        Ok(removed)
    }

    /// Apply `f` to the active text object and refresh the form. Returns
    /// `false` without touching anything when the active object is not text.
    fn edit(&self, f: impl FnOnce(&mut String, &mut TextStyle)) -> EditorResult<bool> {
        let surface = self.store.require_selected_surface()?;
        let edited = surface.write(|s| {
            let Some(id) = s.active_object().filter(|o| o.is_text()).map(|o| o.id) else {
                return Ok(false);
            };
            let scene = s.live_scene_mut()?;
            let Some((text, style)) = scene
                .get_object_mut(id)
                .and_then(|object| object.as_text_mut())
            else {
                return Ok(false);
            };
            f(text, style);
            s.render()?;
            Ok::<_, SurfaceError>(true)
        })?;
        if edited {
            set_form(&self.form, read_form(&surface));
        }
        Ok(edited)
    }
}

fn set_form(form: &Mutex<Option<TextForm>>, value: Option<TextForm>) {
    *form.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

fn read_form(surface: &SurfaceHandle) -> Option<TextForm> {
    surface.read(|s| {
        let object = s.active_object()?;
        let (content, style) = object.as_text()?;
        Some(TextForm {
            object: object.id,
            content: content.to_string(),
            style: style.clone(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::object::{ObjectKind, PlacedObject};
    use crate::store::SurfaceContext;
    use crate::surface::{MemorySurfaceFactory, SurfaceFactory};

    fn mounted_store() -> CanvasStore {
        let store = CanvasStore::default();
        let id = store.selected_id().expect("seeded");
        let plan = store.begin_mount(&id).expect("plan");
        let surface = MemorySurfaceFactory
            .create(450.0, 800.0, &Background::default())
            .expect("surface");
        assert!(store.on_surface_ready(&plan.ticket, surface, SurfaceContext::Primary));
        store
    }

    #[test]
    fn test_form_follows_selection() {
        let store = mounted_store();
        let mut editor = TextEditor::new(store.clone());
        editor.attach().expect("attach");
        assert!(editor.form().is_none());

        let id = store.add_text().expect("text");
        let form = editor.form().expect("form");
        assert_eq!(form.object, id);
        assert_eq!(form.content, "Insert your text here");

        let surface = store.selected_surface().expect("surface");
        surface.set_active_object(None).expect("clear");
        assert!(editor.form().is_none());
    }

    #[test]
    fn test_setters_write_through() {
        let store = mounted_store();
        let mut editor = TextEditor::new(store.clone());
        editor.attach().expect("attach");
        let id = store.add_text().expect("text");

        assert!(editor.set_content("Hello").expect("content"));
        assert!(editor.set_font_size(500.0).expect("size"));
        assert!(editor.set_alignment(TextAlign::Center).expect("align"));
        assert!(editor.set_stroke(Some("#000000")).expect("stroke"));

        let surface = store.selected_surface().expect("surface");
        let object = surface
            .read(|s| s.scene().get_object(id).cloned())
            .expect("object");
        let (content, style) = object.as_text().expect("text");
        assert_eq!(content, "Hello");
        assert!((style.font_size - MAX_FONT_SIZE).abs() < f32::EPSILON);
        assert_eq!(style.text_align, TextAlign::Center);
        assert_eq!(style.stroke.as_deref(), Some("#000000"));
        assert_eq!(editor.form().expect("form").content, "Hello");
    }

    #[test]
    fn test_setters_ignore_non_text() {
        let store = mounted_store();
        let editor = TextEditor::new(store.clone());
        let surface = store.selected_surface().expect("surface");
        let frame = surface
            .write(|s| {
                s.add_object(PlacedObject::new(ObjectKind::Frame {
                    src: "frame.png".to_string(),
                    width: 10,
                    height: 10,
                    device: None,
                }))
            })
            .expect("frame");
        surface.set_active_object(Some(frame)).expect("select");
        assert!(!editor.set_font_size(12.0).expect("no text"));
        assert!(!editor.delete().expect("no text"));
    }

    #[test]
    fn test_delete_active_text() {
        let store = mounted_store();
        let mut editor = TextEditor::new(store.clone());
        editor.attach().expect("attach");
        store.add_text().expect("text");
        assert!(editor.delete().expect("delete"));
        assert!(editor.form().is_none());
        let surface = store.selected_surface().expect("surface");
        assert_eq!(surface.read(|s| s.objects().len()), 0);
    }

    #[test]
    fn test_detach_unsubscribes() {
        let store = mounted_store();
        let mut editor = TextEditor::new(store.clone());
        editor.attach().expect("attach");
        editor.attach().expect("reattach");
        let surface = store.selected_surface().expect("surface");
        assert_eq!(surface.read(|s| s.scene().observer_count()), 1);
        editor.detach();
        assert_eq!(surface.read(|s| s.scene().observer_count()), 0);
    }
}
