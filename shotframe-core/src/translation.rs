//! Text-translation interchange.
//!
//! The document is keyed by language code. Each section lists, per canvas in
//! render order, the canvas's text runs and its full serialized state:
//!
//! ```json
//! {
//!   "en": {
//!     "language": "en",
//!     "canvases": [
//!       {
//!         "id": 0,
//!         "texts": [
//!           { "canvasId": "canvas-1", "text": "Track habits", "originX": "center",
//!             "left": 225.0, "top": 30.0, "fontSize": 24.0, "fill": "#FFFFFF" }
//!         ],
//!         "fullCanvas": { "version": "1", "width": 450.0, "height": 800.0, "...": "..." }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Only the first requested language carries text; the others are emitted
//! empty for translators to fill in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canvas::CanvasId;
use crate::error::{EditorError, EditorResult, SurfaceResult};
use crate::object::{ObjectKind, OriginX, OriginY, PlacedObject, Placement, TextStyle};
use crate::scene::SceneSnapshot;
use crate::store::CanvasStore;
use crate::surface::DrawingSurface;

/// A language offered for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Short code, e.g. `en`.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Language {
    /// Create a language, normalizing the code to lowercase.
    #[must_use]
    pub fn new(code: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            code: code.as_ref().trim().to_lowercase(),
            name: name.into(),
        }
    }
}

/// Languages offered by default.
#[must_use]
pub fn default_languages() -> Vec<Language> {
    [
        ("en", "English"),
        ("fr", "French"),
        ("es", "Spanish"),
        ("de", "German"),
        ("it", "Italian"),
        ("ar", "Arabic"),
    ]
    .into_iter()
    .map(|(code, name)| Language::new(code, name))
    .collect()
}

fn default_origin_x() -> OriginX {
    OriginX::Center
}

fn default_font_size() -> f32 {
    TextStyle::default().font_size
}

fn default_fill() -> String {
    TextStyle::default().fill
}

/// One text run in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEntry {
    /// ID of the canvas the text belongs to.
    pub canvas_id: String,
    /// Text content; empty for languages awaiting translation.
    pub text: String,
    /// Horizontal anchor.
    #[serde(default = "default_origin_x")]
    pub origin_x: OriginX,
    /// Anchor X, rounded.
    #[serde(default)]
    pub left: f32,
    /// Anchor Y, rounded.
    #[serde(default)]
    pub top: f32,
    /// Font size.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Fill color.
    #[serde(default = "default_fill")]
    pub fill: String,
}

impl TextEntry {
    fn from_object(canvas_id: &CanvasId, object: &PlacedObject, with_text: bool) -> Option<Self> {
        let (content, style) = object.as_text()?;
        Some(Self {
            canvas_id: canvas_id.to_string(),
            text: if with_text {
                content.to_string()
            } else {
                String::new()
            },
            origin_x: object.placement.origin_x,
            left: object.placement.left.round(),
            top: object.placement.top.round(),
            font_size: style.font_size,
            fill: style.fill.clone(),
        })
    }

    /// Text object described by this entry.
    #[must_use]
    pub fn to_object(&self) -> PlacedObject {
        PlacedObject::new(ObjectKind::Text {
            content: self.text.clone(),
            style: TextStyle {
                font_size: self.font_size,
                fill: self.fill.clone(),
                ..TextStyle::default()
            },
        })
        .with_placement(Placement {
            left: self.left,
            top: self.top,
            origin_x: self.origin_x,
            origin_y: OriginY::Top,
            ..Placement::default()
        })
    }
}

/// Texts and state of one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasTexts {
    /// Render position of the canvas.
    pub id: usize,
    /// Text runs.
    pub texts: Vec<TextEntry>,
    /// Serialized canvas state.
    #[serde(default)]
    pub full_canvas: Option<Value>,
}

/// One language's section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSection {
    /// Language code.
    pub language: String,
    /// Canvases in render order.
    pub canvases: Vec<CanvasTexts>,
}

/// Texts to lay over a surface, with optional full state to restore first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationOverlay {
    /// State restored before the texts are added. Its own texts are dropped.
    pub snapshot: Option<SceneSnapshot>,
    /// Replacement text runs.
    pub texts: Vec<TextEntry>,
}

impl TranslationOverlay {
    /// Restore the snapshot (if any), drop existing text objects, and add the
    /// overlay texts.
    ///
    /// # Errors
    ///
    /// Returns a surface error if the surface is disposed or the snapshot
    /// cannot be restored.
    pub fn apply_to(&self, surface: &mut dyn DrawingSurface) -> SurfaceResult<()> {
        if let Some(snapshot) = &self.snapshot {
            surface.restore(&snapshot.without_texts())?;
        }
        surface.live_scene_mut()?.retain_objects(|o| !o.is_text());
        for entry in &self.texts {
            surface.add_object(entry.to_object())?;
        }
        surface.render()
    }
}

/// A preview canvas for one translated language.
#[derive(Debug, Clone)]
pub struct PreviewItem {
    /// Preview canvas ID, `<lang>-canvas-<i>`.
    pub id: CanvasId,
    /// Overlay to apply on mount.
    pub overlay: TranslationOverlay,
}

/// A full translation document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationDocument {
    sections: BTreeMap<String, LanguageSection>,
}

impl TranslationDocument {
    /// Build a document from the live surfaces of a store, in render order.
    ///
    /// The first language's texts are filled from the surfaces; the rest are
    /// left empty.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidTranslation`] when no language is given,
    /// or a serialization error.
    pub fn export(store: &CanvasStore, languages: &[Language]) -> EditorResult<Self> {
        let Some(first) = languages.first() else {
            return Err(EditorError::InvalidTranslation(
                "select at least one language".to_string(),
            ));
        };

        let items = store.render_items();
        let mut snapshots = Vec::with_capacity(items.len());
        for item in &items {
            let state = match &item.surface {
                Some(surface) => surface.read(|s| s.snapshot()).ok(),
                None => None,
            };
            snapshots.push(state);
        }

        let mut sections = BTreeMap::new();
        for language in languages {
            let with_text = language.code == first.code;
            let mut canvases = Vec::with_capacity(items.len());
            for (index, (item, snapshot)) in items.iter().zip(&snapshots).enumerate() {
                let texts = snapshot
                    .iter()
                    .flat_map(|s| s.objects.iter())
                    .filter_map(|o| TextEntry::from_object(&item.id, o, with_text))
                    .collect();
                let full_canvas = snapshot.as_ref().map(SceneSnapshot::to_value).transpose()?;
                canvases.push(CanvasTexts {
                    id: index,
                    texts,
                    full_canvas,
                });
            }
            sections.insert(
                language.code.clone(),
                LanguageSection {
                    language: language.code.clone(),
                    canvases,
                },
            );
        }
        tracing::debug!(
            "Exported texts for {} canvases in {} languages",
            items.len(),
            languages.len()
        );
        Ok(Self { sections })
    }

    /// Check raw JSON against the expected shape for the given languages.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidTranslation`] naming the first problem.
    pub fn validate(value: &Value, languages: &[&str]) -> EditorResult<()> {
        let invalid = |msg: String| Err(EditorError::InvalidTranslation(msg));
        let Some(root) = value.as_object() else {
            return invalid("top level must be an object".to_string());
        };
        for lang in languages {
            let Some(section) = root.get(*lang) else {
                return invalid(format!("missing section for {lang}"));
            };
            if section.get("language").and_then(Value::as_str) != Some(*lang) {
                return invalid(format!("section {lang} has a mismatched language"));
            }
            let Some(canvases) = section.get("canvases").and_then(Value::as_array) else {
                return invalid(format!("section {lang} has no canvases array"));
            };
            for (i, canvas) in canvases.iter().enumerate() {
                let Some(texts) = canvas.get("texts").and_then(Value::as_array) else {
                    return invalid(format!("{lang} canvas {i} has no texts array"));
                };
                for t in texts {
                    if !t.get("canvasId").is_some_and(Value::is_string) {
                        return invalid(format!("{lang} canvas {i}: canvasId must be a string"));
                    }
                    if !t.get("text").is_some_and(Value::is_string) {
                        return invalid(format!("{lang} canvas {i}: text must be a string"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a document. Validates every section present.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidTranslation`] for malformed JSON or a
    /// document that fails validation.
    pub fn parse(json: &str) -> EditorResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| EditorError::InvalidTranslation(e.to_string()))?;
        let languages: Vec<String> = value
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        let refs: Vec<&str> = languages.iter().map(String::as_str).collect();
        Self::validate(&value, &refs)?;
        serde_json::from_value(value).map_err(|e| EditorError::InvalidTranslation(e.to_string()))
    }

    /// Pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error.
    pub fn to_json_pretty(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Language codes present.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// One language's section.
    #[must_use]
    pub fn section(&self, language: &str) -> Option<&LanguageSection> {
        self.sections.get(language)
    }

    fn require_section(&self, language: &str) -> EditorResult<&LanguageSection> {
        self.section(language).ok_or_else(|| {
            EditorError::InvalidTranslation(format!("no section for language {language}"))
        })
    }

    /// Replace the texts of every live canvas named by the section's
    /// `canvasId`s. Returns the number of canvases updated.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidTranslation`] if the language is absent.
    pub fn apply(&self, store: &CanvasStore, language: &str) -> EditorResult<usize> {
        let section = self.require_section(language)?;
        let mut by_canvas: BTreeMap<&str, Vec<TextEntry>> = BTreeMap::new();
        for entry in section.canvases.iter().flat_map(|c| c.texts.iter()) {
            by_canvas
                .entry(entry.canvas_id.as_str())
                .or_default()
                .push(entry.clone());
        }

        let mut updated = 0;
        for (canvas_id, texts) in by_canvas {
            let id = CanvasId::new(canvas_id);
            let Some(surface) = store.surface(&id) else {
                tracing::debug!("No live canvas {id} for {language} texts");
                continue;
            };
            let overlay = TranslationOverlay {
                snapshot: None,
                texts,
            };
            match surface.write(|s| overlay.apply_to(s)) {
                Ok(()) => updated += 1,
                Err(e) => tracing::warn!("Failed to apply {language} texts to {id}: {e}"),
            }
        }
        tracing::debug!("Applied {language} texts to {updated} canvases");
        Ok(updated)
    }

    /// Preview canvases for a language, one per section canvas.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidTranslation`] if the language is absent
    /// or a `fullCanvas` entry is not a valid canvas state.
    pub fn preview_items(&self, language: &str) -> EditorResult<Vec<PreviewItem>> {
        let section = self.require_section(language)?;
        section
            .canvases
            .iter()
            .enumerate()
            .map(|(index, canvas)| {
                let snapshot = canvas
                    .full_canvas
                    .clone()
                    .map(SceneSnapshot::from_value)
                    .transpose()
                    .map_err(|e| {
                        EditorError::InvalidTranslation(format!(
                            "{language} canvas {index}: {e}"
                        ))
                    })?;
                Ok(PreviewItem {
                    id: CanvasId::new(format!("{language}-canvas-{index}")),
                    overlay: TranslationOverlay {
                        snapshot,
                        texts: canvas.texts.clone(),
                    },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::store::{StoreConfig, SurfaceContext};
    use crate::surface::{MemorySurfaceFactory, SurfaceFactory, SurfaceHandle};

    fn mount_all(store: &CanvasStore) -> Vec<SurfaceHandle> {
        store
            .stable_ids()
            .iter()
            .map(|id| {
                let plan = store.begin_mount(id).expect("plan");
                let surface = MemorySurfaceFactory
                    .create(450.0, 800.0, &Background::default())
                    .expect("surface");
                assert!(store.on_surface_ready(&plan.ticket, surface.clone(), SurfaceContext::Primary));
                surface
            })
            .collect()
    }

    fn langs() -> Vec<Language> {
        vec![Language::new("en", "English"), Language::new("FR", "French")]
    }

    #[test]
    fn test_export_fills_first_language_only() {
        let store = CanvasStore::default();
        mount_all(&store);
        store.add_text().expect("text");

        let doc = TranslationDocument::export(&store, &langs()).expect("export");
        let en = doc.section("en").expect("en");
        let fr = doc.section("fr").expect("fr");
        assert_eq!(en.language, "en");
        assert_eq!(en.canvases[0].texts[0].text, crate::store::DEFAULT_TEXT);
        assert_eq!(fr.canvases[0].texts[0].text, "");
        assert!(en.canvases[0].full_canvas.is_some());
    }

    #[test]
    fn test_export_requires_language() {
        let store = CanvasStore::default();
        assert!(matches!(
            TranslationDocument::export(&store, &[]),
            Err(EditorError::InvalidTranslation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let cases = [
            serde_json::json!([]),
            serde_json::json!({}),
            serde_json::json!({"en": {"language": "fr", "canvases": []}}),
            serde_json::json!({"en": {"language": "en", "canvases": {}}}),
            serde_json::json!({"en": {"language": "en", "canvases": [{"texts": 3}]}}),
            serde_json::json!({"en": {"language": "en", "canvases": [{"texts": [{"canvasId": 1, "text": "x"}]}]}}),
            serde_json::json!({"en": {"language": "en", "canvases": [{"texts": [{"canvasId": "c", "text": null}]}]}}),
        ];
        for case in &cases {
            assert!(TranslationDocument::validate(case, &["en"]).is_err(), "{case}");
        }
        let ok = serde_json::json!({"en": {"language": "en", "canvases": [{"texts": [{"canvasId": "c", "text": "x"}]}]}});
        TranslationDocument::validate(&ok, &["en"]).expect("valid");
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(matches!(
            TranslationDocument::parse("{not json"),
            Err(EditorError::InvalidTranslation(_))
        ));
    }

    #[test]
    fn test_round_trip_reproduces_text_placement() {
        let source = CanvasStore::default();
        source.add_item();
        let surfaces = mount_all(&source);
        source.select(&CanvasId::numbered(2));
        let id = source.add_text().expect("text");
        surfaces[1].write(|s| {
            let text = s.scene_mut().get_object_mut(id).expect("text");
            text.placement.left = 100.4;
            text.placement.top = 612.0;
            if let Some((_, style)) = text.as_text_mut() {
                style.font_size = 40.0;
                style.fill = "#ff00aa".to_string();
            }
        });

        let json = TranslationDocument::export(&source, &[Language::new("en", "English")])
            .expect("export")
            .to_json_pretty()
            .expect("json");

        let fresh = CanvasStore::new(StoreConfig::default());
        fresh.add_item();
        let fresh_surfaces = mount_all(&fresh);
        let doc = TranslationDocument::parse(&json).expect("parse");
        assert_eq!(doc.apply(&fresh, "en").expect("apply"), 1);

        let placed = fresh_surfaces[1]
            .read(|s| s.objects().iter().find(|o| o.is_text()).cloned())
            .expect("text applied");
        assert!((placed.placement.left - 100.0).abs() < f32::EPSILON);
        assert!((placed.placement.top - 612.0).abs() < f32::EPSILON);
        let (_, style) = placed.as_text().expect("text");
        assert!((style.font_size - 40.0).abs() < f32::EPSILON);
        assert_eq!(style.fill, "#ff00aa");
        assert_eq!(fresh_surfaces[0].read(|s| s.objects().len()), 0);
    }

    #[test]
    fn test_apply_replaces_existing_texts() {
        let store = CanvasStore::default();
        let surfaces = mount_all(&store);
        store.add_text().expect("text");
        let doc = TranslationDocument::export(&store, &[Language::new("en", "English")])
            .expect("export");
        store.add_text().expect("second text");
        doc.apply(&store, "en").expect("apply");
        assert_eq!(
            surfaces[0].read(|s| s.objects().iter().filter(|o| o.is_text()).count()),
            1
        );
        assert!(doc.apply(&store, "de").is_err());
    }

    #[test]
    fn test_preview_items() {
        let store = CanvasStore::default();
        mount_all(&store);
        store.add_text().expect("text");
        let doc = TranslationDocument::export(&store, &langs()).expect("export");
        let previews = doc.preview_items("fr").expect("previews");
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].id.as_str(), "fr-canvas-0");
        assert!(previews[0].overlay.snapshot.is_some());
        assert_eq!(previews[0].overlay.texts.len(), 1);
    }

    #[test]
    fn test_overlay_strips_snapshot_texts() {
        let store = CanvasStore::default();
        let surfaces = mount_all(&store);
        store.add_text().expect("text");
        let snapshot = surfaces[0].read(|s| s.snapshot()).expect("snapshot");
        let overlay = TranslationOverlay {
            snapshot: Some(snapshot),
            texts: vec![TextEntry {
                canvas_id: "canvas-1".to_string(),
                text: "Bonjour".to_string(),
                origin_x: OriginX::Center,
                left: 10.0,
                top: 20.0,
                font_size: 30.0,
                fill: "#000000".to_string(),
            }],
        };
        let target = MemorySurfaceFactory
            .create(100.0, 100.0, &Background::default())
            .expect("surface");
        target.write(|s| overlay.apply_to(s)).expect("apply");
        let texts: Vec<String> = target.read(|s| {
            s.objects()
                .iter()
                .filter_map(|o| o.as_text().map(|(c, _)| c.to_string()))
                .collect()
        });
        assert_eq!(texts, vec!["Bonjour".to_string()]);
        assert!((target.width() - 450.0).abs() < f32::EPSILON);
    }
}
