//! Placed objects - the contents of a drawing surface's z-stack.
//!
//! Every object carries an explicit [`ObjectKind`] discriminator so editor
//! code can branch on what an object *is* without asking the rendering
//! backend about runtime types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::DeviceKind;

/// Unique identifier for a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Horizontal anchor of an object's `left` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    /// `left` is the object's left edge.
    #[default]
    Left,
    /// `left` is the object's horizontal center.
    Center,
    /// `left` is the object's right edge.
    Right,
}

impl OriginX {
    /// Fraction of the object width that lies left of the anchor.
    #[must_use]
    pub const fn factor(self) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

/// Vertical anchor of an object's `top` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    /// `top` is the object's top edge.
    #[default]
    Top,
    /// `top` is the object's vertical center.
    Center,
    /// `top` is the object's bottom edge.
    Bottom,
}

impl OriginY {
    /// Fraction of the object height that lies above the anchor.
    #[must_use]
    pub const fn factor(self) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

/// Position, anchor, scale and rotation of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// X coordinate of the anchor point.
    pub left: f32,
    /// Y coordinate of the anchor point.
    pub top: f32,
    /// Horizontal anchor.
    #[serde(default)]
    pub origin_x: OriginX,
    /// Vertical anchor.
    #[serde(default)]
    pub origin_y: OriginY,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Rotation in degrees, clockwise, around the anchor.
    #[serde(default)]
    pub angle: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl Placement {
    /// Center-anchored placement at `(left, top)` with a uniform scale.
    #[must_use]
    pub fn centered(left: f32, top: f32, scale: f32) -> Self {
        Self {
            left,
            top,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
            scale_x: scale,
            scale_y: scale,
            angle: 0.0,
        }
    }
}

/// Rounded clipping rectangle in the object's local (unscaled) units,
/// centered on the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    /// Clip width.
    pub width: f32,
    /// Clip height.
    pub height: f32,
    /// Horizontal corner radius.
    pub rx: f32,
    /// Vertical corner radius.
    pub ry: f32,
}

/// Horizontal text alignment inside a text box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center each line.
    Center,
    /// Align to the right edge.
    Right,
    /// Justify lines.
    Justify,
}

/// Styling of a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// CSS-style font weight (`normal`, `bold`, `100`..`900`).
    pub font_weight: String,
    /// Line height multiplier.
    pub line_height: f32,
    /// Fill color.
    pub fill: String,
    /// Optional stroke color.
    pub stroke: Option<String>,
    /// Optional background color behind the text box.
    pub background: Option<String>,
    /// Alignment.
    pub text_align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            font_family: "sans-serif".to_string(),
            font_weight: "normal".to_string(),
            line_height: 1.16,
            fill: "#FFFFFF".to_string(),
            stroke: None,
            background: None,
            text_align: TextAlign::Left,
        }
    }
}

/// What a placed object is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ObjectKind {
    /// A device-mockup frame image.
    Frame {
        /// Frame image source URL or data URI.
        src: String,
        /// Natural image width in pixels.
        width: u32,
        /// Natural image height in pixels.
        height: u32,
        /// Device family the frame belongs to, if known.
        device: Option<DeviceKind>,
    },

    /// A plain raster image (e.g. a screenshot placed behind a bezel).
    Image {
        /// Image source URL or data URI.
        src: String,
        /// Natural image width in pixels.
        width: u32,
        /// Natural image height in pixels.
        height: u32,
        /// Optional rounded clip.
        clip: Option<ClipRect>,
    },

    /// An editable text run.
    Text {
        /// Text content.
        content: String,
        /// Styling.
        style: TextStyle,
    },

    /// Objects moved and scaled together. Child placements are relative to
    /// the group's anchor.
    Group {
        /// Grouped objects, bottom first.
        children: Vec<PlacedObject>,
    },
}

impl ObjectKind {
    /// Short name of the kind, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Frame { .. } => "frame",
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Group { .. } => "group",
        }
    }
}

/// An object placed on a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Object content.
    pub kind: ObjectKind,
    /// Position and scale.
    pub placement: Placement,
    /// Whether the user can select the object.
    #[serde(default = "PlacedObject::default_selectable")]
    pub selectable: bool,
    /// Whether movement is locked (layout frames).
    #[serde(default)]
    pub locked: bool,
    /// Whether a delete affordance is attached to the object.
    #[serde(default)]
    pub deletable: bool,
}

impl PlacedObject {
    const fn default_selectable() -> bool {
        true
    }

    /// Create a new object with the given kind at the default placement.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            placement: Placement::default(),
            selectable: true,
            locked: false,
            deletable: false,
        }
    }

    /// Set the placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Attach a delete affordance.
    #[must_use]
    pub fn with_delete_control(mut self) -> Self {
        self.deletable = true;
        self
    }

    /// Lock movement.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Whether this object is a device frame.
    #[must_use]
    pub const fn is_frame(&self) -> bool {
        matches!(self.kind, ObjectKind::Frame { .. })
    }

    /// Whether this object is a text run.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, ObjectKind::Text { .. })
    }

    /// Text content and style, if this is a text object.
    #[must_use]
    pub fn as_text(&self) -> Option<(&str, &TextStyle)> {
        match &self.kind {
            ObjectKind::Text { content, style } => Some((content, style)),
            _ => None,
        }
    }

    /// Mutable text content and style, if this is a text object.
    pub fn as_text_mut(&mut self) -> Option<(&mut String, &mut TextStyle)> {
        match &mut self.kind {
            ObjectKind::Text { content, style } => Some((content, style)),
            _ => None,
        }
    }

    /// Unscaled size of the object.
    ///
    /// Text size is an estimate from the glyph count; exact metrics belong to
    /// the rendering backend.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn natural_size(&self) -> (f32, f32) {
        match &self.kind {
            ObjectKind::Frame { width, height, .. } | ObjectKind::Image { width, height, .. } => {
                (*width as f32, *height as f32)
            }
            ObjectKind::Text { content, style } => {
                let longest = content
                    .lines()
                    .map(|l| l.chars().count())
                    .max()
                    .unwrap_or(0);
                let lines = content.lines().count().max(1);
                (
                    longest as f32 * style.font_size * 0.6,
                    lines as f32 * style.font_size * style.line_height,
                )
            }
            ObjectKind::Group { children } => {
                let mut max_w: f32 = 0.0;
                let mut max_h: f32 = 0.0;
                for child in children {
                    let (w, h) = child.scaled_size();
                    max_w = max_w.max(w);
                    max_h = max_h.max(h);
                }
                (max_w, max_h)
            }
        }
    }

    /// Size of the object after applying its scale.
    #[must_use]
    pub fn scaled_size(&self) -> (f32, f32) {
        let (w, h) = self.natural_size();
        (w * self.placement.scale_x, h * self.placement.scale_y)
    }

    /// Deep copy with fresh IDs for this object and all descendants.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        if let ObjectKind::Group { children } = &mut copy.kind {
            for child in children.iter_mut() {
                *child = child.duplicate();
            }
        }
        copy
    }
}
