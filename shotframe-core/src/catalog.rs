//! Static catalog data: device frames, layout presets, store resolutions,
//! export modes and background presets.

use serde::{Deserialize, Serialize};

/// Device family of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Apple phone.
    Iphone,
    /// Android phone.
    Android,
    /// Any tablet.
    #[serde(rename = "tab", alias = "tablet")]
    Tablet,
}

impl DeviceKind {
    /// Whether this is a tablet. Tablets get larger frame scaling and
    /// cover-style screenshot fitting.
    #[must_use]
    pub const fn is_tablet(self) -> bool {
        matches!(self, Self::Tablet)
    }

    /// Parse from the identifiers used by device descriptors (`tab` and
    /// `tablet` both name tablets).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "iphone" | "phone" | "ios" => Some(Self::Iphone),
            "android" => Some(Self::Android),
            "tab" | "tablet" | "ipad" => Some(Self::Tablet),
            _ => None,
        }
    }
}

/// A selectable device frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSpec {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Category heading ("Phone", "Tablet").
    pub category: &'static str,
    /// Device family.
    pub kind: DeviceKind,
    /// Nominal screen width in pixels.
    pub screen_width: u32,
    /// Nominal screen height in pixels.
    pub screen_height: u32,
    /// Frame artwork location.
    pub image_url: &'static str,
    /// Screen corner radius (horizontal).
    pub rx: f32,
    /// Screen corner radius (vertical).
    pub ry: f32,
    /// Highlighted in the picker.
    pub popular: bool,
    /// Human-readable resolution label.
    pub dimensions: &'static str,
}

/// All device frames shipped with the editor.
pub const DEVICES: &[DeviceSpec] = &[
    DeviceSpec {
        id: "iphone-15-pro-max",
        name: "iPhone 15 Pro Max",
        category: "Phone",
        kind: DeviceKind::Iphone,
        screen_width: 1290,
        screen_height: 2796,
        image_url: "frames/iphone-15-pro-max.png",
        rx: 55.0,
        ry: 55.0,
        popular: true,
        dimensions: "1290 x 2796",
    },
    DeviceSpec {
        id: "iphone-15",
        name: "iPhone 15",
        category: "Phone",
        kind: DeviceKind::Iphone,
        screen_width: 1179,
        screen_height: 2556,
        image_url: "frames/iphone-15.png",
        rx: 50.0,
        ry: 50.0,
        popular: true,
        dimensions: "1179 x 2556",
    },
    DeviceSpec {
        id: "pixel-8-pro",
        name: "Pixel 8 Pro",
        category: "Phone",
        kind: DeviceKind::Android,
        screen_width: 1344,
        screen_height: 2992,
        image_url: "frames/pixel-8-pro.png",
        rx: 40.0,
        ry: 40.0,
        popular: false,
        dimensions: "1344 x 2992",
    },
    DeviceSpec {
        id: "galaxy-s24",
        name: "Galaxy S24",
        category: "Phone",
        kind: DeviceKind::Android,
        screen_width: 1080,
        screen_height: 2340,
        image_url: "frames/galaxy-s24.png",
        rx: 36.0,
        ry: 36.0,
        popular: false,
        dimensions: "1080 x 2340",
    },
    DeviceSpec {
        id: "ipad-pro-13",
        name: "iPad Pro 13\"",
        category: "Tablet",
        kind: DeviceKind::Tablet,
        screen_width: 2064,
        screen_height: 2752,
        image_url: "frames/ipad-pro-13.png",
        rx: 30.0,
        ry: 30.0,
        popular: true,
        dimensions: "2064 x 2752",
    },
    DeviceSpec {
        id: "galaxy-tab-s9",
        name: "Galaxy Tab S9",
        category: "Tablet",
        kind: DeviceKind::Tablet,
        screen_width: 1600,
        screen_height: 2560,
        image_url: "frames/galaxy-tab-s9.png",
        rx: 24.0,
        ry: 24.0,
        popular: false,
        dimensions: "1600 x 2560",
    },
];

/// Look up a device by ID.
#[must_use]
pub fn device(id: &str) -> Option<&'static DeviceSpec> {
    DEVICES.iter().find(|d| d.id == id)
}

/// Distinct categories in catalog order.
#[must_use]
pub fn categories() -> Vec<&'static str> {
    let mut seen = Vec::new();
    for d in DEVICES {
        if !seen.contains(&d.category) {
            seen.push(d.category);
        }
    }
    seen
}

/// A preset arrangement of a frame on a fresh surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPreset {
    /// Preset number.
    pub id: u32,
    /// Frame anchor X (center origin).
    pub left: f32,
    /// Frame anchor Y (center origin).
    pub top: f32,
    /// Frame rotation in degrees.
    pub angle: f32,
}

/// The preset arrangements offered in the layout picker.
pub const LAYOUTS: &[LayoutPreset] = &[
    LayoutPreset { id: 1, left: 50.0, top: 2.0, angle: 0.0 },
    LayoutPreset { id: 2, left: 90.0, top: 70.0, angle: 0.0 },
    LayoutPreset { id: 3, left: 95.0, top: 90.0, angle: 45.0 },
    LayoutPreset { id: 4, left: -5.0, top: 75.0, angle: 45.0 },
    LayoutPreset { id: 5, left: 50.0, top: 75.0, angle: 30.0 },
    LayoutPreset { id: 6, left: 60.0, top: 75.0, angle: -30.0 },
    LayoutPreset { id: 7, left: -10.0, top: 70.0, angle: 0.0 },
];

/// Look up a layout preset by number.
#[must_use]
pub fn layout(id: u32) -> Option<&'static LayoutPreset> {
    LAYOUTS.iter().find(|l| l.id == id)
}

/// Target resolution presets accepted by the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorePreset {
    /// 1080 x 1920.
    PhonePortrait,
    /// 1920 x 1080.
    PhoneLandscape,
    /// 1200 x 1920.
    TabletPortrait,
    /// Arbitrary base resolution.
    Custom {
        /// Base width.
        width: u32,
        /// Base height.
        height: u32,
    },
}

impl StorePreset {
    /// Base `(width, height)` before orientation and clamping.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::PhonePortrait => (1080, 1920),
            Self::PhoneLandscape => (1920, 1080),
            Self::TabletPortrait => (1200, 1920),
            Self::Custom { width, height } => (width, height),
        }
    }
}

/// Export completeness modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// Store minimum.
    #[default]
    Minimum,
    /// Recommended screenshot count for apps.
    AppHighlyRecommended,
    /// Recommended screenshot count for games.
    GameHighlyRecommended,
}

impl ExportMode {
    /// Minimum number of canvases the mode requires.
    #[must_use]
    pub const fn required_count(self) -> usize {
        match self {
            Self::Minimum => 2,
            Self::AppHighlyRecommended => 4,
            Self::GameHighlyRecommended => 3,
        }
    }

    /// Identifier used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::AppHighlyRecommended => "app-highly-recommended",
            Self::GameHighlyRecommended => "game-highly-recommended",
        }
    }
}

/// Background color every new surface starts with.
pub const DEFAULT_BACKGROUND: &str = "#1a1a1b";

/// Background quick presets `(name, color)`.
pub const BACKGROUND_PRESETS: &[(&str, &str)] = &[
    ("Dark", "#000000"),
    ("Light", "#ffffff"),
    ("Slate", "#1f2937"),
    ("Blue", "#3b82f6"),
];
