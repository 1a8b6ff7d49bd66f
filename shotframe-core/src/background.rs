//! Surface background: solid or gradient fill, optional image, opacity.

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_BACKGROUND;

/// One gradient color stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position along the gradient, 0.0..=1.0.
    pub offset: f32,
    /// CSS color.
    pub color: String,
}

/// Direction of a linear gradient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Top-left to bottom-right.
    Diagonal,
}

impl GradientDirection {
    /// Gradient line `(x1, y1, x2, y2)` for a surface of the given size.
    #[must_use]
    pub fn coordinates(self, width: f32, height: f32) -> (f32, f32, f32, f32) {
        match self {
            Self::Horizontal => (0.0, 0.0, width, 0.0),
            Self::Vertical => (0.0, 0.0, 0.0, height),
            Self::Diagonal => (0.0, 0.0, width, height),
        }
    }
}

/// Background fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fill {
    /// Single color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// Two-or-more stop linear gradient in surface pixel coordinates.
    Linear {
        /// Start X.
        x1: f32,
        /// Start Y.
        y1: f32,
        /// End X.
        x2: f32,
        /// End Y.
        y2: f32,
        /// Color stops.
        stops: Vec<ColorStop>,
    },
}

impl Fill {
    /// Solid fill.
    #[must_use]
    pub fn solid(color: impl Into<String>) -> Self {
        Self::Solid {
            color: color.into(),
        }
    }

    /// Two-color gradient across a surface of the given size.
    #[must_use]
    pub fn gradient(
        start: impl Into<String>,
        end: impl Into<String>,
        direction: GradientDirection,
        width: f32,
        height: f32,
    ) -> Self {
        let (x1, y1, x2, y2) = direction.coordinates(width, height);
        Self::Linear {
            x1,
            y1,
            x2,
            y2,
            stops: vec![
                ColorStop {
                    offset: 0.0,
                    color: start.into(),
                },
                ColorStop {
                    offset: 1.0,
                    color: end.into(),
                },
            ],
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Self::solid(DEFAULT_BACKGROUND)
    }
}

/// How a background image is scaled onto the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Contain, centered.
    #[default]
    Fit,
    /// Scale each axis independently to the surface size.
    Stretch,
    /// Cover, centered.
    Fill,
}

/// An image painted above the fill and below every object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    /// Image source URL or data URI.
    pub src: String,
    /// Natural width.
    pub width: u32,
    /// Natural height.
    pub height: u32,
    /// Scaling mode.
    pub fit: ImageFit,
}

impl BackgroundImage {
    /// Placement `(left, top, scale_x, scale_y)` of the image's top-left
    /// corner on a surface of the given size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn placement(&self, surface_width: f32, surface_height: f32) -> (f32, f32, f32, f32) {
        let iw = (self.width.max(1)) as f32;
        let ih = (self.height.max(1)) as f32;
        let sx = surface_width / iw;
        let sy = surface_height / ih;
        match self.fit {
            ImageFit::Stretch => (0.0, 0.0, sx, sy),
            ImageFit::Fit | ImageFit::Fill => {
                let s = if self.fit == ImageFit::Fit {
                    sx.min(sy)
                } else {
                    sx.max(sy)
                };
                (
                    (surface_width - iw * s) / 2.0,
                    (surface_height - ih * s) / 2.0,
                    s,
                    s,
                )
            }
        }
    }
}

/// Full background state of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Fill beneath everything.
    pub fill: Fill,
    /// Optional image above the fill.
    #[serde(default)]
    pub image: Option<BackgroundImage>,
    /// Opacity of the background layer, 0.0..=1.0.
    #[serde(default = "Background::default_opacity")]
    pub opacity: f32,
}

impl Background {
    const fn default_opacity() -> f32 {
        1.0
    }

    /// Solid-colored background.
    #[must_use]
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            fill: Fill::solid(color),
            image: None,
            opacity: 1.0,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::solid(DEFAULT_BACKGROUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_coordinates_follow_surface_size() {
        let fill = Fill::gradient("#000", "#fff", GradientDirection::Diagonal, 450.0, 800.0);
        let Fill::Linear { x2, y2, stops, .. } = fill else {
            panic!("expected gradient");
        };
        assert!((x2 - 450.0).abs() < f32::EPSILON);
        assert!((y2 - 800.0).abs() < f32::EPSILON);
        assert_eq!(stops.len(), 2);
    }

    #[test]
    fn test_image_fit_modes() {
        let mut image = BackgroundImage {
            src: "bg.png".to_string(),
            width: 100,
            height: 200,
            fit: ImageFit::Fit,
        };
        let (left, top, sx, sy) = image.placement(400.0, 400.0);
        assert!((sx - 2.0).abs() < f32::EPSILON);
        assert!((sy - 2.0).abs() < f32::EPSILON);
        assert!((left - 100.0).abs() < f32::EPSILON);
        assert!(top.abs() < f32::EPSILON);

        image.fit = ImageFit::Fill;
        let (_, top, sx, _) = image.placement(400.0, 400.0);
        assert!((sx - 4.0).abs() < f32::EPSILON);
        assert!((top + 200.0).abs() < f32::EPSILON);

        image.fit = ImageFit::Stretch;
        let (_, _, sx, sy) = image.placement(400.0, 400.0);
        assert!((sx - 4.0).abs() < f32::EPSILON);
        assert!((sy - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_default_background() {
        assert_eq!(Background::default().fill, Fill::solid("#1a1a1b"));
    }
}
