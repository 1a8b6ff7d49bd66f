//! Scene to SVG conversion.
//!
//! The SVG document is the intermediate every raster goes through. Objects
//! are written bottom to top; each gets a transform built from its
//! placement: translate to the anchor, rotate, scale, then shift by the
//! origin so the anchor lands where `originX`/`originY` say.

use std::fmt::Write;

use shotframe_core::background::{Background, Fill};
use shotframe_core::object::{ObjectKind, PlacedObject, TextAlign, TextStyle};
use shotframe_core::Scene;

/// Render `scene` as an SVG document of `multiplier` times its size.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scene_to_svg(scene: &Scene, multiplier: f32) -> String {
    let multiplier = if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    };
    let (view_w, view_h) = (scene.width(), scene.height());
    let out_w = (view_w * multiplier).round().max(1.0) as u32;
    let out_h = (view_h * multiplier).round().max(1.0) as u32;

    let mut writer = SvgWriter::default();
    let _ = write!(
        writer.svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );
    writer.background(scene.background(), view_w, view_h);
    for object in scene.objects() {
        writer.object(object);
    }
    writer.svg.push_str("</svg>");
    writer.svg
}

#[derive(Default)]
struct SvgWriter {
    svg: String,
    next_id: usize,
}

impl SvgWriter {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn background(&mut self, background: &Background, width: f32, height: f32) {
        let opacity = background.opacity.clamp(0.0, 1.0);
        let _ = write!(self.svg, "<g opacity=\"{opacity}\">");
        match &background.fill {
            Fill::Solid { color } => {
                let _ = write!(
                    self.svg,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
                    escape_xml(color)
                );
            }
            Fill::Linear {
                x1,
                y1,
                x2,
                y2,
                stops,
            } => {
                let id = self.fresh_id("bg-gradient");
                let _ = write!(
                    self.svg,
                    "<defs><linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">",
                );
                for stop in stops {
                    let _ = write!(
                        self.svg,
                        "<stop offset=\"{}\" stop-color=\"{}\"/>",
                        stop.offset,
                        escape_xml(&stop.color)
                    );
                }
                let _ = write!(
                    self.svg,
                    "</linearGradient></defs><rect width=\"{width}\" height=\"{height}\" fill=\"url(#{id})\"/>",
                );
            }
        }
        if let Some(image) = &background.image {
            let (left, top, sx, sy) = image.placement(width, height);
            let _ = write!(
                self.svg,
                "<image transform=\"translate({left},{top}) scale({sx},{sy})\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                image.width,
                image.height,
                escape_xml(&image.src)
            );
        }
        self.svg.push_str("</g>");
    }

    fn object(&mut self, object: &PlacedObject) {
        let p = &object.placement;
        let (w, h) = object.natural_size();
        let _ = write!(
            self.svg,
            "<g transform=\"translate({},{}) rotate({}) scale({},{})",
            p.left, p.top, p.angle, p.scale_x, p.scale_y
        );
        // Group children are positioned relative to the group anchor.
        if !matches!(object.kind, ObjectKind::Group { .. }) {
            let _ = write!(
                self.svg,
                " translate({},{})",
                -p.origin_x.factor() * w,
                -p.origin_y.factor() * h
            );
        }
        self.svg.push_str("\">");

        match &object.kind {
            ObjectKind::Frame { src, .. } => self.image(src, w, h, None),
            ObjectKind::Image { src, clip, .. } => {
                let clip_id = clip.map(|c| {
                    let id = self.fresh_id("clip");
                    let _ = write!(
                        self.svg,
                        "<defs><clipPath id=\"{id}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"/></clipPath></defs>",
                        (w - c.width) / 2.0,
                        (h - c.height) / 2.0,
                        c.width,
                        c.height,
                        c.rx,
                        c.ry
                    );
                    id
                });
                self.image(src, w, h, clip_id.as_deref());
            }
            ObjectKind::Text { content, style } => self.text(content, style, w),
            ObjectKind::Group { children } => {
                for child in children {
                    self.object(child);
                }
            }
        }
        self.svg.push_str("</g>");
    }

    fn image(&mut self, src: &str, width: f32, height: f32, clip: Option<&str>) {
        let _ = write!(
            self.svg,
            "<image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"",
            escape_xml(src)
        );
        if let Some(id) = clip {
            let _ = write!(self.svg, " clip-path=\"url(#{id})\"");
        }
        self.svg.push_str("/>");
    }

    #[allow(clippy::cast_precision_loss)]
    fn text(&mut self, content: &str, style: &TextStyle, width: f32) {
        let line_step = style.font_size * style.line_height;
        if let Some(background) = &style.background {
            let lines = content.lines().count().max(1) as f32;
            let _ = write!(
                self.svg,
                "<rect width=\"{width}\" height=\"{}\" fill=\"{}\"/>",
                lines * line_step,
                escape_xml(background)
            );
        }
        let (x, anchor) = match style.text_align {
            TextAlign::Left | TextAlign::Justify => (0.0, "start"),
            TextAlign::Center => (width / 2.0, "middle"),
            TextAlign::Right => (width, "end"),
        };
        let _ = write!(
            self.svg,
            "<text font-size=\"{}\" font-family=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\"",
            style.font_size,
            escape_xml(&style.font_family),
            escape_xml(&style.font_weight),
            escape_xml(&style.fill)
        );
        if let Some(stroke) = &style.stroke {
            let _ = write!(self.svg, " stroke=\"{}\"", escape_xml(stroke));
        }
        self.svg.push('>');
        for (i, line) in content.lines().enumerate() {
            let y = style.font_size + i as f32 * line_step;
            let _ = write!(
                self.svg,
                "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
                escape_xml(line)
            );
        }
        self.svg.push_str("</text>");
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotframe_core::background::{BackgroundImage, GradientDirection, ImageFit};
    use shotframe_core::object::{ClipRect, Placement};

    fn scene() -> Scene {
        Scene::new(450.0, 800.0, Background::solid("#1a1a1b")).expect("scene")
    }

    fn text(content: &str) -> PlacedObject {
        PlacedObject::new(ObjectKind::Text {
            content: content.to_string(),
            style: TextStyle::default(),
        })
    }

    #[test]
    fn test_empty_scene() {
        let svg = scene_to_svg(&scene(), 1.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"450\""));
        assert!(svg.contains("fill=\"#1a1a1b\""));
    }

    #[test]
    fn test_multiplier_scales_output_not_viewbox() {
        let svg = scene_to_svg(&scene(), 2.4);
        assert!(svg.contains("width=\"1080\""));
        assert!(svg.contains("height=\"1920\""));
        assert!(svg.contains("viewBox=\"0 0 450 800\""));
    }

    #[test]
    fn test_text_is_escaped_and_split() {
        let mut scene = scene();
        scene.add_object(text("A < B\nC & D"));
        let svg = scene_to_svg(&scene, 1.0);
        assert!(svg.contains("A &lt; B</tspan>"));
        assert!(svg.contains("C &amp; D</tspan>"));
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn test_gradient_background() {
        let mut background = Background::default();
        background.fill = Fill::gradient(
            "#000000",
            "#ffffff",
            GradientDirection::Diagonal,
            450.0,
            800.0,
        );
        background.image = Some(BackgroundImage {
            src: "bg.png".to_string(),
            width: 900,
            height: 1600,
            fit: ImageFit::Stretch,
        });
        let scene = Scene::new(450.0, 800.0, background).expect("scene");
        let svg = scene_to_svg(&scene, 1.0);
        assert!(svg.contains("<linearGradient"));
        assert!(svg.contains("x2=\"450\""));
        assert!(svg.contains("scale(0.5,0.5)"));
    }

    #[test]
    fn test_clipped_group() {
        let mut scene = scene();
        let inner = PlacedObject::new(ObjectKind::Image {
            src: "shot.png".to_string(),
            width: 100,
            height: 200,
            clip: Some(ClipRect {
                width: 100.0,
                height: 200.0,
                rx: 10.0,
                ry: 10.0,
            }),
        })
        .with_placement(Placement::centered(0.0, 0.0, 0.5));
        let group = PlacedObject::new(ObjectKind::Group {
            children: vec![inner],
        })
        .with_placement(Placement::centered(225.0, 400.0, 1.0));
        scene.add_object(group);
        let svg = scene_to_svg(&scene, 1.0);
        assert!(svg.contains("<clipPath id=\"clip-1\">"));
        assert!(svg.contains("clip-path=\"url(#clip-1)\""));
        assert!(svg.contains("translate(225,400) rotate(0) scale(1,1)\">"));
        assert!(svg.contains("translate(-50,-100)"));
    }
}
