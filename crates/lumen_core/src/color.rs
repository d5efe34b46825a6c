//! Colors, gradients and brushes
//!
//! Gradients carry their own coordinate units so the same value can be used
//! by widget backgrounds and by the SVG sub-pipeline. [`Gradient::color_at`]
//! evaluates a gradient on the CPU; the painter hands the same description to
//! the rasterizer.

use crate::geometry::{Affine2D, Point, Rect};

/// RGBA color, straight (non-premultiplied) alpha, components in `0.0..=1.0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as u8;
        let g = ((hex >> 8) & 0xFF) as u8;
        let b = (hex & 0xFF) as u8;
        Self::from_rgba8(r, g, b, 255)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Multiply the alpha channel (opacity composition)
    pub fn mul_alpha(mut self, factor: f32) -> Self {
        self.a = (self.a * factor).clamp(0.0, 1.0);
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `#rrggbb` (alpha is written separately as an opacity attribute)
    pub fn to_hex_string(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Source-over composition of `self` on top of `dst`
    pub fn over(&self, dst: &Color) -> Color {
        let a = self.a + dst.a * (1.0 - self.a);
        if a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |s: f32, d: f32| (s * self.a + d * dst.a * (1.0 - self.a)) / a;
        Color::rgba(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b), a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gradients
// ─────────────────────────────────────────────────────────────────────────────

/// Gradient stop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0)
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Gradient coordinate space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientUnits {
    /// Coordinates are in user space (absolute dots)
    UserSpaceOnUse,
    /// Coordinates are relative to the shape bounding box (0.0-1.0)
    #[default]
    ObjectBoundingBox,
}

/// Gradient spread method for areas outside the gradient vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientSpread {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// Geometry of a gradient
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    Linear {
        start: Point,
        end: Point,
    },
    Radial {
        center: Point,
        radius: f32,
        /// Focal point; the center when absent
        focal: Option<Point>,
    },
}

/// A linear or radial gradient
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    /// Color stops, sorted by offset
    pub stops: Vec<GradientStop>,
    pub units: GradientUnits,
    pub spread: GradientSpread,
    /// Applied in gradient space before the units mapping
    pub transform: Affine2D,
}

impl Gradient {
    /// Two-color linear gradient in bounding-box units
    pub fn linear(start: Point, end: Point, from: Color, to: Color) -> Self {
        Self::new(
            GradientKind::Linear { start, end },
            vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
        )
    }

    /// Two-color radial gradient in bounding-box units
    pub fn radial(center: Point, radius: f32, from: Color, to: Color) -> Self {
        Self::new(
            GradientKind::Radial {
                center,
                radius,
                focal: None,
            },
            vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
        )
    }

    pub fn new(kind: GradientKind, stops: Vec<GradientStop>) -> Self {
        let mut gradient = Self {
            kind,
            stops,
            units: GradientUnits::ObjectBoundingBox,
            spread: GradientSpread::Pad,
            transform: Affine2D::IDENTITY,
        };
        gradient.normalize_stops();
        gradient
    }

    pub fn with_units(mut self, units: GradientUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_spread(mut self, spread: GradientSpread) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_transform(mut self, transform: Affine2D) -> Self {
        self.transform = transform;
        self
    }

    /// Offsets must be monotonically non-decreasing; later stops are clamped up
    pub fn normalize_stops(&mut self) {
        let mut last = 0.0f32;
        for stop in &mut self.stops {
            stop.offset = stop.offset.clamp(0.0, 1.0).max(last);
            last = stop.offset;
        }
    }

    pub fn first_color(&self) -> Color {
        self.stops.first().map(|s| s.color).unwrap_or(Color::BLACK)
    }

    /// Transform from gradient space to user space for a shape with `bbox`
    pub fn to_user_space(&self, bbox: &Rect) -> Affine2D {
        match self.units {
            GradientUnits::UserSpaceOnUse => self.transform,
            GradientUnits::ObjectBoundingBox => Affine2D::from_rect(bbox).then(&self.transform),
        }
    }

    /// Evaluate the gradient color at a user-space point of a shape with `bbox`
    pub fn color_at(&self, point: Point, bbox: &Rect) -> Color {
        let Some(inv) = self.to_user_space(bbox).inverse() else {
            return self.first_color();
        };
        let p = inv.transform_point(point);
        let t = match self.kind {
            GradientKind::Linear { start, end } => {
                let d = end.sub(start);
                let len2 = d.x * d.x + d.y * d.y;
                if len2 <= f32::EPSILON {
                    0.0
                } else {
                    let v = p.sub(start);
                    (v.x * d.x + v.y * d.y) / len2
                }
            }
            GradientKind::Radial { center, radius, .. } => {
                if radius <= 0.0 {
                    1.0
                } else {
                    p.distance(center) / radius
                }
            }
        };
        self.color_at_offset(t)
    }

    /// Color at a position along the gradient vector, after spread handling
    pub fn color_at_offset(&self, t: f32) -> Color {
        let t = match self.spread {
            GradientSpread::Pad => t.clamp(0.0, 1.0),
            GradientSpread::Repeat => t - t.floor(),
            GradientSpread::Reflect => {
                let m = t.rem_euclid(2.0);
                if m > 1.0 {
                    2.0 - m
                } else {
                    m
                }
            }
        };
        match self.stops.as_slice() {
            [] => Color::TRANSPARENT,
            [only] => only.color,
            stops => {
                if t <= stops[0].offset {
                    return stops[0].color;
                }
                for pair in stops.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    if t <= b.offset {
                        let span = b.offset - a.offset;
                        if span <= f32::EPSILON {
                            return b.color;
                        }
                        return Color::lerp(&a.color, &b.color, (t - a.offset) / span);
                    }
                }
                stops[stops.len() - 1].color
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Brush / CornerRadius
// ─────────────────────────────────────────────────────────────────────────────

/// Brush for filling shapes
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    Solid(Color),
    Gradient(Gradient),
}

impl Brush {
    pub fn is_transparent(&self) -> bool {
        match self {
            Brush::Solid(c) => c.is_transparent(),
            Brush::Gradient(g) => g.stops.iter().all(|s| s.color.is_transparent()),
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Brush::Solid(Color::TRANSPARENT)
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Brush::Solid(color)
    }
}

impl From<Gradient> for Brush {
    fn from(gradient: Gradient) -> Self {
        Brush::Gradient(gradient)
    }
}

/// Corner radii for rounded rectangles
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const ZERO: CornerRadius = CornerRadius {
        top_left: 0.0,
        top_right: 0.0,
        bottom_right: 0.0,
        bottom_left: 0.0,
    };

    /// Order: top_left, top_right, bottom_right, bottom_left (clockwise from top-left)
    pub fn new(top_left: f32, top_right: f32, bottom_right: f32, bottom_left: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    pub fn is_zero(&self) -> bool {
        self.top_left <= 0.0
            && self.top_right <= 0.0
            && self.bottom_right <= 0.0
            && self.bottom_left <= 0.0
    }

    /// Shrink every radius by `amount`, used for the inner edge of borders
    pub fn inset(&self, amount: f32) -> Self {
        let f = |r: f32| (r - amount).max(0.0);
        Self::new(
            f(self.top_left),
            f(self.top_right),
            f(self.bottom_right),
            f(self.bottom_left),
        )
    }
}

impl From<f32> for CornerRadius {
    fn from(radius: f32) -> Self {
        Self::uniform(radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Color, b: &Color) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn bounding_box_linear_gradient_is_lerp() {
        let bbox = Rect::new(20.0, 10.0, 200.0, 50.0);
        let g = Gradient::linear(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Color::rgb(1.0, 0.5, 0.0),
            Color::rgb(0.0, 0.5, 1.0),
        );
        for &t in &[0.0f32, 0.1, 0.25, 0.5, 0.9, 1.0] {
            for &y in &[0.0f32, 0.3, 1.0] {
                let p = Point::new(bbox.x() + t * bbox.width(), bbox.y() + y * bbox.height());
                let expected = Color::lerp(&g.stops[0].color, &g.stops[1].color, t);
                assert!(close(&g.color_at(p, &bbox), &expected), "t={t} y={y}");
            }
        }
    }

    #[test]
    fn spread_modes() {
        let g = Gradient::linear(Point::ZERO, Point::new(1.0, 0.0), Color::BLACK, Color::WHITE);
        assert_eq!(g.color_at_offset(1.5), Color::WHITE);
        let rep = g.clone().with_spread(GradientSpread::Repeat);
        assert!(close(&rep.color_at_offset(1.25), &Color::rgb(0.25, 0.25, 0.25)));
        let refl = g.with_spread(GradientSpread::Reflect);
        assert!(close(&refl.color_at_offset(1.25), &Color::rgb(0.75, 0.75, 0.75)));
    }

    #[test]
    fn radial_user_space() {
        let g = Gradient::radial(Point::new(50.0, 50.0), 50.0, Color::WHITE, Color::BLACK)
            .with_units(GradientUnits::UserSpaceOnUse);
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(close(&g.color_at(Point::new(50.0, 50.0), &bbox), &Color::WHITE));
        assert!(close(&g.color_at(Point::new(75.0, 50.0), &bbox), &Color::GRAY));
    }

    #[test]
    fn over_composition() {
        let top = Color::rgba(1.0, 0.0, 0.0, 0.5);
        let out = top.over(&Color::WHITE);
        assert!(close(&out, &Color::rgb(1.0, 0.5, 0.5)));
        assert_eq!(out.a, 1.0);
    }
}
