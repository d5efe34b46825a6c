//! Geometry primitives shared by every Lumen crate
//!
//! All coordinates are `f32` device dots. Rectangles are origin + size and
//! are considered empty when either extent is not strictly positive.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Axis helpers
// ─────────────────────────────────────────────────────────────────────────────

/// One of the two layout dimensions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dim {
    #[default]
    X,
    Y,
}

impl Dim {
    /// The other dimension
    pub fn other(self) -> Dim {
        match self {
            Dim::X => Dim::Y,
            Dim::Y => Dim::X,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Dim::X => 0,
            Dim::Y => 1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point / Vec2 / Size
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dim(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => self.x,
            Dim::Y => self.y,
        }
    }

    pub fn set_dim(&mut self, dim: Dim, value: f32) {
        match dim {
            Dim::X => self.x = value,
            Dim::Y => self.y = value,
        }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Vector from `other` to `self`
    pub fn sub(&self, other: Point) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn add(&self, v: Vec2) -> Point {
        Point::new(self.x + v.x, self.y + v.y)
    }

    pub fn distance(&self, other: Point) -> f32 {
        self.sub(other).length()
    }
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Angle of the vector in radians, measured from +X towards +Y
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn dim(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => self.width,
            Dim::Y => self.height,
        }
    }

    pub fn set_dim(&mut self, dim: Dim, value: f32) {
        match dim {
            Dim::X => self.width = value,
            Dim::Y => self.height = value,
        }
    }

    pub fn max(&self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    pub fn min(&self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    pub fn add(&self, other: Size) -> Size {
        Size::new(self.width + other.width, self.height + other.height)
    }

    /// Subtract, never going below zero
    pub fn sub(&self, other: Size) -> Size {
        Size::new(
            (self.width - other.width).max(0.0),
            (self.height - other.height).max(0.0),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }

    /// Round up to whole device pixels
    pub fn ceil(&self) -> Size {
        Size::new(self.width.ceil(), self.height.ceil())
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        size.to_rect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect
// ─────────────────────────────────────────────────────────────────────────────

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Create a rect from left/top/right/bottom edges
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Create a rect from two corner points
    pub fn from_points(p1: Point, p2: Point) -> Self {
        Rect::from_ltrb(p1.x.min(p2.x), p1.y.min(p2.y), p1.x.max(p2.x), p1.y.max(p2.y))
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x < self.max_x()
            && point.y >= self.origin.y
            && point.y < self.max_y()
    }

    /// True if `other` lies entirely within this rect
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.origin.x >= self.origin.x - 0.001
                && other.origin.y >= self.origin.y - 0.001
                && other.max_x() <= self.max_x() + 0.001
                && other.max_y() <= self.max_y() + 0.001)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect::from_origin_size(self.origin.offset(dx, dy), self.size)
    }

    /// Shrink by per-side insets, clamping to zero size
    pub fn inset_sides(&self, sides: &Sides<f32>) -> Self {
        Rect::new(
            self.origin.x + sides.left,
            self.origin.y + sides.top,
            (self.size.width - sides.left - sides.right).max(0.0),
            (self.size.height - sides.top - sides.bottom).max(0.0),
        )
    }

    /// Get the union of two rects (smallest rect containing both)
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_ltrb(
            self.origin.x.min(other.origin.x),
            self.origin.y.min(other.origin.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Expand rect to include a point
    pub fn expand_to_include(&self, point: Point) -> Self {
        Rect::from_ltrb(
            self.origin.x.min(point.x),
            self.origin.y.min(point.y),
            self.max_x().max(point.x),
            self.max_y().max(point.y),
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.origin.x < other.max_x()
            && self.max_x() > other.origin.x
            && self.origin.y < other.max_y()
            && self.max_y() > other.origin.y
    }

    /// Intersection of two rects, or `Rect::ZERO` when they do not overlap
    pub fn intersect(&self, other: &Rect) -> Rect {
        if !self.intersects(other) {
            return Rect::ZERO;
        }
        Rect::from_ltrb(
            self.origin.x.max(other.origin.x),
            self.origin.y.max(other.origin.y),
            self.max_x().min(other.max_x()),
            self.max_y().min(other.max_y()),
        )
    }

    /// Snap outward to the integer pixel grid
    pub fn round_out(&self) -> Rect {
        Rect::from_ltrb(
            self.origin.x.floor(),
            self.origin.y.floor(),
            self.max_x().ceil(),
            self.max_y().ceil(),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sides
// ─────────────────────────────────────────────────────────────────────────────

/// Per-side values in CSS order (top, right, bottom, left)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Sides<T> {
    pub const fn new(top: T, right: T, bottom: T, left: T) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn all(value: T) -> Self {
        Self::new(value, value, value, value)
    }

    /// Vertical value applies to top/bottom, horizontal to left/right
    pub const fn symmetric(vertical: T, horizontal: T) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    /// Expand a 1-4 value CSS shorthand list
    pub fn from_shorthand(values: &[T]) -> Option<Self> {
        match *values {
            [a] => Some(Self::all(a)),
            [v, h] => Some(Self::symmetric(v, h)),
            [t, h, b] => Some(Self::new(t, h, b, h)),
            [t, r, b, l] => Some(Self::new(t, r, b, l)),
            _ => None,
        }
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Sides<U> {
        Sides::new(f(self.top), f(self.right), f(self.bottom), f(self.left))
    }
}

impl Sides<f32> {
    pub const ZERO: Sides<f32> = Sides::all(0.0);

    /// Total extent along a dimension (start + end)
    pub fn dim(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => self.left + self.right,
            Dim::Y => self.top + self.bottom,
        }
    }

    /// Leading edge along a dimension
    pub fn start(&self, dim: Dim) -> f32 {
        match dim {
            Dim::X => self.left,
            Dim::Y => self.top,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.dim(Dim::X), self.dim(Dim::Y))
    }

    pub fn add(&self, other: &Sides<f32>) -> Sides<f32> {
        Sides::new(
            self.top + other.top,
            self.right + other.right,
            self.bottom + other.bottom,
            self.left + other.left,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Affine2D
// ─────────────────────────────────────────────────────────────────────────────

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn skew_x(angle: f32) -> Self {
        Self::new(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(angle: f32) -> Self {
        Self::new(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Map the unit square onto `rect`
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.width(), 0.0, 0.0, rect.height(), rect.x(), rect.y())
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(a * point.x + c * point.y + tx, b * point.x + d * point.y + ty)
    }

    /// Transform a vector (ignores translation)
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.elements;
        Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
    }

    /// Axis-aligned bounds of a transformed rect
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        if rect.is_empty() && rect.size == Size::ZERO {
            let p = self.transform_point(rect.origin);
            return Rect::from_origin_size(p, Size::ZERO);
        }
        let corners = [
            rect.origin,
            Point::new(rect.max_x(), rect.y()),
            Point::new(rect.max_x(), rect.max_y()),
            Point::new(rect.x(), rect.max_y()),
        ];
        let first = self.transform_point(corners[0]);
        let mut out = Rect::from_origin_size(first, Size::ZERO);
        for corner in &corners[1..] {
            out = out.expand_to_include(self.transform_point(*corner));
        }
        out
    }

    /// Concatenate this transform with another (self * other).
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;
        Affine2D::new(
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * tx2 + c1 * ty2 + tx1,
            b1 * tx2 + d1 * ty2 + ty1,
        )
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    pub fn inverse(&self) -> Option<Affine2D> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv = 1.0 / det;
        Some(Affine2D::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * ty - d * tx) * inv,
            (b * tx - a * ty) * inv,
        ))
    }

    /// Average scale factor, used to scale stroke widths
    pub fn mean_scale(&self) -> f32 {
        self.determinant().abs().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.intersect(&Rect::new(5.0, 5.0, 10.0, 10.0)), Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 100.0, 40.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(50.0, 20.0)));
        assert!(!r.contains(Point::new(100.0, 20.0)));
    }

    #[test]
    fn affine_inverse_round_trips() {
        let t = Affine2D::translation(10.0, 5.0)
            .then(&Affine2D::rotation(0.5))
            .then(&Affine2D::scale(2.0, 3.0));
        let inv = t.inverse().expect("invertible");
        let p = Point::new(3.0, -7.0);
        let back = inv.transform_point(t.transform_point(p));
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
    }

    #[test]
    fn sides_shorthand() {
        let s = Sides::from_shorthand(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s, Sides::new(1.0, 2.0, 3.0, 2.0));
        assert_eq!(s.dim(Dim::X), 4.0);
        assert!(Sides::<f32>::from_shorthand(&[]).is_none());
    }
}
