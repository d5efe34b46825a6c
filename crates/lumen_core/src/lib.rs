//! Lumen Core
//!
//! Foundational value types used throughout the Lumen toolkit:
//!
//! - **Geometry**: points, sizes, rectangles, per-side values and affine transforms
//! - **Color**: colors, linear/radial gradients (with CPU evaluation) and brushes
//! - **Paths**: absolute vector paths with SVG arcs, strokes and fill rules
//! - **Units**: logical lengths and the per-widget conversion context
//! - **Input**: mouse buttons, keys, modifiers and key chords
//! - **Parsing**: shared CSS/SVG value grammar (colors, lengths, transforms)
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{Color, Gradient, Point, Rect};
//!
//! let g = Gradient::linear(Point::new(0.0, 0.0), Point::new(1.0, 0.0), Color::WHITE, Color::BLACK);
//! let bbox = Rect::new(0.0, 0.0, 100.0, 100.0);
//! let mid = g.color_at(Point::new(50.0, 50.0), &bbox);
//! assert!((mid.r - 0.5).abs() < 1e-6);
//! ```

pub mod color;
pub mod geometry;
pub mod input;
pub mod parse;
pub mod path;
pub mod units;

pub use color::{
    Brush, Color, CornerRadius, Gradient, GradientKind, GradientSpread, GradientStop,
    GradientUnits,
};
pub use geometry::{Affine2D, Dim, Point, Rect, Sides, Size, Vec2};
pub use input::{ChordParseError, Key, KeyChord, KeyState, Modifiers, MouseButton};
pub use parse::LengthValue;
pub use path::{FillRule, LineCap, LineJoin, Path, PathCommand, Stroke, Vertex};
pub use units::{Length, Unit, UnitContext};
