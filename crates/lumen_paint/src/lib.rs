//! Lumen Paint
//!
//! Canvas-like 2D painter rasterized on the CPU with tiny-skia.
//!
//! Widgets and the SVG sub-pipeline draw through a [`PaintContext`], which
//! keeps a stack of transform, clip and opacity states over a borrowed
//! [`Pixmap`]. Gradients in [`lumen_core::Brush`] are lowered to tiny-skia
//! shaders against the bounding box of the shape being filled.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{Brush, Color, Rect};
//! use lumen_paint::{PaintContext, Pixmap};
//!
//! let mut pixmap = Pixmap::new(64, 64).unwrap();
//! let mut ctx = PaintContext::new(&mut pixmap);
//! ctx.fill_rect(Rect::new(0.0, 0.0, 32.0, 32.0), &Brush::Solid(Color::RED));
//! ```

pub mod context;
pub mod gradient;
pub mod path;
pub mod text;

pub use context::{pixel_at, PaintContext};
pub use gradient::{brush_paint, gradient_shader, to_skia_color};
pub use path::{to_skia_fill_rule, to_skia_path, to_skia_stroke, to_skia_transform};
pub use text::{FontWeight, GlyphRenderer, NullGlyphRenderer, TextRun};

pub use tiny_skia::{Mask, Pixmap};
