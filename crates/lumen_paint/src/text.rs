//! Text runs and the glyph rasterization contract
//!
//! Shaping and glyph rasterization are provided by an external font service.
//! The painter only positions runs; a [`GlyphRenderer`] turns them into pixels.

use lumen_core::{Color, Point};

/// Font weight (CSS numeric scale)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Thin,
    Light,
    #[default]
    Normal,
    Medium,
    Bold,
    Black,
}

impl FontWeight {
    pub fn from_number(n: u16) -> FontWeight {
        match n {
            0..=199 => FontWeight::Thin,
            200..=349 => FontWeight::Light,
            350..=449 => FontWeight::Normal,
            450..=649 => FontWeight::Medium,
            650..=849 => FontWeight::Bold,
            _ => FontWeight::Black,
        }
    }
}

/// A single line of text positioned in user space
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Top-left corner of the line box
    pub origin: Point,
    pub font_size: f32,
    pub line_height: f32,
    pub family: String,
    pub weight: FontWeight,
    pub color: Color,
}

/// Rasterizes text runs into a pixmap
pub trait GlyphRenderer {
    fn draw_run(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        run: &TextRun,
        transform: tiny_skia::Transform,
        clip: Option<&tiny_skia::Mask>,
    );
}

/// Renderer used when no font service is attached: runs are laid out but not drawn
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGlyphRenderer;

impl GlyphRenderer for NullGlyphRenderer {
    fn draw_run(
        &self,
        _pixmap: &mut tiny_skia::Pixmap,
        run: &TextRun,
        _transform: tiny_skia::Transform,
        _clip: Option<&tiny_skia::Mask>,
    ) {
        tracing::trace!(text = %run.text, "no glyph renderer attached");
    }
}
