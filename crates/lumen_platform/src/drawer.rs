//! The Drawer: an image-slot compositor over a window surface
//!
//! Scenes render into CPU images; the Drawer owns one texture per slot and
//! pastes slots onto the window target bottom-to-top between
//! [`Drawer::start_draw`] and [`Drawer::end_draw`].

use lumen_core::{Affine2D, Color, Point, Rect};
use tiny_skia::Pixmap;

use crate::error::Result;

/// Compositing operator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawOp {
    /// Replace destination pixels
    Src,
    /// Alpha-blend over destination pixels
    #[default]
    Over,
}

pub trait Drawer {
    /// Number of image slots
    fn max_textures(&self) -> usize;

    fn set_max_textures(&mut self, n: usize);

    /// Declare the geometry of `slot`; clears its contents
    fn config_image(&mut self, slot: usize, width: u32, height: u32, layers: u32) -> Result<()>;

    /// Upload `image` into a configured slot layer
    fn set_image(&mut self, slot: usize, layer: u32, image: &Pixmap, flip_y: bool) -> Result<()>;

    /// Paste `src` of a slot layer at `dst` on the target
    fn copy(
        &mut self,
        slot: usize,
        layer: u32,
        dst: Point,
        src: Rect,
        op: DrawOp,
        flip_y: bool,
    ) -> Result<()>;

    /// Paste `src` of a slot layer scaled into `dst`
    fn scale(
        &mut self,
        slot: usize,
        layer: u32,
        dst: Rect,
        src: Rect,
        op: DrawOp,
        flip_y: bool,
    ) -> Result<()>;

    fn fill(&mut self, color: Color, transform: Affine2D, region: Rect, op: DrawOp);

    /// Begin a frame; false when the surface is not available
    fn start_draw(&mut self, set_index: usize) -> bool;

    fn end_draw(&mut self);

    /// Target rectangle in device pixels
    fn dest_bounds(&self) -> Rect;
}

/// Drawer that accepts everything and draws nothing; the fallback after a
/// backend failure
#[derive(Debug, Default, Clone)]
pub struct NoopDrawer {
    bounds: Rect,
    max_textures: usize,
}

impl NoopDrawer {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            max_textures: 16,
        }
    }
}

impl Drawer for NoopDrawer {
    fn max_textures(&self) -> usize {
        self.max_textures
    }

    fn set_max_textures(&mut self, n: usize) {
        self.max_textures = n;
    }

    fn config_image(&mut self, _: usize, _: u32, _: u32, _: u32) -> Result<()> {
        Ok(())
    }

    fn set_image(&mut self, _: usize, _: u32, _: &Pixmap, _: bool) -> Result<()> {
        Ok(())
    }

    fn copy(&mut self, _: usize, _: u32, _: Point, _: Rect, _: DrawOp, _: bool) -> Result<()> {
        Ok(())
    }

    fn scale(&mut self, _: usize, _: u32, _: Rect, _: Rect, _: DrawOp, _: bool) -> Result<()> {
        Ok(())
    }

    fn fill(&mut self, _: Color, _: Affine2D, _: Rect, _: DrawOp) {}

    fn start_draw(&mut self, _: usize) -> bool {
        true
    }

    fn end_draw(&mut self) {}

    fn dest_bounds(&self) -> Rect {
        self.bounds
    }
}
