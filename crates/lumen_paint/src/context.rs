//! Paint context - Canvas-like drawing API over a CPU pixmap
//!
//! PaintContext is a thin state machine: a stack of (transform, clip,
//! opacity) states over a borrowed [`tiny_skia::Pixmap`]. Every primitive is
//! issued in user space and mapped by the current transform.

use std::rc::Rc;

use lumen_core::{
    Affine2D, Brush, Color, CornerRadius, FillRule, Path, Point, Rect, Size, Stroke,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::gradient::{brush_paint, to_skia_color};
use crate::path::{to_skia_fill_rule, to_skia_path, to_skia_stroke, to_skia_transform};
use crate::text::{GlyphRenderer, NullGlyphRenderer, TextRun};

static NULL_GLYPHS: NullGlyphRenderer = NullGlyphRenderer;

#[derive(Clone)]
struct PaintState {
    transform: Affine2D,
    /// Device-space bounds of the current clip
    clip_bounds: Rect,
    /// Coverage mask; `None` when the clip is the whole pixmap
    clip_mask: Option<Rc<tiny_skia::Mask>>,
    opacity: f32,
}

/// The paint context used by widgets and the SVG renderer
pub struct PaintContext<'a> {
    pixmap: &'a mut tiny_skia::Pixmap,
    state: PaintState,
    stack: SmallVec<[PaintState; 16]>,
    glyphs: &'a dyn GlyphRenderer,
}

impl<'a> PaintContext<'a> {
    pub fn new(pixmap: &'a mut tiny_skia::Pixmap) -> Self {
        let bounds = Rect::new(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32);
        Self {
            pixmap,
            state: PaintState {
                transform: Affine2D::IDENTITY,
                clip_bounds: bounds,
                clip_mask: None,
                opacity: 1.0,
            },
            stack: SmallVec::new(),
            glyphs: &NULL_GLYPHS,
        }
    }

    /// Attach the font service used by [`PaintContext::draw_text`]
    pub fn with_glyph_renderer(mut self, glyphs: &'a dyn GlyphRenderer) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        self.pixmap
    }

    /// Fill the whole target, ignoring transform and clip
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(to_skia_color(&color, 1.0));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // State stack
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => trace!("restore without matching save"),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn transform(&self) -> Affine2D {
        self.state.transform
    }

    /// Pre-concatenate `t`: subsequent drawing is mapped by `t` first
    pub fn concat(&mut self, t: &Affine2D) {
        self.state.transform = self.state.transform.then(t);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.concat(&Affine2D::translation(dx, dy));
    }

    pub fn set_transform(&mut self, t: Affine2D) {
        self.state.transform = t;
    }

    pub fn opacity(&self) -> f32 {
        self.state.opacity
    }

    /// Multiply the current opacity
    pub fn apply_opacity(&mut self, opacity: f32) {
        self.state.opacity *= opacity.clamp(0.0, 1.0);
    }

    /// Device-space bounds of the current clip
    pub fn clip_bounds(&self) -> Rect {
        self.state.clip_bounds
    }

    /// True when nothing drawn in the current state can reach the pixmap
    pub fn is_clipped_out(&self) -> bool {
        self.state.clip_bounds.is_empty() || self.state.opacity <= 0.0
    }

    /// Intersect the clip with a user-space rectangle
    pub fn clip_rect(&mut self, rect: Rect) {
        let [_, b, c, _, _, _] = self.state.transform.elements;
        if b != 0.0 || c != 0.0 {
            self.clip_path(&Path::rect(rect), FillRule::NonZero);
            return;
        }
        let device = self.state.transform.transform_rect(&rect);
        let bounds = self.state.clip_bounds.intersect(&device);
        self.state.clip_bounds = bounds;
        if bounds.is_empty() {
            return;
        }
        let full = Rect::new(0.0, 0.0, self.pixmap.width() as f32, self.pixmap.height() as f32);
        if self.state.clip_mask.is_none() && device.contains_rect(&full) {
            return;
        }
        let Some(sk_rect) = tiny_skia::Rect::from_xywh(
            device.x(),
            device.y(),
            device.width(),
            device.height(),
        ) else {
            self.state.clip_bounds = Rect::ZERO;
            return;
        };
        let path = tiny_skia::PathBuilder::from_rect(sk_rect);
        self.intersect_mask(&path, tiny_skia::FillRule::Winding, tiny_skia::Transform::identity());
    }

    /// Intersect the clip with a user-space path
    pub fn clip_path(&mut self, path: &Path, rule: FillRule) {
        let Some(sk_path) = to_skia_path(path) else {
            self.state.clip_bounds = Rect::ZERO;
            return;
        };
        let device = self.state.transform.transform_rect(&path.bounds());
        self.state.clip_bounds = self.state.clip_bounds.intersect(&device);
        if self.state.clip_bounds.is_empty() {
            return;
        }
        let transform = to_skia_transform(&self.state.transform);
        self.intersect_mask(&sk_path, to_skia_fill_rule(rule), transform);
    }

    fn intersect_mask(
        &mut self,
        path: &tiny_skia::Path,
        rule: tiny_skia::FillRule,
        transform: tiny_skia::Transform,
    ) {
        let mask = match self.state.clip_mask.as_deref() {
            Some(existing) => {
                let mut mask = existing.clone();
                mask.intersect_path(path, rule, true, transform);
                Some(mask)
            }
            None => tiny_skia::Mask::new(self.pixmap.width(), self.pixmap.height()).map(
                |mut mask| {
                    mask.fill_path(path, rule, true, transform);
                    mask
                },
            ),
        };
        match mask {
            Some(mask) => self.state.clip_mask = Some(Rc::new(mask)),
            None => self.state.clip_bounds = Rect::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Primitives
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn fill_path(&mut self, path: &Path, brush: &Brush, rule: FillRule) {
        self.fill_path_in(path, brush, rule, &path.bounds());
    }

    /// Fill using an explicit bounding box for gradient units
    pub fn fill_path_in(&mut self, path: &Path, brush: &Brush, rule: FillRule, bbox: &Rect) {
        if self.is_clipped_out() {
            return;
        }
        let Some(sk_path) = to_skia_path(path) else {
            return;
        };
        let Some(paint) = brush_paint(brush, bbox, self.state.opacity) else {
            return;
        };
        let transform = to_skia_transform(&self.state.transform);
        let mask = self.state.clip_mask.as_deref();
        self.pixmap
            .fill_path(&sk_path, &paint, to_skia_fill_rule(rule), transform, mask);
    }

    pub fn stroke_path(&mut self, path: &Path, stroke: &Stroke, brush: &Brush) {
        self.stroke_path_in(path, stroke, brush, &path.bounds());
    }

    pub fn stroke_path_in(&mut self, path: &Path, stroke: &Stroke, brush: &Brush, bbox: &Rect) {
        if self.is_clipped_out() || stroke.width <= 0.0 {
            return;
        }
        let Some(sk_path) = to_skia_path(path) else {
            return;
        };
        let Some(paint) = brush_paint(brush, bbox, self.state.opacity) else {
            return;
        };
        let transform = to_skia_transform(&self.state.transform);
        let mask = self.state.clip_mask.as_deref();
        self.pixmap
            .stroke_path(&sk_path, &paint, &to_skia_stroke(stroke), transform, mask);
    }

    pub fn fill_rect(&mut self, rect: Rect, brush: &Brush) {
        if rect.is_empty() {
            return;
        }
        self.fill_path_in(&Path::rect(rect), brush, FillRule::NonZero, &rect);
    }

    pub fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke, brush: &Brush) {
        self.stroke_path_in(&Path::rect(rect), stroke, brush, &rect);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: CornerRadius, brush: &Brush) {
        if rect.is_empty() {
            return;
        }
        self.fill_path_in(&Path::rounded_rect(rect, radius), brush, FillRule::NonZero, &rect);
    }

    pub fn stroke_rounded_rect(
        &mut self,
        rect: Rect,
        radius: CornerRadius,
        stroke: &Stroke,
        brush: &Brush,
    ) {
        self.stroke_path_in(&Path::rounded_rect(rect, radius), stroke, brush, &rect);
    }

    pub fn fill_ellipse(&mut self, center: Point, rx: f32, ry: f32, brush: &Brush) {
        self.fill_path(&Path::ellipse(center, rx, ry), brush, FillRule::NonZero);
    }

    pub fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke, brush: &Brush) {
        let bbox = Rect::from_points(from, to);
        self.stroke_path_in(&Path::line(from, to), stroke, brush, &bbox);
    }

    pub fn fill_polygon(&mut self, points: &[Point], brush: &Brush, rule: FillRule) {
        self.fill_path(&Path::polyline(points, true), brush, rule);
    }

    /// Draw `image` scaled into the user-space rectangle `dest`
    pub fn draw_image(&mut self, image: &tiny_skia::Pixmap, dest: Rect) {
        if self.is_clipped_out() || dest.is_empty() || image.width() == 0 || image.height() == 0 {
            return;
        }
        let sx = dest.width() / image.width() as f32;
        let sy = dest.height() / image.height() as f32;
        let t = self
            .state
            .transform
            .then(&Affine2D::translation(dest.x(), dest.y()))
            .then(&Affine2D::scale(sx, sy));
        let paint = tiny_skia::PixmapPaint {
            opacity: self.state.opacity,
            quality: if (sx - 1.0).abs() < f32::EPSILON && (sy - 1.0).abs() < f32::EPSILON {
                tiny_skia::FilterQuality::Nearest
            } else {
                tiny_skia::FilterQuality::Bilinear
            },
            ..tiny_skia::PixmapPaint::default()
        };
        let mask = self.state.clip_mask.as_deref();
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, to_skia_transform(&t), mask);
    }

    /// Draw a single positioned line of text through the glyph renderer
    pub fn draw_text(&mut self, run: &TextRun) {
        if self.is_clipped_out() || run.text.is_empty() {
            return;
        }
        let transform = to_skia_transform(&self.state.transform);
        let mask = self.state.clip_mask.as_deref();
        if self.state.opacity < 1.0 {
            let mut faded = run.clone();
            faded.color = faded.color.mul_alpha(self.state.opacity);
            self.glyphs.draw_run(self.pixmap, &faded, transform, mask);
        } else {
            self.glyphs.draw_run(self.pixmap, run, transform, mask);
        }
    }
}

/// Read a pixel as a straight-alpha color, `None` when out of bounds
pub fn pixel_at(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> Option<[u8; 4]> {
    pixmap.pixel(x, y).map(|p| {
        let c = p.demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Gradient;

    fn pixmap(w: u32, h: u32) -> tiny_skia::Pixmap {
        tiny_skia::Pixmap::new(w, h).unwrap()
    }

    #[test]
    fn fill_rect_solid() {
        let mut pm = pixmap(20, 20);
        let mut ctx = PaintContext::new(&mut pm);
        ctx.fill_rect(Rect::new(5.0, 5.0, 10.0, 10.0), &Brush::Solid(Color::RED));
        assert_eq!(pixel_at(&pm, 10, 10), Some([255, 0, 0, 255]));
        assert_eq!(pixel_at(&pm, 1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn clip_rect_limits_drawing_and_restore_resets() {
        let mut pm = pixmap(20, 20);
        let mut ctx = PaintContext::new(&mut pm);
        ctx.save();
        ctx.clip_rect(Rect::new(0.0, 0.0, 10.0, 20.0));
        ctx.fill_rect(Rect::new(0.0, 0.0, 20.0, 10.0), &Brush::Solid(Color::BLUE));
        ctx.restore();
        ctx.fill_rect(Rect::new(0.0, 10.0, 20.0, 10.0), &Brush::Solid(Color::GREEN));
        assert_eq!(pixel_at(&pm, 5, 5), Some([0, 0, 255, 255]));
        assert_eq!(pixel_at(&pm, 15, 5), Some([0, 0, 0, 0]));
        assert_eq!(pixel_at(&pm, 15, 15), Some([0, 255, 0, 255]));
    }

    #[test]
    fn translate_moves_primitives() {
        let mut pm = pixmap(20, 20);
        let mut ctx = PaintContext::new(&mut pm);
        ctx.translate(10.0, 10.0);
        ctx.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), &Brush::Solid(Color::WHITE));
        assert_eq!(pixel_at(&pm, 12, 12), Some([255, 255, 255, 255]));
        assert_eq!(pixel_at(&pm, 2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn gradient_rect_uses_bounding_box() {
        let mut pm = pixmap(100, 10);
        let mut ctx = PaintContext::new(&mut pm);
        let g = Gradient::linear(Point::ZERO, Point::new(1.0, 0.0), Color::WHITE, Color::BLACK);
        ctx.fill_rect(Rect::new(0.0, 0.0, 100.0, 10.0), &Brush::Gradient(g));
        let left = pixel_at(&pm, 0, 5).unwrap();
        let mid = pixel_at(&pm, 50, 5).unwrap();
        let right = pixel_at(&pm, 99, 5).unwrap();
        assert!(left[0] >= 250);
        assert!((116..=132).contains(&mid[0]));
        assert!(right[0] <= 5);
    }

    #[test]
    fn fully_clipped_context_skips_drawing() {
        let mut pm = pixmap(10, 10);
        let mut ctx = PaintContext::new(&mut pm);
        ctx.clip_rect(Rect::new(20.0, 20.0, 5.0, 5.0));
        assert!(ctx.is_clipped_out());
        ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(Color::RED));
        assert_eq!(pixel_at(&pm, 5, 5), Some([0, 0, 0, 0]));
    }
}
