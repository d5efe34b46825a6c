//! Software Drawer compositing slots onto a tiny-skia pixmap

use std::sync::{Arc, Mutex};

use lumen_core::{Affine2D, Color, Point, Rect};
use lumen_paint::{to_skia_color, to_skia_transform};
use tiny_skia::{BlendMode, FilterQuality, IntRect, Paint, Pixmap, PixmapPaint, Transform};
use tracing::trace;

use crate::drawer::{DrawOp, Drawer};
use crate::error::{PlatformError, Result};

/// Shared handle to the last frame an [`ImageDrawer`] published
#[derive(Clone, Debug, Default)]
pub struct FrameCapture {
    inner: Arc<Mutex<CaptureState>>,
}

#[derive(Debug, Default)]
struct CaptureState {
    frame: Option<Pixmap>,
    count: u64,
}

impl FrameCapture {
    /// Copy of the most recent frame
    pub fn latest(&self) -> Option<Pixmap> {
        self.inner.lock().ok()?.frame.clone()
    }

    /// Number of frames published so far
    pub fn frames(&self) -> u64 {
        self.inner.lock().map_or(0, |s| s.count)
    }

    fn publish(&self, frame: &Pixmap) {
        if let Ok(mut state) = self.inner.lock() {
            state.frame = Some(frame.clone());
            state.count += 1;
        }
    }
}

#[derive(Debug)]
struct Slot {
    width: u32,
    height: u32,
    layers: Vec<Option<Pixmap>>,
}

/// Drawer whose target is an in-memory image; `end_draw` publishes the
/// composed frame to its [`FrameCapture`]
#[derive(Debug)]
pub struct ImageDrawer {
    target: Pixmap,
    slots: Vec<Option<Slot>>,
    capture: FrameCapture,
    drawing: bool,
}

fn blend(op: DrawOp) -> BlendMode {
    match op {
        DrawOp::Src => BlendMode::Source,
        DrawOp::Over => BlendMode::SourceOver,
    }
}

impl ImageDrawer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let target = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| PlatformError::Drawer(format!("invalid target {width}x{height}")))?;
        Ok(Self {
            target,
            slots: (0..16).map(|_| None).collect(),
            capture: FrameCapture::default(),
            drawing: false,
        })
    }

    pub fn capture(&self) -> FrameCapture {
        self.capture.clone()
    }

    pub fn target(&self) -> &Pixmap {
        &self.target
    }

    /// Resize the target, discarding its contents
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.target = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| PlatformError::Drawer(format!("invalid target {width}x{height}")))?;
        Ok(())
    }

    fn image(&self, slot: usize, layer: u32) -> Result<&Pixmap> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .and_then(|s| s.layers.get(layer as usize))
            .and_then(Option::as_ref)
            .ok_or_else(|| PlatformError::Drawer(format!("slot {slot} layer {layer} is empty")))
    }

    /// Cut `src` out of a slot image, clamped to the image
    fn source(&self, slot: usize, layer: u32, src: Rect) -> Result<Option<Pixmap>> {
        let image = self.image(slot, layer)?;
        let bounds = Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32);
        let src = src.intersect(&bounds).round_out();
        if src.is_empty() {
            return Ok(None);
        }
        let rect = IntRect::from_xywh(
            src.x() as i32,
            src.y() as i32,
            src.width() as u32,
            src.height() as u32,
        );
        Ok(rect.and_then(|r| image.clone_rect(r)))
    }

    fn paste(&mut self, image: &Pixmap, transform: Transform, op: DrawOp, flip_y: bool) {
        let transform = if flip_y {
            transform.pre_concat(Transform::from_row(
                1.0,
                0.0,
                0.0,
                -1.0,
                0.0,
                image.height() as f32,
            ))
        } else {
            transform
        };
        let paint = PixmapPaint {
            blend_mode: blend(op),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.target
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    }
}

impl Drawer for ImageDrawer {
    fn max_textures(&self) -> usize {
        self.slots.len()
    }

    fn set_max_textures(&mut self, n: usize) {
        self.slots.resize_with(n, || None);
    }

    fn config_image(&mut self, slot: usize, width: u32, height: u32, layers: u32) -> Result<()> {
        let max = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| PlatformError::Drawer(format!("slot {slot} out of range ({max})")))?;
        *entry = Some(Slot {
            width,
            height,
            layers: (0..layers.max(1)).map(|_| None).collect(),
        });
        Ok(())
    }

    fn set_image(&mut self, slot: usize, layer: u32, image: &Pixmap, flip_y: bool) -> Result<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| PlatformError::Drawer(format!("slot {slot} is not configured")))?;
        if image.width() != entry.width || image.height() != entry.height {
            return Err(PlatformError::Drawer(format!(
                "image {}x{} does not match slot {slot} ({}x{})",
                image.width(),
                image.height(),
                entry.width,
                entry.height
            )));
        }
        let target = entry
            .layers
            .get_mut(layer as usize)
            .ok_or_else(|| PlatformError::Drawer(format!("slot {slot} has no layer {layer}")))?;
        let mut upload = image.clone();
        if flip_y {
            let row = image.width() as usize * 4;
            let data = upload.data_mut();
            let rows = data.len() / row.max(1);
            for y in 0..rows / 2 {
                let (top, bottom) = data.split_at_mut((rows - 1 - y) * row);
                top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
            }
        }
        *target = Some(upload);
        Ok(())
    }

    fn copy(
        &mut self,
        slot: usize,
        layer: u32,
        dst: Point,
        src: Rect,
        op: DrawOp,
        flip_y: bool,
    ) -> Result<()> {
        if let Some(image) = self.source(slot, layer, src)? {
            self.paste(&image, Transform::from_translate(dst.x, dst.y), op, flip_y);
        }
        Ok(())
    }

    fn scale(
        &mut self,
        slot: usize,
        layer: u32,
        dst: Rect,
        src: Rect,
        op: DrawOp,
        flip_y: bool,
    ) -> Result<()> {
        if let Some(image) = self.source(slot, layer, src)? {
            let sx = dst.width() / image.width() as f32;
            let sy = dst.height() / image.height() as f32;
            let t = Transform::from_row(sx, 0.0, 0.0, sy, dst.x(), dst.y());
            self.paste(&image, t, op, flip_y);
        }
        Ok(())
    }

    fn fill(&mut self, color: Color, transform: Affine2D, region: Rect, op: DrawOp) {
        let Some(rect) =
            tiny_skia::Rect::from_xywh(region.x(), region.y(), region.width(), region.height())
        else {
            return;
        };
        let mut paint = Paint {
            blend_mode: blend(op),
            ..Paint::default()
        };
        paint.set_color(to_skia_color(&color, 1.0));
        self.target
            .fill_rect(rect, &paint, to_skia_transform(&transform), None);
    }

    fn start_draw(&mut self, set_index: usize) -> bool {
        trace!(set_index, "start draw");
        self.drawing = true;
        true
    }

    fn end_draw(&mut self) {
        if self.drawing {
            self.drawing = false;
            self.capture.publish(&self.target);
        }
    }

    fn dest_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.target.width() as f32,
            self.target.height() as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_paint::pixel_at;

    fn solid(w: u32, h: u32, color: tiny_skia::Color) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        p.fill(color);
        p
    }

    #[test]
    fn slots_composite_bottom_to_top() {
        let mut d = ImageDrawer::new(20, 20).unwrap();
        let capture = d.capture();
        d.config_image(0, 20, 20, 1).unwrap();
        d.config_image(1, 5, 5, 1).unwrap();
        d.set_image(0, 0, &solid(20, 20, tiny_skia::Color::WHITE), false)
            .unwrap();
        d.set_image(1, 0, &solid(5, 5, tiny_skia::Color::BLACK), false)
            .unwrap();

        assert!(d.start_draw(0));
        d.copy(0, 0, Point::ZERO, Rect::new(0.0, 0.0, 20.0, 20.0), DrawOp::Src, false)
            .unwrap();
        d.copy(1, 0, Point::new(10.0, 10.0), Rect::new(0.0, 0.0, 5.0, 5.0), DrawOp::Over, false)
            .unwrap();
        assert_eq!(capture.frames(), 0);
        d.end_draw();

        let frame = capture.latest().unwrap();
        assert_eq!(capture.frames(), 1);
        assert_eq!(pixel_at(&frame, 2, 2), Some([255, 255, 255, 255]));
        assert_eq!(pixel_at(&frame, 12, 12), Some([0, 0, 0, 255]));
    }

    #[test]
    fn scale_and_fill() {
        let mut d = ImageDrawer::new(20, 20).unwrap();
        d.config_image(0, 2, 2, 1).unwrap();
        d.set_image(0, 0, &solid(2, 2, tiny_skia::Color::BLACK), false)
            .unwrap();
        d.fill(Color::RED, Affine2D::IDENTITY, Rect::new(0.0, 0.0, 20.0, 20.0), DrawOp::Src);
        d.scale(0, 0, Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 2.0, 2.0), DrawOp::Src, false)
            .unwrap();
        assert_eq!(pixel_at(d.target(), 5, 5), Some([0, 0, 0, 255]));
        assert_eq!(pixel_at(d.target(), 15, 15), Some([255, 0, 0, 255]));
    }

    #[test]
    fn bad_slots_are_errors() {
        let mut d = ImageDrawer::new(4, 4).unwrap();
        assert!(d.config_image(99, 1, 1, 1).is_err());
        assert!(d.set_image(0, 0, &solid(1, 1, tiny_skia::Color::BLACK), false).is_err());
        d.config_image(0, 2, 2, 1).unwrap();
        assert!(d.set_image(0, 0, &solid(1, 1, tiny_skia::Color::BLACK), false).is_err());
    }

    #[test]
    fn flip_on_upload() {
        let mut d = ImageDrawer::new(2, 2).unwrap();
        let mut img = Pixmap::new(1, 2).unwrap();
        img.fill_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap(),
            &{
                let mut p = Paint::default();
                p.set_color(tiny_skia::Color::BLACK);
                p
            },
            Transform::identity(),
            None,
        );
        d.config_image(0, 1, 2, 1).unwrap();
        d.set_image(0, 0, &img, true).unwrap();
        let stored = d.image(0, 0).unwrap();
        assert_eq!(pixel_at(stored, 0, 0), Some([0, 0, 0, 0]));
        assert_eq!(pixel_at(stored, 0, 1), Some([0, 0, 0, 255]));
    }
}
