//! Per-widget geometry written by the layout passes

use lumen_core::{Dim, Point, Rect, Sides, Size, Vec2};

use crate::style::XY;

/// A scrollbar installed on one axis of a scrolling widget
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollBar {
    pub dim: Dim,
    /// Reserved strip in scene coordinates
    pub track: Rect,
    pub thumb: Rect,
    /// Fraction of the content that is visible
    pub visible_pct: f32,
}

impl ScrollBar {
    /// Scroll distance per pixel of thumb motion
    pub fn scroll_per_pixel(&self, max_scroll: f32) -> f32 {
        let travel = self.track.size.dim(self.dim) - self.thumb.size.dim(self.dim);
        if travel <= 0.0 {
            0.0
        } else {
            max_scroll / travel
        }
    }
}

/// Geometry of one widget.
///
/// Sizes are total sizes (content plus padding and border) unless noted.
/// Everything here is written only by the layout passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomState {
    /// Minimum size needed, grown toward `alloc` by the final pass
    pub actual: Size,
    /// Size granted by the parent
    pub alloc: Size,
    /// Extent of the content, larger than the viewport when scrolling
    pub internal: Size,
    /// Intrinsic content size reported by the widget itself
    pub intrinsic: Size,
    /// Padding plus border
    pub space: Sides<f32>,
    /// Fill the allocation on an axis even without grow (cross-axis stretch)
    pub stretch: XY<bool>,

    /// Position relative to the parent's content origin, before scrolling
    pub rel_pos: Point,
    /// Total box in scene coordinates
    pub total_bbox: Rect,
    /// Content box in scene coordinates, excluding scrollbar strips
    pub content: Rect,
    /// Total box clipped by every ancestor clip
    pub content_bbox: Rect,
    /// Clipped box intersected with the visible scene
    pub vis_bbox: Rect,

    pub scroll: Vec2,
    pub scrollbars: XY<Option<ScrollBar>>,
}

impl GeomState {
    /// Content size (total minus padding and border)
    pub fn content_size(&self) -> Size {
        self.actual.sub(self.space.size())
    }

    /// Largest scroll offset on an axis
    pub fn max_scroll(&self, dim: Dim) -> f32 {
        (self.internal.dim(dim) - self.content.size.dim(dim)).max(0.0)
    }

    pub fn has_scrollbar(&self, dim: Dim) -> bool {
        self.scrollbars.dim(dim).is_some()
    }

    /// Set the scroll offset on an axis, clamped to the valid range.
    /// Returns whether it changed.
    pub fn set_scroll(&mut self, dim: Dim, offset: f32) -> bool {
        let clamped = offset.clamp(0.0, self.max_scroll(dim));
        let old = match dim {
            Dim::X => self.scroll.x,
            Dim::Y => self.scroll.y,
        };
        if (old - clamped).abs() < f32::EPSILON {
            return false;
        }
        match dim {
            Dim::X => self.scroll.x = clamped,
            Dim::Y => self.scroll.y = clamped,
        }
        true
    }

    /// Whether this widget can be drawn
    pub fn is_visible(&self) -> bool {
        !self.vis_bbox.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_clamps_to_content() {
        let mut g = GeomState {
            internal: Size::new(100.0, 1000.0),
            content: Rect::new(0.0, 0.0, 100.0, 100.0),
            ..GeomState::default()
        };
        assert!(g.set_scroll(Dim::Y, 2000.0));
        assert_eq!(g.scroll.y, 900.0);
        assert!(!g.set_scroll(Dim::Y, 950.0));
        assert!(!g.set_scroll(Dim::X, 10.0));
    }
}
