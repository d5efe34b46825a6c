//! Scrollbars and scroll offsets
//!
//! Scrolling never re-runs sizing: it only moves the offsets stored in
//! [`GeomState`] and recomputes bounding boxes with the position pass.

use lumen_core::{Dim, Rect, Size, Vec2};

use crate::flags::Abilities;
use crate::geom::{GeomState, ScrollBar};
use crate::style::{Overflow, Style};
use crate::tree::{SceneTree, WidgetId};

/// Shortest thumb, as a multiple of the bar width
const MIN_THUMB: f32 = 2.0;

/// Whether an axis shows a scrollbar for content of `internal` in `viewport`
pub fn needs_bar(overflow: Overflow, internal: f32, viewport: f32) -> bool {
    match overflow {
        Overflow::Scroll => true,
        Overflow::Auto => internal > viewport + 0.5,
        Overflow::Visible | Overflow::Hidden => false,
    }
}

/// Scrollbars for a content box and the content extent inside it.
///
/// Returns the content box with the bar strips removed, and one bar per
/// axis that scrolls.
pub fn layout_bars(style: &Style, content: Rect, internal: Size) -> (Rect, [Option<Rect>; 2]) {
    let bar = style.scrollbar_width.dots;
    let mut inner = content;
    let y = needs_bar(style.overflow.y, internal.height, content.height());
    if y {
        inner.size.width = (inner.size.width - bar).max(0.0);
    }
    let x = needs_bar(style.overflow.x, internal.width, inner.width());
    if x {
        inner.size.height = (inner.size.height - bar).max(0.0);
    }
    let tracks = [
        x.then(|| Rect::new(inner.x(), inner.max_y(), inner.width(), bar)),
        y.then(|| Rect::new(inner.max_x(), inner.y(), bar, inner.height())),
    ];
    (inner, tracks)
}

/// Thumb placement for a track, given the current offset
pub fn scrollbar(dim: Dim, track: Rect, bar: f32, viewport: f32, internal: f32, offset: f32) -> ScrollBar {
    let visible_pct = if internal > 0.0 {
        (viewport / internal).min(1.0)
    } else {
        1.0
    };
    let len = track.size.dim(dim);
    let thumb_len = (len * visible_pct).max(bar * MIN_THUMB).min(len);
    let max_scroll = (internal - viewport).max(0.0);
    let frac = if max_scroll > 0.0 { offset / max_scroll } else { 0.0 };
    let mut thumb = track;
    thumb.size.set_dim(dim, thumb_len);
    let start = track.origin.dim(dim) + (len - thumb_len) * frac;
    thumb.origin.set_dim(dim, start);
    ScrollBar {
        dim,
        track,
        thumb,
        visible_pct,
    }
}

/// Whether `geom` can move by `delta` on `dim`
fn can_scroll(geom: &GeomState, dim: Dim, delta: f32) -> bool {
    let pos = match dim {
        Dim::X => geom.scroll.x,
        Dim::Y => geom.scroll.y,
    };
    geom.has_scrollbar(dim)
        && ((delta > 0.0 && pos < geom.max_scroll(dim)) || (delta < 0.0 && pos > 0.0))
}

/// Scroll the deepest widget along `path` (deepest first) that can move.
///
/// Returns the widget that scrolled.
pub fn scroll_wheel(tree: &mut SceneTree, path: &[WidgetId], delta: Vec2) -> Option<WidgetId> {
    let dim = if delta.y.abs() >= delta.x.abs() {
        Dim::Y
    } else {
        Dim::X
    };
    let amount = match dim {
        Dim::X => delta.x,
        Dim::Y => delta.y,
    };
    for &id in path {
        let Some(node) = tree.node_mut(id) else {
            continue;
        };
        if !node.can(Abilities::SCROLLABLE) && !node.geom.has_scrollbar(dim) {
            continue;
        }
        if !can_scroll(&node.geom, dim, amount) {
            continue;
        }
        let current = match dim {
            Dim::X => node.geom.scroll.x,
            Dim::Y => node.geom.scroll.y,
        };
        if node.geom.set_scroll(dim, current + amount) {
            return Some(id);
        }
    }
    None
}

/// Set a widget's scroll offset, clamped. Returns whether it moved.
pub fn scroll_to(tree: &mut SceneTree, id: WidgetId, dim: Dim, offset: f32) -> bool {
    tree.node_mut(id)
        .is_some_and(|n| n.geom.set_scroll(dim, offset))
}

/// Scroll the nearest scrolling ancestor of `id` so `id` is in view
pub fn scroll_into_view(tree: &mut SceneTree, id: WidgetId) -> bool {
    let Some(target) = tree.node(id).map(|n| n.geom.total_bbox) else {
        return false;
    };
    let Some(scroller) = tree.parent_widget_if(id, |_, n| {
        n.geom.has_scrollbar(Dim::X) || n.geom.has_scrollbar(Dim::Y)
    }) else {
        return false;
    };
    let Some(node) = tree.node_mut(scroller) else {
        return false;
    };
    let view = node.geom.content;
    let mut moved = false;
    for dim in [Dim::X, Dim::Y] {
        if !node.geom.has_scrollbar(dim) {
            continue;
        }
        let (start, end) = (target.origin.dim(dim), target.origin.dim(dim) + target.size.dim(dim));
        let (vstart, vend) = (view.origin.dim(dim), view.origin.dim(dim) + view.size.dim(dim));
        let current = match dim {
            Dim::X => node.geom.scroll.x,
            Dim::Y => node.geom.scroll.y,
        };
        let delta = if start < vstart {
            start - vstart
        } else if end > vend {
            (end - vend).min(start - vstart)
        } else {
            0.0
        };
        if delta != 0.0 {
            moved |= node.geom.set_scroll(dim, current + delta);
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use lumen_core::Length;

    use super::*;
    use crate::style::XY;

    #[test]
    fn bars_reserve_strips() {
        let mut style = Style::default();
        style.overflow = XY::new(Overflow::Visible, Overflow::Auto);
        style.scrollbar_width = Length::px(10.0);
        let content = Rect::new(0.0, 0.0, 100.0, 100.0);
        let (inner, bars) = layout_bars(&style, content, Size::new(90.0, 1000.0));
        assert_eq!(inner.width(), 90.0);
        assert!(bars[0].is_none());
        assert_eq!(bars[1], Some(Rect::new(90.0, 0.0, 10.0, 100.0)));

        let (inner, bars) = layout_bars(&style, content, Size::new(90.0, 50.0));
        assert_eq!(inner, content);
        assert!(bars[1].is_none());
    }

    #[test]
    fn thumb_tracks_offset() {
        let track = Rect::new(90.0, 0.0, 10.0, 100.0);
        let top = scrollbar(Dim::Y, track, 10.0, 100.0, 1000.0, 0.0);
        assert_eq!(top.thumb.height(), 20.0);
        assert_eq!(top.thumb.y(), 0.0);
        let bottom = scrollbar(Dim::Y, track, 10.0, 100.0, 1000.0, 900.0);
        assert_eq!(bottom.thumb.max_y(), 100.0);
        assert!((bottom.visible_pct - 0.1).abs() < 1e-6);
        assert!((bottom.scroll_per_pixel(900.0) - 11.25).abs() < 1e-4);
    }
}
