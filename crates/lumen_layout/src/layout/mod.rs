//! The four layout passes
//!
//! ```text
//! SizeUp     bottom-up   minimum sizes from styles, content and children
//! SizeDown   top-down    distribute the parent's allocation; iterated
//! SizeFinal  bottom-up   grow toward the allocation where asked to
//! Position   top-down    place children, bounding boxes, scrollbars
//! ```
//!
//! `actual` stays the minimum size through SizeDown; only SizeFinal grows it,
//! and never beyond `alloc`. Axes whose overflow is not visible absorb the
//! size of their content instead of passing it up, and show a scrollbar
//! when the content does not fit.

pub(crate) mod flex;
mod grid;

use lumen_core::{Dim, Point, Rect, Size};
use tracing::{debug, trace};

use crate::flags::StateFlags;
use crate::geom::GeomState;
use crate::scroll::{layout_bars, scrollbar};
use crate::settings::Settings;
use crate::style::{Align, Display, Overflow, Style, XY};
use crate::text::TextMeasurer;
use crate::tree::{SceneTree, WidgetId};
use crate::widget::MeasureCx;

/// Inputs shared by every pass
pub struct LayoutCx<'a> {
    pub measurer: &'a dyn TextMeasurer,
    pub settings: &'a Settings,
}

/// What the last full layout did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// SizeDown iterations run
    pub size_down_iterations: usize,
    /// Whether the last iteration changed nothing
    pub converged: bool,
}

/// A child as seen by its parent's layout model
#[derive(Clone, Copy, Debug)]
pub(crate) struct Item {
    pub id: WidgetId,
    pub actual: Size,
    pub grow: XY<f32>,
    pub align_self: Option<Align>,
    pub justify_self: Option<Align>,
    pub rel_pos: Point,
}

fn items(tree: &SceneTree, id: WidgetId) -> Vec<Item> {
    tree.children(id)
        .iter()
        .filter_map(|&c| {
            let n = tree.node(c)?;
            if n.is(StateFlags::INVISIBLE) {
                return None;
            }
            Some(Item {
                id: c,
                actual: n.geom.actual,
                grow: n.style.grow,
                align_self: n.style.align_self,
                justify_self: n.style.justify_self,
                rel_pos: n.geom.rel_pos,
            })
        })
        .collect()
}

fn same(a: Size, b: Size) -> bool {
    (a.width - b.width).abs() < 0.01 && (a.height - b.height).abs() < 0.01
}

/// Run every pass over the tree rooted at `root` for a scene of `size`
pub fn layout_scene(tree: &mut SceneTree, root: WidgetId, size: Size, cx: &LayoutCx<'_>) -> LayoutStats {
    size_up(tree, root, cx);
    if let Some(n) = tree.node_mut(root) {
        n.geom.alloc = size;
        n.geom.stretch = XY::splat(true);
    }

    let cap = cx.settings.size_down_iterations.max(1);
    let mut stats = LayoutStats::default();
    for i in 0..cap {
        stats.size_down_iterations = i + 1;
        if !size_down(tree, root, cx) {
            stats.converged = true;
            break;
        }
    }
    if !stats.converged {
        debug!(iterations = cap, "size down did not reach a fixpoint");
    }

    size_final(tree, root);
    if let Some(n) = tree.node_mut(root) {
        n.geom.actual = size;
    }
    position_scene(tree, root, Rect::from(size));
    stats
}

/// Minimum size of the tree at `root`: SizeUp only. Popups use it to fit
/// their scene to the content.
pub fn measure_scene(tree: &mut SceneTree, root: WidgetId, cx: &LayoutCx<'_>) -> Size {
    size_up(tree, root, cx);
    tree.node(root).map(|n| n.geom.actual).unwrap_or_default()
}

// ============================================================================
// Aggregation
// ============================================================================

/// Minimum size of a widget from its current intrinsic size and its
/// children's sizes. Returns (actual, internal).
fn aggregate(tree: &SceneTree, id: WidgetId, avail: Option<Size>) -> (Size, Size) {
    let Some(node) = tree.node(id) else {
        return (Size::ZERO, Size::ZERO);
    };
    if node.is(StateFlags::INVISIBLE) {
        return (Size::ZERO, Size::ZERO);
    }
    let style = &node.style;
    let kids = items(tree, id);
    let children = match style.display {
        Display::Flex => flex::content_size(style, &kids, avail.map(|a| a.dim(style.direction.dim()))),
        Display::Grid => grid::content_size(style, &kids),
        Display::Stacked => kids.iter().fold(Size::ZERO, |acc, it| acc.max(it.actual)),
        Display::Custom => kids.iter().fold(Size::ZERO, |acc, it| {
            acc.max(Size::new(it.rel_pos.x + it.actual.width, it.rel_pos.y + it.actual.height))
        }),
        Display::None => Size::ZERO,
    };
    let parts = node
        .parts
        .and_then(|p| tree.node(p))
        .map(|p| p.geom.actual)
        .unwrap_or_default();
    let internal = node.geom.intrinsic.max(children).max(parts);

    let mut content = internal;
    for dim in [Dim::X, Dim::Y] {
        if style.overflow.dim(dim) != Overflow::Visible {
            content.set_dim(dim, 0.0);
        }
    }
    let mut total = content.add(node.geom.space.size());
    let bar = style.scrollbar_width.dots;
    if style.overflow.y == Overflow::Scroll {
        total.width += bar;
    }
    if style.overflow.x == Overflow::Scroll {
        total.height += bar;
    }
    (style.clamp_size(total), internal)
}

fn intrinsic(tree: &SceneTree, id: WidgetId, cx: &LayoutCx<'_>, width: Option<f32>) -> Size {
    tree.node(id)
        .and_then(|n| {
            let w = n.widget()?;
            Some(w.content_size(
                &MeasureCx {
                    measurer: cx.measurer,
                    style: &n.style,
                },
                width,
            ))
        })
        .unwrap_or_default()
}

// ============================================================================
// Pass 1: SizeUp
// ============================================================================

fn size_up(tree: &mut SceneTree, id: WidgetId, cx: &LayoutCx<'_>) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if node.is(StateFlags::INVISIBLE) {
        if let Some(n) = tree.node_mut(id) {
            n.geom = GeomState::default();
        }
        return;
    }
    let children = node.children.clone();
    let parts = node.parts;
    for c in children {
        size_up(tree, c, cx);
    }
    if let Some(p) = parts {
        size_up(tree, p, cx);
    }

    let intrinsic = intrinsic(tree, id, cx, None);
    if let Some(n) = tree.node_mut(id) {
        n.geom.intrinsic = intrinsic;
        n.geom.space = n.style.box_space();
        n.geom.stretch = XY::splat(false);
        n.geom.alloc = Size::ZERO;
    }
    let (actual, internal) = aggregate(tree, id, None);
    if let Some(n) = tree.node_mut(id) {
        n.geom.actual = actual;
        n.geom.internal = internal;
    }
}

// ============================================================================
// Pass 2: SizeDown
// ============================================================================

/// Content space available inside a widget, with scrollbar strips removed.
/// On axes that scroll, children get at least their full extent.
fn inner_space(style: &Style, geom: &GeomState) -> (Size, Size) {
    let total = geom.alloc.max(geom.actual);
    let viewport = total.sub(geom.space.size());
    let (inner, _) = layout_bars(style, Rect::from(viewport), geom.internal);
    let avail = inner.size;
    let mut space = avail;
    for dim in [Dim::X, Dim::Y] {
        if style.overflow.dim(dim) != Overflow::Visible {
            space.set_dim(dim, space.dim(dim).max(geom.internal.dim(dim)));
        }
    }
    (avail, space)
}

fn size_down(tree: &mut SceneTree, id: WidgetId, cx: &LayoutCx<'_>) -> bool {
    let Some(node) = tree.node(id) else {
        return false;
    };
    if node.is(StateFlags::INVISIBLE) {
        return false;
    }
    let (avail, space) = inner_space(&node.style, &node.geom);
    let flexible = node.widget().is_some_and(|w| w.is_flexible(&node.style));
    let parts = node.parts;
    let old_actual = node.geom.actual;

    if flexible {
        let reshaped = intrinsic(tree, id, cx, Some(avail.width));
        if let Some(n) = tree.node_mut(id) {
            n.geom.intrinsic = reshaped;
        }
    }

    let Some(node) = tree.node(id) else {
        return false;
    };
    let style = &node.style;
    let kids = items(tree, id);
    let allocs: Vec<(Size, XY<bool>)> = match style.display {
        Display::Flex => flex::distribute(style, &kids, space),
        Display::Grid => grid::distribute(style, &kids, space),
        // self alignment other than stretch keeps a page at its own size
        Display::Stacked => kids
            .iter()
            .map(|it| {
                let fill = |a: Option<Align>| a.map_or(true, |a| a == Align::Stretch);
                (space, XY::new(fill(it.justify_self), fill(it.align_self)))
            })
            .collect(),
        Display::Custom | Display::None => {
            kids.iter().map(|it| (it.actual, XY::splat(false))).collect()
        }
    };
    for (item, (alloc, stretch)) in kids.iter().zip(allocs) {
        if let Some(n) = tree.node_mut(item.id) {
            n.geom.alloc = alloc;
            n.geom.stretch = stretch;
        }
    }
    if let Some(n) = parts.and_then(|p| tree.node_mut(p)) {
        n.geom.alloc = avail;
        n.geom.stretch = XY::splat(true);
    }

    let mut changed = false;
    for item in &kids {
        changed |= size_down(tree, item.id, cx);
    }
    if let Some(p) = parts {
        changed |= size_down(tree, p, cx);
    }

    let (actual, internal) = aggregate(tree, id, Some(space));
    if let Some(n) = tree.node_mut(id) {
        n.geom.actual = actual;
        n.geom.internal = internal;
    }
    if !same(actual, old_actual) {
        trace!(widget = ?id, ?old_actual, ?actual, "size changed in size down");
        changed = true;
    }
    changed
}

// ============================================================================
// Pass 3: SizeFinal
// ============================================================================

fn size_final(tree: &mut SceneTree, id: WidgetId) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if node.is(StateFlags::INVISIBLE) {
        return;
    }
    let children = node.children.clone();
    let parts = node.parts;
    for c in children {
        size_final(tree, c);
    }
    if let Some(p) = parts {
        size_final(tree, p);
    }
    if let Some(n) = tree.node_mut(id) {
        let g = &mut n.geom;
        for dim in [Dim::X, Dim::Y] {
            if n.style.grow.dim(dim) > 0.0 || g.stretch.dim(dim) {
                let grown = g.actual.dim(dim).max(g.alloc.dim(dim));
                g.actual.set_dim(dim, grown);
            }
        }
        if g.actual.width > g.alloc.width + 0.01 || g.actual.height > g.alloc.height + 0.01 {
            trace!(widget = %n.name, "content overflows its allocation");
        }
    }
}

// ============================================================================
// Pass 4: Position
// ============================================================================

/// Recompute positions and bounding boxes without resizing, as after a scroll
pub fn position_scene(tree: &mut SceneTree, root: WidgetId, scene: Rect) {
    position(tree, root, Point::ZERO, scene, scene);
}

fn clip_axes(clip: Rect, content: Rect, overflow: XY<Overflow>) -> Rect {
    const FAR: f32 = 1.0e7;
    let x_clip = overflow.x != Overflow::Visible;
    let y_clip = overflow.y != Overflow::Visible;
    if !x_clip && !y_clip {
        return clip;
    }
    let bound = Rect::from_ltrb(
        if x_clip { content.x() } else { -FAR },
        if y_clip { content.y() } else { -FAR },
        if x_clip { content.max_x() } else { FAR },
        if y_clip { content.max_y() } else { FAR },
    );
    clip.intersect(&bound)
}

fn position(tree: &mut SceneTree, id: WidgetId, origin: Point, clip: Rect, scene: Rect) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if node.is(StateFlags::INVISIBLE) {
        if let Some(n) = tree.node_mut(id) {
            let empty = Rect::from_origin_size(origin, Size::ZERO);
            n.geom.total_bbox = empty;
            n.geom.content_bbox = empty;
            n.geom.vis_bbox = empty;
            n.geom.content = empty;
        }
        return;
    }
    let style = node.style.clone();
    let geom = &node.geom;
    let total = Rect::from_origin_size(origin, geom.actual);
    let content_bbox = total.intersect(&clip);
    let vis_bbox = content_bbox.intersect(&scene);
    let padded = total.inset_sides(&geom.space);
    let (content, tracks) = layout_bars(&style, padded, geom.internal);
    let parts = node.parts;

    let kids = items(tree, id);
    let mut arrange_in = content.size;
    for dim in [Dim::X, Dim::Y] {
        if style.overflow.dim(dim) != Overflow::Visible {
            arrange_in.set_dim(dim, arrange_in.dim(dim).max(geom.internal.dim(dim)));
        }
    }
    let positions: Vec<Point> = match style.display {
        Display::Flex => flex::arrange(&style, &kids, arrange_in),
        Display::Grid => grid::arrange(&style, &kids, arrange_in),
        Display::Stacked => kids
            .iter()
            .map(|it| {
                Point::new(
                    flex::align_offset(it.justify_self.unwrap_or(style.align), arrange_in.width, it.actual.width),
                    flex::align_offset(it.align_self.unwrap_or(style.align), arrange_in.height, it.actual.height),
                )
            })
            .collect(),
        Display::Custom => kids.iter().map(|it| it.rel_pos).collect(),
        Display::None => vec![Point::ZERO; kids.len()],
    };

    let mut internal = content.size;
    for (item, pos) in kids.iter().zip(&positions) {
        internal = internal.max(Size::new(pos.x + item.actual.width, pos.y + item.actual.height));
    }

    let bar = style.scrollbar_width.dots;
    let scroll = {
        let Some(n) = tree.node_mut(id) else {
            return;
        };
        let g = &mut n.geom;
        g.total_bbox = total;
        g.content_bbox = content_bbox;
        g.vis_bbox = vis_bbox;
        g.content = content;
        g.internal = internal;
        let sx = g.scroll.x;
        let sy = g.scroll.y;
        g.set_scroll(Dim::X, sx);
        g.set_scroll(Dim::Y, sy);
        g.scrollbars = XY::new(
            tracks[0].map(|t| scrollbar(Dim::X, t, bar, content.width(), internal.width, g.scroll.x)),
            tracks[1].map(|t| scrollbar(Dim::Y, t, bar, content.height(), internal.height, g.scroll.y)),
        );
        g.scroll
    };

    let child_clip = clip_axes(content_bbox, content, style.overflow);
    for (i, (item, pos)) in kids.iter().zip(positions).enumerate() {
        if let Some(n) = tree.node_mut(item.id) {
            n.geom.rel_pos = pos;
        }
        let hidden = style.display == Display::Stacked && i != style.stack_top;
        let clip = if hidden { Rect::ZERO } else { child_clip };
        let at = Point::new(content.x() + pos.x - scroll.x, content.y() + pos.y - scroll.y);
        position(tree, item.id, at, clip, scene);
    }
    if let Some(p) = parts {
        position(tree, p, content.origin, clip_axes(content_bbox, padded, style.overflow), scene);
    }
}

#[cfg(test)]
mod tests;
