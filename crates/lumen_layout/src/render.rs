//! Render pass: paints a positioned scene into its image
//!
//! Each widget paints, in order: background, state layer, border, its own
//! content, parts, children, scrollbars. Widgets outside the visible scene
//! are skipped.

use lumen_core::{Brush, Color, CornerRadius, Rect, Stroke};
use lumen_paint::{Pixmap, PaintContext};
use tracing::trace;

use crate::flags::StateFlags;
use crate::style::{BorderStyle, Overflow, Style};
use crate::text::TextMeasurer;
use crate::tree::{Node, SceneTree, WidgetId};
use crate::widget::RenderCx;

/// Colors of the scrollbar track and thumb
const TRACK_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 0.06);
const THUMB_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 0.35);

/// An image a widget hands to the drawer directly instead of painting it
#[derive(Clone, Debug)]
pub struct Upload {
    pub widget: WidgetId,
    /// Destination in scene coordinates
    pub rect: Rect,
    pub image: Pixmap,
}

/// Counters for one rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub painted: usize,
    pub skipped: usize,
}

/// Paint the subtree at `root`. Direct-upload images are appended to
/// `uploads`.
pub fn render_scene(
    tree: &SceneTree,
    root: WidgetId,
    ctx: &mut PaintContext<'_>,
    measurer: &dyn TextMeasurer,
    uploads: &mut Vec<Upload>,
) -> RenderStats {
    let mut stats = RenderStats::default();
    render_widget(tree, root, ctx, measurer, uploads, &mut stats);
    trace!(painted = stats.painted, skipped = stats.skipped, "render");
    stats
}

fn render_widget(
    tree: &SceneTree,
    id: WidgetId,
    ctx: &mut PaintContext<'_>,
    measurer: &dyn TextMeasurer,
    uploads: &mut Vec<Upload>,
    stats: &mut RenderStats,
) {
    let Some(node) = tree.node(id) else {
        return;
    };
    if node.is(StateFlags::INVISIBLE) || node.geom.vis_bbox.is_empty() {
        stats.skipped += 1;
        return;
    }
    stats.painted += 1;
    let style = &node.style;
    let bbox = node.geom.total_bbox;

    ctx.save();
    if style.opacity < 1.0 {
        ctx.apply_opacity(style.opacity);
    }
    ctx.clip_rect(node.geom.content_bbox);

    paint_box(ctx, style, bbox);

    if let Some(widget) = node.widget() {
        match widget.direct_upload() {
            Some(image) => uploads.push(Upload {
                widget: id,
                rect: bbox,
                image: image.clone(),
            }),
            None => {
                let mut cx = RenderCx {
                    paint: ctx,
                    style,
                    geom: &node.geom,
                    state: node.state,
                    measurer,
                };
                widget.render(&mut cx);
            }
        }
    }

    ctx.save();
    if style.overflow.x != Overflow::Visible || style.overflow.y != Overflow::Visible {
        ctx.clip_rect(node.geom.content);
    }
    if let Some(parts) = node.parts {
        for &part in tree.children(parts) {
            render_widget(tree, part, ctx, measurer, uploads, stats);
        }
    }
    // stacked pages below the top one were positioned with an empty clip
    for &child in &node.children {
        render_widget(tree, child, ctx, measurer, uploads, stats);
    }
    ctx.restore();

    paint_scrollbars(ctx, node);
    ctx.restore();
}

fn paint_box(ctx: &mut PaintContext<'_>, style: &Style, bbox: Rect) {
    let radius = style.border.corner_radius();
    if !style.background.is_transparent() {
        ctx.fill_rounded_rect(bbox, radius, &style.background);
    }
    if style.state_layer > 0.0 {
        let layer = Brush::from(style.state_color.mul_alpha(style.state_layer));
        ctx.fill_rounded_rect(bbox, radius, &layer);
    }
    paint_border(ctx, style, bbox, radius);
}

fn paint_border(ctx: &mut PaintContext<'_>, style: &Style, bbox: Rect, radius: CornerRadius) {
    let widths = style.border.widths();
    let colors = &style.border.color;
    let uniform = widths.top == widths.right
        && widths.top == widths.bottom
        && widths.top == widths.left
        && colors.top == colors.right
        && colors.top == colors.bottom
        && colors.top == colors.left;
    let dash = |w: f32| match style.border.style {
        BorderStyle::Dashed => vec![w * 3.0, w * 2.0],
        BorderStyle::Dotted => vec![w, w],
        BorderStyle::Solid | BorderStyle::None => Vec::new(),
    };

    if uniform {
        let w = widths.top;
        if w <= 0.0 || colors.top.is_transparent() {
            return;
        }
        let inset = w / 2.0;
        let rect = Rect::new(
            bbox.x() + inset,
            bbox.y() + inset,
            (bbox.width() - w).max(0.0),
            (bbox.height() - w).max(0.0),
        );
        let stroke = Stroke::new(w).with_dash(dash(w), 0.0);
        ctx.stroke_rounded_rect(rect, radius, &stroke, &Brush::from(colors.top));
        return;
    }

    let (l, t, r, b) = (bbox.x(), bbox.y(), bbox.max_x(), bbox.max_y());
    let sides = [
        (widths.top, colors.top, Rect::new(l, t, r - l, widths.top)),
        (widths.bottom, colors.bottom, Rect::new(l, b - widths.bottom, r - l, widths.bottom)),
        (widths.left, colors.left, Rect::new(l, t, widths.left, b - t)),
        (widths.right, colors.right, Rect::new(r - widths.right, t, widths.right, b - t)),
    ];
    for (w, color, rect) in sides {
        if w > 0.0 && !color.is_transparent() {
            ctx.fill_rect(rect, &Brush::from(color));
        }
    }
}

fn paint_scrollbars(ctx: &mut PaintContext<'_>, node: &Node) {
    for bar in [node.geom.scrollbars.x, node.geom.scrollbars.y].into_iter().flatten() {
        ctx.fill_rect(bar.track, &Brush::from(TRACK_COLOR));
        let radius = CornerRadius::uniform(bar.track.size.dim(bar.dim.other()) / 2.0);
        ctx.fill_rounded_rect(bar.thumb, radius, &Brush::from(THUMB_COLOR));
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::{Length, Size};
    use lumen_paint::pixel_at;

    use super::*;
    use crate::layout::{layout_scene, LayoutCx};
    use crate::settings::Settings;
    use crate::styling::{style_tree, StyleCx};
    use crate::text::EstimatedTextMeasurer;
    use crate::widgets::Frame;

    fn laid_out(tree: &mut SceneTree, w: f32, h: f32) {
        let root = tree.root();
        style_tree(tree, root, &StyleCx::default());
        let settings = Settings::default();
        let cx = LayoutCx {
            measurer: &EstimatedTextMeasurer,
            settings: &settings,
        };
        layout_scene(tree, root, Size::new(w, h), &cx);
    }

    #[test]
    fn paints_backgrounds_and_skips_hidden_pages() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let stack = tree.add(root, "stack", Frame::stacked()).unwrap();
        let red = tree.add(stack, "red", Frame::new()).unwrap();
        let blue = tree.add(stack, "blue", Frame::new()).unwrap();
        for (id, color) in [(red, Color::RED), (blue, Color::rgb(0.0, 0.0, 1.0))] {
            tree.get_mut(id).unwrap().stylers.main.push(std::rc::Rc::new(move |s: &mut Style| {
                s.set_size(Length::px(20.0), Length::px(20.0));
                s.set_background(color);
            }));
        }
        laid_out(&mut tree, 40.0, 40.0);

        let mut pixmap = Pixmap::new(40, 40).unwrap();
        let mut uploads = Vec::new();
        let stats = {
            let mut ctx = PaintContext::new(&mut pixmap);
            render_scene(&tree, root, &mut ctx, &EstimatedTextMeasurer, &mut uploads)
        };
        assert!(stats.skipped >= 1);
        assert!(uploads.is_empty());
        let [r, _, b, a] = pixel_at(&pixmap, 5, 5).unwrap();
        assert_eq!((r, b, a), (255, 0, 255));
    }
}
