//! Rendering an [`SvgTree`] through a [`PaintContext`]

use std::f32::consts::PI;

use lumen_core::{Affine2D, Brush, GradientUnits, Path, Rect, Vertex};
use lumen_paint::PaintContext;
use tracing::warn;

use crate::style::{PaintValue, ResolvedStyle};
use crate::tree::{MarkerDef, MarkerOrient, MarkerUnits, SvgKind, SvgNodeId, SvgTree};

/// Nesting limit for `<use>` and marker references
const MAX_REFERENCE_DEPTH: usize = 16;

/// Which marker property applies to a vertex
#[derive(Clone, Copy, PartialEq, Eq)]
enum MarkerSlot {
    Start,
    Mid,
    End,
}

struct Renderer<'t> {
    tree: &'t SvgTree,
    /// Referenced elements being drawn, for cycle detection
    active: Vec<SvgNodeId>,
}

/// Draw `tree` into `viewport` (in the context's current user space).
///
/// Bounding boxes must be current: call [`SvgTree::compute_bounds`] with the
/// viewport size after structural changes.
pub fn render_tree(tree: &SvgTree, ctx: &mut PaintContext<'_>, viewport: Rect) {
    ctx.save();
    ctx.clip_rect(viewport);
    ctx.translate(viewport.x(), viewport.y());
    ctx.concat(&tree.view_transform(viewport.size));
    let mut renderer = Renderer {
        tree,
        active: Vec::new(),
    };
    renderer.node(ctx, tree.root(), &ResolvedStyle::default());
    ctx.restore();
}

impl<'t> Renderer<'t> {
    fn node(&mut self, ctx: &mut PaintContext<'_>, id: SvgNodeId, parent: &ResolvedStyle) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        if node.kind.is_definition()
            || matches!(node.kind, SvgKind::Opaque { .. })
            || node.style.display_none
        {
            return;
        }
        let style = node.style.resolve(parent);

        ctx.save();
        if let Some(t) = &node.transform {
            ctx.concat(t);
        }
        ctx.apply_opacity(style.opacity);
        let bbox = node.bounds.local;
        if let Some(clip_id) = &style.clip_path {
            self.clip(ctx, clip_id, &bbox);
        }

        if !ctx.is_clipped_out() {
            match &node.kind {
                SvgKind::Use { href, x, y } => self.use_element(ctx, href, *x, *y, &style),
                kind => {
                    if let Some(path) = kind.shape_path() {
                        let bbox = path.bounds();
                        self.shape(ctx, &path, &bbox, &style);
                        if matches!(
                            kind,
                            SvgKind::Path(_)
                                | SvgKind::Line { .. }
                                | SvgKind::Polyline(_)
                                | SvgKind::Polygon(_)
                        ) && style.has_markers()
                        {
                            self.markers(ctx, &path, &style);
                        }
                    }
                    for child in &node.children {
                        self.node(ctx, *child, &style);
                    }
                }
            }
        }
        ctx.restore();
    }

    fn shape(&self, ctx: &mut PaintContext<'_>, path: &Path, bbox: &Rect, style: &ResolvedStyle) {
        if !style.visible {
            return;
        }
        if let Some(brush) = self.brush(&style.fill, style.fill_opacity, style) {
            ctx.fill_path_in(path, &brush, style.fill_rule, bbox);
        }
        if style.stroke_width > 0.0 {
            if let Some(brush) = self.brush(&style.stroke, style.stroke_opacity, style) {
                ctx.stroke_path_in(path, &style.stroke(), &brush, bbox);
            }
        }
    }

    fn brush(&self, paint: &PaintValue, opacity: f32, style: &ResolvedStyle) -> Option<Brush> {
        let brush = match paint {
            PaintValue::None => return None,
            PaintValue::Color(c) => Brush::Solid(*c),
            PaintValue::CurrentColor => Brush::Solid(style.color),
            PaintValue::Url { id, fallback } => match self.tree.resolve_gradient(id) {
                Ok(g) => Brush::Gradient(g),
                Err(err) => {
                    warn!("{err}");
                    Brush::Solid((*fallback)?)
                }
            },
        };
        Some(with_opacity(brush, opacity))
    }

    fn use_element(
        &mut self,
        ctx: &mut PaintContext<'_>,
        href: &str,
        x: f32,
        y: f32,
        style: &ResolvedStyle,
    ) {
        let Some(target) = self.tree.find(href) else {
            warn!(href, "<use> names no element");
            return;
        };
        if self.active.contains(&target) || self.active.len() >= MAX_REFERENCE_DEPTH {
            warn!(href, "reference cycle in <use>");
            return;
        }
        self.active.push(target);
        ctx.save();
        ctx.translate(x, y);
        self.node(ctx, target, style);
        ctx.restore();
        self.active.pop();
    }

    /// Intersect the clip with a `<clipPath>`; a missing one is ignored
    fn clip(&self, ctx: &mut PaintContext<'_>, clip_id: &str, bbox: &Rect) {
        let Some(id) = self.tree.find(clip_id) else {
            warn!(clip = clip_id, "clip-path names no element");
            return;
        };
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let SvgKind::ClipPath { units } = node.kind else {
            warn!(clip = clip_id, "clip-path does not name a <clipPath>");
            return;
        };
        let base = match units {
            GradientUnits::ObjectBoundingBox => Affine2D::from_rect(bbox),
            GradientUnits::UserSpaceOnUse => Affine2D::IDENTITY,
        };
        let base = base.then(&node.own_transform());

        let mut outline = Path::new();
        let mut rule = None;
        for child in &node.children {
            let Some(child) = self.tree.get(*child) else {
                continue;
            };
            if child.style.display_none {
                continue;
            }
            let Some(shape) = child.kind.shape_path() else {
                continue;
            };
            rule = rule.or(child.style.clip_rule);
            let t = base.then(&child.own_transform());
            for cmd in shape.transform(&t).commands() {
                outline.push(*cmd);
            }
        }
        ctx.clip_path(&outline, rule.or(node.style.clip_rule).unwrap_or_default());
    }

    fn markers(&mut self, ctx: &mut PaintContext<'_>, path: &Path, style: &ResolvedStyle) {
        let vertices = path.vertices();
        let last = vertices.len().saturating_sub(1);
        for (i, vertex) in vertices.iter().enumerate() {
            let slot = if i == 0 {
                MarkerSlot::Start
            } else if i == last {
                MarkerSlot::End
            } else {
                MarkerSlot::Mid
            };
            let marker = match slot {
                MarkerSlot::Start => &style.marker_start,
                MarkerSlot::Mid => &style.marker_mid,
                MarkerSlot::End => &style.marker_end,
            };
            if let Some(marker_id) = marker {
                self.marker(ctx, marker_id, vertex, slot, style.stroke_width);
            }
        }
    }

    /// Draw one marker instance at `vertex`
    fn marker(
        &mut self,
        ctx: &mut PaintContext<'_>,
        marker_id: &str,
        vertex: &Vertex,
        slot: MarkerSlot,
        stroke_width: f32,
    ) {
        let tree = self.tree;
        let Some(id) = tree.find(marker_id) else {
            warn!(marker = marker_id, "marker reference names no element");
            return;
        };
        let Some(node) = tree.get(id) else {
            return;
        };
        let SvgKind::Marker(def) = &node.kind else {
            return;
        };
        if self.active.contains(&id) || self.active.len() >= MAX_REFERENCE_DEPTH {
            warn!(marker = marker_id, "reference cycle through marker");
            return;
        }

        ctx.save();
        ctx.translate(vertex.point.x, vertex.point.y);
        ctx.concat(&Affine2D::rotation(marker_angle(def, vertex, slot)));
        if def.units == MarkerUnits::StrokeWidth {
            ctx.concat(&Affine2D::scale(stroke_width, stroke_width));
        }
        if let Some(vb) = def.view_box.filter(|vb| !vb.is_empty()) {
            let s = (def.width / vb.width()).min(def.height / vb.height());
            ctx.concat(&Affine2D::scale(s, s));
        }
        ctx.translate(-def.ref_x, -def.ref_y);

        // Marker contents inherit from the marker element, not the shape
        let style = node.style.resolve(&ResolvedStyle::default());
        self.active.push(id);
        for child in &node.children {
            self.node(ctx, *child, &style);
        }
        self.active.pop();
        ctx.restore();
    }
}

fn marker_angle(def: &MarkerDef, vertex: &Vertex, slot: MarkerSlot) -> f32 {
    match def.orient {
        MarkerOrient::Auto => vertex.orient(),
        MarkerOrient::AutoStartReverse if slot == MarkerSlot::Start => vertex.orient() + PI,
        MarkerOrient::AutoStartReverse => vertex.orient(),
        MarkerOrient::Angle(deg) => deg.to_radians(),
        MarkerOrient::Zero => 0.0,
    }
}

/// Scale every color of `brush` by `opacity`
fn with_opacity(brush: Brush, opacity: f32) -> Brush {
    if opacity >= 1.0 {
        return brush;
    }
    match brush {
        Brush::Solid(c) => Brush::Solid(c.mul_alpha(opacity)),
        Brush::Gradient(mut g) => {
            for stop in &mut g.stops {
                stop.color = stop.color.mul_alpha(opacity);
            }
            Brush::Gradient(g)
        }
    }
}
