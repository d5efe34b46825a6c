//! SVG node tree
//!
//! Nodes live in a [`SlotMap`] arena and refer to each other by
//! [`SvgNodeId`]. Each node keeps the geometry of its element, the style it
//! specifies, its own transform, and any attributes the reader did not
//! interpret so they survive a write. Bounding boxes are computed on demand
//! by [`SvgTree::compute_bounds`].

use indexmap::IndexMap;
use lumen_core::{
    Affine2D, Color, Gradient, GradientKind, GradientSpread, GradientStop, GradientUnits, Path,
    Point, Rect, Size, Vec2,
};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use tracing::warn;

use crate::error::{Result, SvgError};
use crate::style::SvgStyle;

new_key_type! {
    /// Stable handle of a node in an [`SvgTree`]
    pub struct SvgNodeId;
}

/// `preserveAspectRatio`, reduced to the two behaviors in use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    /// Uniform scale, centered (`xMidYMid meet`)
    #[default]
    Meet,
    /// Stretch to the viewport (`none`)
    Stretch,
}

/// Attributes of a gradient element as written; unset values come from the
/// `href` chain or the defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GradientDef {
    pub x1: Option<f32>,
    pub y1: Option<f32>,
    pub x2: Option<f32>,
    pub y2: Option<f32>,
    pub cx: Option<f32>,
    pub cy: Option<f32>,
    pub r: Option<f32>,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
    pub units: Option<GradientUnits>,
    pub spread: Option<GradientSpread>,
    pub transform: Option<Affine2D>,
    pub stops: Vec<GradientStop>,
    pub href: Option<String>,
}

impl GradientDef {
    /// Fill unset fields from the referenced gradient
    fn inherit_from(&mut self, other: &GradientDef) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if self.$field.is_none() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(x1, y1, x2, y2, cx, cy, r, fx, fy, units, spread, transform);
        if self.stops.is_empty() {
            self.stops = other.stops.clone();
        }
    }
}

/// How marker contents are scaled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerUnits {
    #[default]
    StrokeWidth,
    UserSpaceOnUse,
}

/// Marker orientation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MarkerOrient {
    /// Fixed angle in degrees
    Angle(f32),
    /// Follow the path direction at the vertex
    Auto,
    /// Like `Auto`, but reversed at the start vertex
    AutoStartReverse,
    #[default]
    Zero,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDef {
    pub ref_x: f32,
    pub ref_y: f32,
    pub width: f32,
    pub height: f32,
    pub units: MarkerUnits,
    pub orient: MarkerOrient,
    pub view_box: Option<Rect>,
}

impl Default for MarkerDef {
    fn default() -> Self {
        Self {
            ref_x: 0.0,
            ref_y: 0.0,
            width: 3.0,
            height: 3.0,
            units: MarkerUnits::StrokeWidth,
            orient: MarkerOrient::Zero,
            view_box: None,
        }
    }
}

/// Element-specific content of a node
#[derive(Clone, Debug, PartialEq)]
pub enum SvgKind {
    Svg {
        width: Option<f32>,
        height: Option<f32>,
        view_box: Option<Rect>,
        aspect: AspectRatio,
    },
    Group,
    Defs,
    Rect {
        rect: Rect,
        rx: f32,
        ry: f32,
    },
    Circle {
        center: Point,
        r: f32,
    },
    Ellipse {
        center: Point,
        rx: f32,
        ry: f32,
    },
    Line {
        from: Point,
        to: Point,
    },
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Path(Path),
    LinearGradient(GradientDef),
    RadialGradient(GradientDef),
    ClipPath {
        units: GradientUnits,
    },
    Marker(MarkerDef),
    Use {
        href: String,
        x: f32,
        y: f32,
    },
    /// An element this reader does not interpret, kept as its source text
    Opaque {
        tag: String,
        source: String,
    },
}

impl SvgKind {
    pub fn tag(&self) -> &str {
        match self {
            SvgKind::Svg { .. } => "svg",
            SvgKind::Group => "g",
            SvgKind::Defs => "defs",
            SvgKind::Rect { .. } => "rect",
            SvgKind::Circle { .. } => "circle",
            SvgKind::Ellipse { .. } => "ellipse",
            SvgKind::Line { .. } => "line",
            SvgKind::Polyline(_) => "polyline",
            SvgKind::Polygon(_) => "polygon",
            SvgKind::Path(_) => "path",
            SvgKind::LinearGradient(_) => "linearGradient",
            SvgKind::RadialGradient(_) => "radialGradient",
            SvgKind::ClipPath { .. } => "clipPath",
            SvgKind::Marker(_) => "marker",
            SvgKind::Use { .. } => "use",
            SvgKind::Opaque { tag, .. } => tag,
        }
    }

    /// Elements that are only drawn when referenced
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            SvgKind::Defs
                | SvgKind::LinearGradient(_)
                | SvgKind::RadialGradient(_)
                | SvgKind::ClipPath { .. }
                | SvgKind::Marker(_)
        )
    }

    /// Outline of a shape element in its own coordinates
    pub fn shape_path(&self) -> Option<Path> {
        Some(match self {
            SvgKind::Rect { rect, rx, ry } => {
                if *rx > 0.0 || *ry > 0.0 {
                    rounded_rect_path(*rect, *rx, *ry)
                } else {
                    Path::rect(*rect)
                }
            }
            SvgKind::Circle { center, r } => Path::circle(*center, *r),
            SvgKind::Ellipse { center, rx, ry } => Path::ellipse(*center, *rx, *ry),
            SvgKind::Line { from, to } => Path::line(*from, *to),
            SvgKind::Polyline(points) => Path::polyline(points, false),
            SvgKind::Polygon(points) => Path::polyline(points, true),
            SvgKind::Path(path) => path.clone(),
            _ => return None,
        })
    }
}

/// Rounded rectangle with elliptical corners (`rx` and `ry` may differ)
fn rounded_rect_path(rect: Rect, rx: f32, ry: f32) -> Path {
    let rx = if rx > 0.0 { rx } else { ry }.min(rect.width() / 2.0);
    let ry = if ry > 0.0 { ry } else { rx }.min(rect.height() / 2.0);
    let radii = Vec2::new(rx, ry);
    let (x0, y0, x1, y1) = (rect.x(), rect.y(), rect.max_x(), rect.max_y());
    Path::new()
        .move_to(x0 + rx, y0)
        .line_to(x1 - rx, y0)
        .arc_to(radii, 0.0, false, true, x1, y0 + ry)
        .line_to(x1, y1 - ry)
        .arc_to(radii, 0.0, false, true, x1 - rx, y1)
        .line_to(x0 + rx, y1)
        .arc_to(radii, 0.0, false, true, x0, y1 - ry)
        .line_to(x0, y0 + ry)
        .arc_to(radii, 0.0, false, true, x0 + rx, y0)
        .close()
}

/// Computed geometry of a node
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeBounds {
    /// Shape bounds in the node's own coordinates (union of children for groups)
    pub local: Rect,
    /// Transform from the node's coordinates to document pixels
    pub composed: Affine2D,
    /// `local` mapped through `composed`
    pub world: Rect,
    /// `world` intersected with the viewport
    pub visible: Rect,
}

/// One element of the document
#[derive(Clone, Debug)]
pub struct SvgNode {
    pub kind: SvgKind,
    pub id: Option<String>,
    pub style: SvgStyle,
    pub transform: Option<Affine2D>,
    /// Attributes kept verbatim for writing
    pub extra: IndexMap<String, String>,
    pub parent: Option<SvgNodeId>,
    pub children: Vec<SvgNodeId>,
    pub bounds: NodeBounds,
}

impl SvgNode {
    pub fn new(kind: SvgKind) -> Self {
        Self {
            kind,
            id: None,
            style: SvgStyle::default(),
            transform: None,
            extra: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            bounds: NodeBounds::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_style(mut self, style: SvgStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_transform(mut self, transform: Affine2D) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn own_transform(&self) -> Affine2D {
        self.transform.unwrap_or(Affine2D::IDENTITY)
    }

    /// Element content, ignoring computed bounds and links
    fn same_content(&self, other: &SvgNode) -> bool {
        self.kind == other.kind
            && self.id == other.id
            && self.style == other.style
            && self.transform == other.transform
            && self.extra == other.extra
    }
}

/// The node arena of a document
#[derive(Clone, Debug)]
pub struct SvgTree {
    nodes: SlotMap<SvgNodeId, SvgNode>,
    root: SvgNodeId,
    ids: FxHashMap<String, SvgNodeId>,
}

impl SvgTree {
    /// A tree holding only an `<svg>` root
    pub fn new(width: Option<f32>, height: Option<f32>, view_box: Option<Rect>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SvgNode::new(SvgKind::Svg {
            width,
            height,
            view_box,
            aspect: AspectRatio::Meet,
        }));
        Self {
            nodes,
            root,
            ids: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> SvgNodeId {
        self.root
    }

    pub fn get(&self, id: SvgNodeId) -> Option<&SvgNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: SvgNodeId) -> Option<&mut SvgNode> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn children(&self, id: SvgNodeId) -> &[SvgNodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Append `node` as the last child of `parent`
    pub fn append(&mut self, parent: SvgNodeId, mut node: SvgNode) -> Result<SvgNodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(SvgError::Parse("append to a removed node".into()));
        }
        node.parent = Some(parent);
        let element_id = node.id.clone();
        let id = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        if let Some(element_id) = element_id {
            // First definition wins, as in browsers
            self.ids.entry(element_id).or_insert(id);
        }
        Ok(id)
    }

    /// Remove a node and its subtree
    pub fn remove(&mut self, id: SvgNodeId) {
        if id == self.root {
            return;
        }
        if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
                if let Some(element_id) = node.id {
                    if self.ids.get(&element_id) == Some(&next) {
                        self.ids.remove(&element_id);
                    }
                }
            }
        }
    }

    /// Look up an element by its `id` attribute
    pub fn find(&self, element_id: &str) -> Option<SvgNodeId> {
        self.ids.get(element_id).copied()
    }

    /// Depth-first walk; `f` returns `false` to skip a subtree
    pub fn walk(&self, mut f: impl FnMut(SvgNodeId, &SvgNode) -> bool) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if f(id, node) {
                stack.extend(node.children.iter().rev());
            }
        }
    }

    /// Element ids in use, for allocating fresh ones
    pub fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    /// Document size: explicit width/height, else the viewBox size
    pub fn size(&self) -> Size {
        match self.nodes.get(self.root).map(|n| &n.kind) {
            Some(SvgKind::Svg {
                width,
                height,
                view_box,
                ..
            }) => {
                let vb = view_box.unwrap_or(Rect::new(0.0, 0.0, 100.0, 100.0));
                Size::new(width.unwrap_or(vb.width()), height.unwrap_or(vb.height()))
            }
            _ => Size::ZERO,
        }
    }

    /// Transform from user space to a `viewport` of the given size
    pub fn view_transform(&self, viewport: Size) -> Affine2D {
        let Some(SvgKind::Svg {
            view_box, aspect, ..
        }) = self.nodes.get(self.root).map(|n| &n.kind)
        else {
            return Affine2D::IDENTITY;
        };
        let Some(vb) = view_box.filter(|vb| !vb.is_empty()) else {
            let size = self.size();
            if size.is_empty() {
                return Affine2D::IDENTITY;
            }
            return Affine2D::scale(viewport.width / size.width, viewport.height / size.height);
        };
        let sx = viewport.width / vb.width();
        let sy = viewport.height / vb.height();
        match aspect {
            AspectRatio::Stretch => {
                Affine2D::scale(sx, sy).then(&Affine2D::translation(-vb.x(), -vb.y()))
            }
            AspectRatio::Meet => {
                let s = sx.min(sy);
                let dx = (viewport.width - vb.width() * s) / 2.0;
                let dy = (viewport.height - vb.height() * s) / 2.0;
                Affine2D::translation(dx, dy)
                    .then(&Affine2D::scale(s, s))
                    .then(&Affine2D::translation(-vb.x(), -vb.y()))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bounding boxes
    // ─────────────────────────────────────────────────────────────────────────

    /// Compute local, composed and visible bounds for every rendered node
    pub fn compute_bounds(&mut self, viewport: Size) {
        let base = self.view_transform(viewport);
        let clip = viewport.to_rect();
        self.bounds_of(self.root, base, &clip);
    }

    fn bounds_of(&mut self, id: SvgNodeId, parent: Affine2D, viewport: &Rect) -> Option<Rect> {
        let (composed, children, shape, is_def, use_ref) = {
            let node = self.nodes.get(id)?;
            (
                parent.then(&node.own_transform()),
                node.children.clone(),
                node.kind.shape_path(),
                node.kind.is_definition(),
                match &node.kind {
                    SvgKind::Use { href, x, y } => Some((href.clone(), *x, *y)),
                    _ => None,
                },
            )
        };

        let mut local = shape.map(|p| p.bounds());
        if let Some((href, x, y)) = use_ref {
            local = self.referenced_bounds(&href, x, y, &mut FxHashSet::default());
        }
        for child in children {
            // Definitions get bounds from the elements that reference them
            let child_bounds = self.bounds_of(child, composed, viewport);
            if is_def {
                continue;
            }
            let Some(child_node) = self.nodes.get(child) else {
                continue;
            };
            if child_node.kind.is_definition() {
                continue;
            }
            if let Some(b) = child_bounds {
                let in_parent = child_node.own_transform().transform_rect(&b);
                local = Some(match local {
                    Some(l) => l.union(&in_parent),
                    None => in_parent,
                });
            }
        }

        let local_rect = local.unwrap_or(Rect::ZERO);
        let world = composed.transform_rect(&local_rect);
        if let Some(node) = self.nodes.get_mut(id) {
            node.bounds = NodeBounds {
                local: local_rect,
                composed,
                world,
                visible: world.intersect(viewport),
            };
        }
        local
    }

    /// Bounds of the element a `<use>` points at, in the `<use>` coordinates
    fn referenced_bounds(
        &self,
        href: &str,
        x: f32,
        y: f32,
        visiting: &mut FxHashSet<SvgNodeId>,
    ) -> Option<Rect> {
        let target = self.find(href)?;
        if !visiting.insert(target) {
            warn!(href, "cycle in <use> reference");
            return None;
        }
        let bounds = self.subtree_bounds(target, visiting)?;
        let t = self
            .nodes
            .get(target)
            .map(|n| n.own_transform())
            .unwrap_or_default();
        Some(Affine2D::translation(x, y).then(&t).transform_rect(&bounds))
    }

    fn subtree_bounds(&self, id: SvgNodeId, visiting: &mut FxHashSet<SvgNodeId>) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let mut local = node.kind.shape_path().map(|p| p.bounds());
        if let SvgKind::Use { href, x, y } = &node.kind {
            local = self.referenced_bounds(href, *x, *y, visiting);
        }
        for child in &node.children {
            let Some(child_node) = self.nodes.get(*child) else {
                continue;
            };
            if child_node.kind.is_definition() {
                continue;
            }
            if let Some(b) = self.subtree_bounds(*child, visiting) {
                let b = child_node.own_transform().transform_rect(&b);
                local = Some(local.map_or(b, |l| l.union(&b)));
            }
        }
        local
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gradients
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a gradient by element id, following its `href` chain.
    ///
    /// A chain that loops is cut where it returns to a visited gradient; the
    /// looping reference is treated as missing.
    pub fn resolve_gradient(&self, element_id: &str) -> Result<Gradient> {
        let start = self
            .find(element_id)
            .ok_or_else(|| SvgError::MissingReference(element_id.to_string()))?;
        let (radial, mut def) = match self.nodes.get(start).map(|n| &n.kind) {
            Some(SvgKind::LinearGradient(def)) => (false, def.clone()),
            Some(SvgKind::RadialGradient(def)) => (true, def.clone()),
            _ => return Err(SvgError::MissingReference(element_id.to_string())),
        };

        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut next = def.href.clone();
        while let Some(href) = next.take() {
            let Some(target) = self.find(&href) else {
                warn!(gradient = element_id, href, "gradient href names no element");
                break;
            };
            if !visited.insert(target) {
                let err = SvgError::CycleDetected(href);
                warn!(gradient = element_id, "{err}");
                break;
            }
            match self.nodes.get(target).map(|n| &n.kind) {
                Some(SvgKind::LinearGradient(other)) | Some(SvgKind::RadialGradient(other)) => {
                    def.inherit_from(other);
                    next = other.href.clone();
                }
                _ => break,
            }
        }
        Ok(build_gradient(radial, &def))
    }
}

fn build_gradient(radial: bool, def: &GradientDef) -> Gradient {
    let kind = if radial {
        let cx = def.cx.unwrap_or(0.5);
        let cy = def.cy.unwrap_or(0.5);
        let focal = match (def.fx, def.fy) {
            (None, None) => None,
            (fx, fy) => Some(Point::new(fx.unwrap_or(cx), fy.unwrap_or(cy))),
        };
        GradientKind::Radial {
            center: Point::new(cx, cy),
            radius: def.r.unwrap_or(0.5),
            focal,
        }
    } else {
        GradientKind::Linear {
            start: Point::new(def.x1.unwrap_or(0.0), def.y1.unwrap_or(0.0)),
            end: Point::new(def.x2.unwrap_or(1.0), def.y2.unwrap_or(0.0)),
        }
    };
    let stops = if def.stops.is_empty() {
        // No stops paints nothing
        vec![GradientStop::new(0.0, Color::TRANSPARENT)]
    } else {
        def.stops.clone()
    };
    Gradient::new(kind, stops)
        .with_units(def.units.unwrap_or_default())
        .with_spread(def.spread.unwrap_or_default())
        .with_transform(def.transform.unwrap_or_default())
}

impl PartialEq for SvgTree {
    /// Structural equality of the element trees, ignoring computed bounds
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            let (Some(na), Some(nb)) = (self.nodes.get(a), other.nodes.get(b)) else {
                return false;
            };
            if !na.same_content(nb) || na.children.len() != nb.children.len() {
                return false;
            }
            stack.extend(na.children.iter().copied().zip(nb.children.iter().copied()));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_node(href: Option<&str>, id: &str) -> SvgNode {
        SvgNode::new(SvgKind::LinearGradient(GradientDef {
            href: href.map(str::to_string),
            ..Default::default()
        }))
        .with_id(id)
    }

    #[test]
    fn gradient_inherits_through_href() {
        let mut tree = SvgTree::new(Some(10.0), Some(10.0), None);
        let root = tree.root();
        let base = SvgNode::new(SvgKind::LinearGradient(GradientDef {
            x2: Some(0.0),
            y2: Some(1.0),
            stops: vec![
                GradientStop::new(0.0, Color::RED),
                GradientStop::new(1.0, Color::BLUE),
            ],
            ..Default::default()
        }))
        .with_id("base");
        tree.append(root, base).unwrap();
        tree.append(root, gradient_node(Some("base"), "derived")).unwrap();

        let g = tree.resolve_gradient("derived").unwrap();
        assert_eq!(g.stops.len(), 2);
        assert_eq!(
            g.kind,
            GradientKind::Linear {
                start: Point::ZERO,
                end: Point::new(0.0, 1.0)
            }
        );
    }

    #[test]
    fn gradient_cycle_is_broken() {
        let mut tree = SvgTree::new(Some(10.0), Some(10.0), None);
        let root = tree.root();
        tree.append(root, gradient_node(Some("b"), "a")).unwrap();
        tree.append(root, gradient_node(Some("a"), "b")).unwrap();
        let g = tree.resolve_gradient("a").unwrap();
        assert_eq!(g.stops, vec![GradientStop::new(0.0, Color::TRANSPARENT)]);
        assert!(matches!(
            tree.resolve_gradient("missing"),
            Err(SvgError::MissingReference(_))
        ));
    }

    #[test]
    fn bounds_compose_transforms() {
        let mut tree = SvgTree::new(Some(100.0), Some(100.0), None);
        let root = tree.root();
        let group = tree
            .append(
                root,
                SvgNode::new(SvgKind::Group).with_transform(Affine2D::translation(10.0, 20.0)),
            )
            .unwrap();
        let rect = tree
            .append(
                group,
                SvgNode::new(SvgKind::Rect {
                    rect: Rect::new(0.0, 0.0, 50.0, 100.0),
                    rx: 0.0,
                    ry: 0.0,
                }),
            )
            .unwrap();
        tree.compute_bounds(Size::new(100.0, 100.0));

        let r = tree.get(rect).unwrap().bounds;
        assert_eq!(r.local, Rect::new(0.0, 0.0, 50.0, 100.0));
        assert_eq!(r.world, Rect::new(10.0, 20.0, 50.0, 100.0));
        assert_eq!(r.visible, Rect::new(10.0, 20.0, 50.0, 80.0));
        let g = tree.get(group).unwrap().bounds;
        assert_eq!(g.local, Rect::new(0.0, 0.0, 50.0, 100.0));
        assert_eq!(tree.get(root).unwrap().bounds.local, Rect::new(10.0, 20.0, 50.0, 100.0));
    }

    #[test]
    fn remove_drops_subtree_and_ids() {
        let mut tree = SvgTree::new(None, None, None);
        let root = tree.root();
        let g = tree.append(root, SvgNode::new(SvgKind::Group).with_id("g")).unwrap();
        tree.append(g, SvgNode::new(SvgKind::Group).with_id("inner")).unwrap();
        assert_eq!(tree.len(), 3);
        tree.remove(g);
        assert_eq!(tree.len(), 1);
        assert!(tree.find("inner").is_none());
    }
}
