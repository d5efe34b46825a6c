//! Vector paths and stroke configuration
//!
//! A [`Path`] is a flat list of absolute commands. Elliptical arcs are kept
//! as arcs so they survive serialization; [`Path::to_curves`] lowers them to
//! cubic Béziers for rasterizers that only understand lines and curves.

use std::f32::consts::PI;

use crate::color::CornerRadius;
use crate::geometry::{Affine2D, Point, Rect, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Stroke Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Fill rule for self-intersecting paths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Stroke style configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Miter limit (for Miter joins)
    pub miter_limit: f32,
    /// Dash pattern (empty for solid line)
    pub dash: Vec<f32>,
    pub dash_offset: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dash: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl Stroke {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_dash(mut self, pattern: Vec<f32>, offset: f32) -> Self {
        self.dash = pattern;
        self.dash_offset = offset;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command in absolute coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// SVG elliptical arc; `rotation` of the x-axis in degrees
    ArcTo {
        radii: Vec2,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

/// A path vertex with its incoming and outgoing tangent directions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub point: Point,
    /// Direction of travel arriving at the vertex, radians
    pub angle_in: Option<f32>,
    /// Direction of travel leaving the vertex, radians
    pub angle_out: Option<f32>,
}

impl Vertex {
    /// Orientation used by auto-oriented markers: the bisector of the
    /// incoming and outgoing directions, or whichever exists
    pub fn orient(&self) -> f32 {
        match (self.angle_in, self.angle_out) {
            (Some(a), Some(b)) => {
                let mut diff = b - a;
                while diff > PI {
                    diff -= 2.0 * PI;
                }
                while diff < -PI {
                    diff += 2.0 * PI;
                }
                a + diff / 2.0
            }
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 0.0,
        }
    }
}

/// A vector path
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
        self
    }

    pub fn cubic_to(mut self, cx1: f32, cy1: f32, cx2: f32, cy2: f32, x: f32, y: f32) -> Self {
        self.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        });
        self
    }

    /// SVG arc to a point
    pub fn arc_to(
        mut self,
        radii: Vec2,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) -> Self {
        self.push(PathCommand::ArcTo {
            radii,
            rotation,
            large_arc,
            sweep,
            end: Point::new(x, y),
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.push(PathCommand::Close);
        self
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn rect(rect: Rect) -> Self {
        Self::new()
            .move_to(rect.x(), rect.y())
            .line_to(rect.max_x(), rect.y())
            .line_to(rect.max_x(), rect.max_y())
            .line_to(rect.x(), rect.max_y())
            .close()
    }

    /// Ellipse approximated with four cubic Béziers
    pub fn ellipse(center: Point, rx: f32, ry: f32) -> Self {
        let k = 0.552_284_8;
        let (cx, cy) = (center.x, center.y);
        Self::new()
            .move_to(cx + rx, cy)
            .cubic_to(cx + rx, cy + ry * k, cx + rx * k, cy + ry, cx, cy + ry)
            .cubic_to(cx - rx * k, cy + ry, cx - rx, cy + ry * k, cx - rx, cy)
            .cubic_to(cx - rx, cy - ry * k, cx - rx * k, cy - ry, cx, cy - ry)
            .cubic_to(cx + rx * k, cy - ry, cx + rx, cy - ry * k, cx + rx, cy)
            .close()
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        Self::ellipse(center, radius, radius)
    }

    pub fn line(from: Point, to: Point) -> Self {
        Self::new().move_to(from.x, from.y).line_to(to.x, to.y)
    }

    /// Open or closed polyline through `points`
    pub fn polyline(points: &[Point], closed: bool) -> Self {
        let mut path = Self::new();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                path.push(PathCommand::MoveTo(*p));
            } else {
                path.push(PathCommand::LineTo(*p));
            }
        }
        if closed && !points.is_empty() {
            path.push(PathCommand::Close);
        }
        path
    }

    /// Rounded rectangle with per-corner radii, clamped to half the short side
    pub fn rounded_rect(rect: Rect, corner_radius: impl Into<CornerRadius>) -> Self {
        let r = corner_radius.into();
        if r.is_zero() {
            return Self::rect(rect);
        }
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        let max_r = (w.min(h) / 2.0).max(0.0);
        let tl = r.top_left.min(max_r);
        let tr = r.top_right.min(max_r);
        let br = r.bottom_right.min(max_r);
        let bl = r.bottom_left.min(max_r);
        let k = 1.0 - 0.552_284_8;

        let mut path = Self::new().move_to(x + tl, y).line_to(x + w - tr, y);
        if tr > 0.0 {
            path = path.cubic_to(x + w - tr * k, y, x + w, y + tr * k, x + w, y + tr);
        }
        path = path.line_to(x + w, y + h - br);
        if br > 0.0 {
            path = path.cubic_to(x + w, y + h - br * k, x + w - br * k, y + h, x + w - br, y + h);
        }
        path = path.line_to(x + bl, y + h);
        if bl > 0.0 {
            path = path.cubic_to(x + bl * k, y + h, x, y + h - bl * k, x, y + h - bl);
        }
        path = path.line_to(x, y + tl);
        if tl > 0.0 {
            path = path.cubic_to(x, y + tl * k, x + tl * k, y, x + tl, y);
        }
        path.close()
    }

    /// Apply an affine transform to every point; arcs are lowered first
    pub fn transform(&self, t: &Affine2D) -> Path {
        let lowered = self.to_curves();
        let map = |p: Point| t.transform_point(p);
        let commands = lowered
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCommand::MoveTo(p) => PathCommand::MoveTo(map(p)),
                PathCommand::LineTo(p) => PathCommand::LineTo(map(p)),
                PathCommand::QuadTo { control, end } => PathCommand::QuadTo {
                    control: map(control),
                    end: map(end),
                },
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => PathCommand::CubicTo {
                    control1: map(control1),
                    control2: map(control2),
                    end: map(end),
                },
                PathCommand::ArcTo { end, .. } => PathCommand::LineTo(map(end)),
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        Path { commands }
    }

    /// Same path with every arc replaced by cubic Béziers
    pub fn to_curves(&self) -> Path {
        if !self
            .commands
            .iter()
            .any(|c| matches!(c, PathCommand::ArcTo { .. }))
        {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.commands.len() + 8);
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::ArcTo {
                    radii,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                } => {
                    arc_to_cubics(current, radii, rotation, large_arc, sweep, end, &mut out);
                    current = end;
                }
                PathCommand::MoveTo(p) => {
                    out.push(*cmd);
                    current = p;
                    start = p;
                }
                PathCommand::LineTo(p) => {
                    out.push(*cmd);
                    current = p;
                }
                PathCommand::QuadTo { end, .. } | PathCommand::CubicTo { end, .. } => {
                    out.push(*cmd);
                    current = end;
                }
                PathCommand::Close => {
                    out.push(*cmd);
                    current = start;
                }
            }
        }
        Path { commands: out }
    }

    /// Tight bounding rectangle (curves are sampled)
    pub fn bounds(&self) -> Rect {
        let mut bounds: Option<Rect> = None;
        let mut include = |p: Point| {
            bounds = Some(match bounds {
                Some(b) => b.expand_to_include(p),
                None => Rect::from_origin_size(p, crate::geometry::Size::ZERO),
            });
        };
        let lowered = self.to_curves();
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        for cmd in lowered.commands() {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    include(p);
                    current = p;
                    start = p;
                }
                PathCommand::LineTo(p) => {
                    include(p);
                    current = p;
                }
                PathCommand::QuadTo { control, end } => {
                    for i in 1..=16 {
                        include(quad_point(current, control, end, i as f32 / 16.0));
                    }
                    current = end;
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    for i in 1..=16 {
                        include(cubic_point(current, control1, control2, end, i as f32 / 16.0));
                    }
                    current = end;
                }
                PathCommand::ArcTo { end, .. } => {
                    include(end);
                    current = end;
                }
                PathCommand::Close => current = start,
            }
        }
        bounds.unwrap_or(Rect::ZERO)
    }

    /// Vertices with tangent directions, in drawing order (used by markers)
    pub fn vertices(&self) -> Vec<Vertex> {
        let lowered = self.to_curves();
        let mut out: Vec<Vertex> = Vec::new();
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        let mut subpath_first = 0usize;
        for cmd in lowered.commands() {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    out.push(Vertex {
                        point: p,
                        angle_in: None,
                        angle_out: None,
                    });
                    subpath_first = out.len() - 1;
                    current = p;
                    start = p;
                }
                PathCommand::Close => {
                    if current != start {
                        let a = start.sub(current).angle();
                        set_out(&mut out, a);
                        out.push(Vertex {
                            point: start,
                            angle_in: Some(a),
                            angle_out: None,
                        });
                    }
                    let first_out = out.get(subpath_first).and_then(|v| v.angle_out);
                    if let Some(last) = out.last_mut() {
                        last.angle_out = first_out;
                    }
                    current = start;
                }
                PathCommand::LineTo(p) => {
                    let a = p.sub(current).angle();
                    set_out(&mut out, a);
                    out.push(Vertex {
                        point: p,
                        angle_in: Some(a),
                        angle_out: None,
                    });
                    current = p;
                }
                PathCommand::QuadTo { control, end } => {
                    let a_out = tangent(current, control, end);
                    set_out(&mut out, a_out);
                    let a_in = tangent(end, control, current) + PI;
                    out.push(Vertex {
                        point: end,
                        angle_in: Some(a_in),
                        angle_out: None,
                    });
                    current = end;
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    let a_out = tangent(current, control1, if control2 != current { control2 } else { end });
                    set_out(&mut out, a_out);
                    let a_in = tangent(end, control2, if control1 != end { control1 } else { current }) + PI;
                    out.push(Vertex {
                        point: end,
                        angle_in: Some(a_in),
                        angle_out: None,
                    });
                    current = end;
                }
                PathCommand::ArcTo { end, .. } => {
                    let a = end.sub(current).angle();
                    set_out(&mut out, a);
                    out.push(Vertex {
                        point: end,
                        angle_in: Some(a),
                        angle_out: None,
                    });
                    current = end;
                }
            }
        }
        out
    }
}

fn set_out(vertices: &mut [Vertex], angle: f32) {
    if let Some(last) = vertices.last_mut() {
        if last.angle_out.is_none() {
            last.angle_out = Some(angle);
        }
    }
}

/// Direction from `from` toward the first control point that differs from it
fn tangent(from: Point, control: Point, fallback: Point) -> f32 {
    if control != from {
        control.sub(from).angle()
    } else {
        fallback.sub(from).angle()
    }
}

fn quad_point(p0: Point, p1: Point, p2: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Convert an SVG endpoint-parameterized arc to cubic Béziers (SVG 1.1 F.6)
fn arc_to_cubics(
    from: Point,
    radii: Vec2,
    rotation: f32,
    large_arc: bool,
    sweep: bool,
    to: Point,
    out: &mut Vec<PathCommand>,
) {
    let mut rx = radii.x.abs();
    let mut ry = radii.y.abs();
    if from == to {
        return;
    }
    if rx <= f32::EPSILON || ry <= f32::EPSILON {
        out.push(PathCommand::LineTo(to));
        return;
    }
    let (sin_phi, cos_phi) = rotation.to_radians().sin_cos();
    let dx = (from.x - to.x) / 2.0;
    let dy = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
    if large_arc == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    let angle = |ux: f32, uy: f32, vx: f32, vy: f32| {
        let dot = ux * vx + uy * vy;
        let len = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
        let mut a = (dot / len).clamp(-1.0, 1.0).acos();
        if ux * vy - uy * vx < 0.0 {
            a = -a;
        }
        a
    };
    let theta1 = angle(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut delta = angle(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );
    if !sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    } else if sweep && delta < 0.0 {
        delta += 2.0 * PI;
    }

    let segments = (delta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let step = delta / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let point_at = |theta: f32| {
        let (s, c) = theta.sin_cos();
        Point::new(
            cx + rx * c * cos_phi - ry * s * sin_phi,
            cy + rx * c * sin_phi + ry * s * cos_phi,
        )
    };
    let deriv_at = |theta: f32| {
        let (s, c) = theta.sin_cos();
        Vec2::new(
            -rx * s * cos_phi - ry * c * sin_phi,
            -rx * s * sin_phi + ry * c * cos_phi,
        )
    };
    let mut theta = theta1;
    for i in 0..segments {
        let next = theta + step;
        let p0 = point_at(theta);
        let p3 = if i + 1 == segments { to } else { point_at(next) };
        let d0 = deriv_at(theta);
        let d3 = deriv_at(next);
        out.push(PathCommand::CubicTo {
            control1: Point::new(p0.x + k * d0.x, p0.y + k * d0.y),
            control2: Point::new(p3.x - k * d3.x, p3.y - k * d3.y),
            end: p3,
        });
        theta = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_bounds() {
        let p = Path::rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(p.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn half_circle_arc_bounds() {
        let p = Path::new()
            .move_to(0.0, 0.0)
            .arc_to(Vec2::new(10.0, 10.0), 0.0, false, true, 20.0, 0.0);
        let b = p.bounds();
        assert!((b.width() - 20.0).abs() < 0.1);
        assert!((b.height() - 10.0).abs() < 0.2, "{b:?}");
        let curves = p.to_curves();
        assert!(curves
            .commands()
            .iter()
            .all(|c| !matches!(c, PathCommand::ArcTo { .. })));
    }

    #[test]
    fn polyline_vertices_have_tangents() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let v = Path::polyline(&pts, false).vertices();
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].orient(), 0.0);
        assert!((v[1].orient() - PI / 4.0).abs() < 1e-5);
        assert!((v[2].orient() - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn transform_translates_points() {
        let p = Path::line(Point::ZERO, Point::new(1.0, 1.0))
            .transform(&Affine2D::translation(5.0, 5.0));
        assert_eq!(p.bounds(), Rect::new(5.0, 5.0, 1.0, 1.0));
    }
}
