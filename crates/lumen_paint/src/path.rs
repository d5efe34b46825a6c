//! Conversion of Lumen paths and strokes into rasterizer paths

use lumen_core::{Affine2D, FillRule, LineCap, LineJoin, Path, PathCommand, Stroke};

/// Lower a [`Path`] into a tiny-skia path; `None` for empty or degenerate paths
pub fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let lowered = path.to_curves();
    let mut pb = tiny_skia::PathBuilder::new();
    let mut open = false;
    for cmd in lowered.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => {
                pb.move_to(p.x, p.y);
                open = true;
            }
            PathCommand::LineTo(p) => {
                ensure_open(&mut pb, &mut open, p.x, p.y);
                pb.line_to(p.x, p.y);
            }
            PathCommand::QuadTo { control, end } => {
                ensure_open(&mut pb, &mut open, control.x, control.y);
                pb.quad_to(control.x, control.y, end.x, end.y);
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                ensure_open(&mut pb, &mut open, control1.x, control1.y);
                pb.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y);
            }
            PathCommand::ArcTo { end, .. } => {
                ensure_open(&mut pb, &mut open, end.x, end.y);
                pb.line_to(end.x, end.y);
            }
            PathCommand::Close => {
                if open {
                    pb.close();
                }
            }
        }
    }
    pb.finish()
}

/// A path that starts with a drawing command implicitly begins at its first point
fn ensure_open(pb: &mut tiny_skia::PathBuilder, open: &mut bool, x: f32, y: f32) {
    if !*open {
        pb.move_to(x, y);
        *open = true;
    }
}

pub fn to_skia_transform(t: &Affine2D) -> tiny_skia::Transform {
    let [a, b, c, d, tx, ty] = t.elements;
    tiny_skia::Transform::from_row(a, b, c, d, tx, ty)
}

pub fn to_skia_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

pub fn to_skia_stroke(stroke: &Stroke) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width: stroke.width,
        miter_limit: stroke.miter_limit,
        line_cap: match stroke.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match stroke.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash: if stroke.dash.len() >= 2 {
            tiny_skia::StrokeDash::new(stroke.dash.clone(), stroke.dash_offset)
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Point, Rect};

    #[test]
    fn empty_path_has_no_skia_path() {
        assert!(to_skia_path(&Path::new()).is_none());
    }

    #[test]
    fn rect_converts_with_same_bounds() {
        let p = to_skia_path(&Path::rect(Rect::new(1.0, 2.0, 10.0, 20.0))).unwrap();
        let b = p.bounds();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (1.0, 2.0, 11.0, 22.0));
    }

    #[test]
    fn line_without_move_starts_at_first_point() {
        let path = Path::from_commands(vec![
            PathCommand::LineTo(Point::new(5.0, 5.0)),
            PathCommand::LineTo(Point::new(10.0, 5.0)),
        ]);
        assert!(to_skia_path(&path).is_some());
    }
}
