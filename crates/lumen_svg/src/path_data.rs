//! SVG path-data grammar (`d` attribute)
//!
//! Every command letter of SVG 1.1 is accepted in absolute and relative form.
//! The result is a [`Path`] in absolute coordinates: `H`/`V` become lines and
//! the smooth `S`/`T` forms are expanded with their reflected control point.
//! On malformed input the path read so far is returned inside the error, so
//! callers can render up to the first bad segment.

use lumen_core::parse::{format_number, list_sep, number};
use lumen_core::{Path, PathCommand, Point, Vec2};
use nom::character::complete::{multispace0, one_of};
use nom::IResult;

type NomError<'a> = nom::error::Error<&'a str>;

/// A path-data string failed to parse at `offset`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid path data at byte {offset}")]
pub struct PathDataError {
    /// Segments read before the error
    pub partial: Path,
    pub offset: usize,
}

fn ws(input: &str) -> &str {
    multispace0::<&str, NomError>(input).map_or(input, |(rest, _)| rest)
}

fn numbers(input: &str, count: usize) -> IResult<&str, Vec<f32>, NomError<'_>> {
    let mut values = Vec::with_capacity(count);
    let (mut rest, first) = number::<NomError>(input)?;
    values.push(first);
    for _ in 1..count {
        let (r, _) = list_sep::<NomError>(rest)?;
        let (r, v) = number::<NomError>(r)?;
        values.push(v);
        rest = r;
    }
    Ok((rest, values))
}

fn flag(input: &str) -> IResult<&str, f32, NomError<'_>> {
    let (rest, c) = one_of::<_, _, NomError>("01")(input)?;
    Ok((rest, if c == '1' { 1.0 } else { 0.0 }))
}

/// `rx ry rotation large-arc sweep x y`; flags may be packed without separators
fn arc_args(input: &str) -> IResult<&str, Vec<f32>, NomError<'_>> {
    let (rest, mut values) = numbers(input, 3)?;
    let (rest, _) = list_sep::<NomError>(rest)?;
    let (rest, large) = flag(rest)?;
    let (rest, _) = list_sep::<NomError>(rest)?;
    let (rest, sweep) = flag(rest)?;
    let (rest, _) = list_sep::<NomError>(rest)?;
    let (rest, end) = numbers(rest, 2)?;
    values.extend([large, sweep]);
    values.extend(end);
    Ok((rest, values))
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'C' => 6,
        'S' | 'Q' => 4,
        'A' => 7,
        _ => 0,
    }
}

/// Pen state while building the absolute path
#[derive(Default)]
struct Pen {
    path: Path,
    current: Point,
    start: Point,
    last_cubic: Option<Point>,
    last_quad: Option<Point>,
}

impl Pen {
    fn point(&self, relative: bool, x: f32, y: f32) -> Point {
        if relative {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn reflect(&self, control: Option<Point>) -> Point {
        match control {
            Some(c) => Point::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y),
            None => self.current,
        }
    }

    fn apply(&mut self, command: char, first: bool, v: &[f32]) {
        let rel = command.is_ascii_lowercase();
        let mut cubic = None;
        let mut quad = None;
        match command.to_ascii_uppercase() {
            'M' => {
                let p = self.point(rel, v[0], v[1]);
                if first {
                    self.path.push(PathCommand::MoveTo(p));
                    self.start = p;
                } else {
                    self.path.push(PathCommand::LineTo(p));
                }
                self.current = p;
            }
            'L' => {
                let p = self.point(rel, v[0], v[1]);
                self.path.push(PathCommand::LineTo(p));
                self.current = p;
            }
            'H' => {
                let x = if rel { self.current.x + v[0] } else { v[0] };
                let p = Point::new(x, self.current.y);
                self.path.push(PathCommand::LineTo(p));
                self.current = p;
            }
            'V' => {
                let y = if rel { self.current.y + v[0] } else { v[0] };
                let p = Point::new(self.current.x, y);
                self.path.push(PathCommand::LineTo(p));
                self.current = p;
            }
            'C' => {
                let control1 = self.point(rel, v[0], v[1]);
                let control2 = self.point(rel, v[2], v[3]);
                let end = self.point(rel, v[4], v[5]);
                self.path.push(PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                });
                cubic = Some(control2);
                self.current = end;
            }
            'S' => {
                let control1 = self.reflect(self.last_cubic);
                let control2 = self.point(rel, v[0], v[1]);
                let end = self.point(rel, v[2], v[3]);
                self.path.push(PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                });
                cubic = Some(control2);
                self.current = end;
            }
            'Q' => {
                let control = self.point(rel, v[0], v[1]);
                let end = self.point(rel, v[2], v[3]);
                self.path.push(PathCommand::QuadTo { control, end });
                quad = Some(control);
                self.current = end;
            }
            'T' => {
                let control = self.reflect(self.last_quad);
                let end = self.point(rel, v[0], v[1]);
                self.path.push(PathCommand::QuadTo { control, end });
                quad = Some(control);
                self.current = end;
            }
            'A' => {
                let end = self.point(rel, v[5], v[6]);
                self.path.push(PathCommand::ArcTo {
                    radii: Vec2::new(v[0].abs(), v[1].abs()),
                    rotation: v[2],
                    large_arc: v[3] != 0.0,
                    sweep: v[4] != 0.0,
                    end,
                });
                self.current = end;
            }
            _ => {}
        }
        self.last_cubic = cubic;
        self.last_quad = quad;
    }

    fn close(&mut self) {
        self.path.push(PathCommand::Close);
        self.current = self.start;
        self.last_cubic = None;
        self.last_quad = None;
    }
}

/// Parse an SVG `d` attribute into an absolute path
pub fn parse_path_data(d: &str) -> Result<Path, PathDataError> {
    let mut pen = Pen::default();
    let mut rest = ws(d);
    let fail = |pen: Pen, rest: &str| PathDataError {
        partial: pen.path,
        offset: d.len() - rest.len(),
    };

    while !rest.is_empty() {
        let Ok((after, command)) =
            one_of::<_, _, NomError>("MmLlHhVvCcSsQqTtAaZz")(rest)
        else {
            return Err(fail(pen, rest));
        };
        // A path must start with a moveto
        if pen.path.is_empty() && !matches!(command, 'M' | 'm') {
            return Err(fail(pen, rest));
        }
        if matches!(command, 'Z' | 'z') {
            pen.close();
            rest = ws(after);
            continue;
        }

        let count = arity(command);
        let mut cursor = ws(after);
        let mut first = true;
        loop {
            let parsed = if count == 7 {
                arc_args(cursor)
            } else {
                numbers(cursor, count)
            };
            match parsed {
                Ok((after_args, values)) => {
                    pen.apply(command, first, &values);
                    first = false;
                    cursor = match list_sep::<NomError>(after_args) {
                        Ok((r, _)) => r,
                        Err(_) => after_args,
                    };
                }
                Err(_) if first => return Err(fail(pen, cursor)),
                Err(_) => break,
            }
        }
        rest = cursor;
    }
    Ok(pen.path)
}

/// Serialize a path as absolute SVG path data
pub fn format_path_data(path: &Path) -> String {
    let mut out = String::new();
    let mut push = |letter: &str, values: &[f32]| {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(letter);
        for v in values {
            out.push(' ');
            out.push_str(&format_number(*v));
        }
    };
    for cmd in path.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => push("M", &[p.x, p.y]),
            PathCommand::LineTo(p) => push("L", &[p.x, p.y]),
            PathCommand::QuadTo { control, end } => {
                push("Q", &[control.x, control.y, end.x, end.y])
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => push(
                "C",
                &[control1.x, control1.y, control2.x, control2.y, end.x, end.y],
            ),
            PathCommand::ArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => push(
                "A",
                &[
                    radii.x,
                    radii.y,
                    rotation,
                    if large_arc { 1.0 } else { 0.0 },
                    if sweep { 1.0 } else { 0.0 },
                    end.x,
                    end.y,
                ],
            ),
            PathCommand::Close => push("Z", &[]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_and_shorthand_commands() {
        let path = parse_path_data("m10 10 h20 v10 l-5,5 z").unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(10.0, 10.0)),
                PathCommand::LineTo(Point::new(30.0, 10.0)),
                PathCommand::LineTo(Point::new(30.0, 20.0)),
                PathCommand::LineTo(Point::new(25.0, 25.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let path = parse_path_data("M0 0 10 0 10 10").unwrap();
        assert_eq!(path.commands().len(), 3);
        assert_eq!(path.commands()[2], PathCommand::LineTo(Point::new(10.0, 10.0)));
    }

    #[test]
    fn smooth_cubic_reflects_control() {
        let path = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
        match path.commands()[2] {
            PathCommand::CubicTo { control1, .. } => assert_eq!(control1, Point::new(10.0, -10.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn packed_arc_flags() {
        let path = parse_path_data("M0 0a10 10 0 0110 10").unwrap();
        match path.commands()[1] {
            PathCommand::ArcTo {
                large_arc,
                sweep,
                end,
                ..
            } => {
                assert!(!large_arc);
                assert!(sweep);
                assert_eq!(end, Point::new(10.0, 10.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn compact_numbers() {
        let path = parse_path_data("M.5.5L-1-1").unwrap();
        assert_eq!(path.commands()[0], PathCommand::MoveTo(Point::new(0.5, 0.5)));
        assert_eq!(path.commands()[1], PathCommand::LineTo(Point::new(-1.0, -1.0)));
    }

    #[test]
    fn error_keeps_partial_path() {
        let err = parse_path_data("M0 0 L10 10 X 5").unwrap_err();
        assert_eq!(err.partial.commands().len(), 2);
        assert_eq!(err.offset, 12);
        assert!(parse_path_data("L10 10").is_err());
    }

    #[test]
    fn format_then_parse_is_identity() {
        let path = parse_path_data("M1.25 2 Q3 4 5 6 T9 9 A5 4 30 1 0 20 20 Z").unwrap();
        let again = parse_path_data(&format_path_data(&path)).unwrap();
        assert_eq!(path, again);
    }
}
