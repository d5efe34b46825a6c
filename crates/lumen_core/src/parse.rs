//! Value parsers shared by the stylesheet and SVG readers
//!
//! Colors, numbers, lengths and transform lists use the same grammar in CSS
//! declarations and in SVG presentation attributes, so they live here.
//! Parsers are written with `nom` and return `None` on malformed input;
//! callers decide whether that is an ignored declaration or a format error.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize},
    error::ParseError as NomParseError,
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::color::Color;
use crate::geometry::Affine2D;
use crate::units::{Length, Unit};

/// A parsed length that may be relative to an unknown percentage base
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthValue {
    Length(Length),
    Percent(f32),
}

// ============================================================================
// Numbers
// ============================================================================

/// Whitespace
fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    multispace0(input)
}

/// Separator between list items: whitespace with an optional comma
pub fn list_sep<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(','))(input)?;
    let (input, _) = ws(input)?;
    Ok((input, ()))
}

/// One or more `item`s separated by [`list_sep`].
///
/// The separator may be empty, so abutting numbers such as `1-2` or `.5.5`
/// split where the next number begins.
pub fn separated_items<'a, O, E, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>, E>
where
    E: NomParseError<&'a str>,
    F: Fn(&'a str) -> IResult<&'a str, O, E> + Copy,
{
    map(pair(item, many0(preceded(list_sep, item))), |(first, mut rest)| {
        rest.insert(0, first);
        rest
    })
}

/// A number in CSS/SVG syntax: `-1`, `.5`, `1.`, `2e-3`.
///
/// Unlike `nom::number::complete::float`, an `e` not followed by digits is
/// left in the input so that `2em` parses as `2` followed by `em`.
pub fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f32, E> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;
    match text.parse::<f32>() {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

pub fn parse_number(input: &str) -> Option<f32> {
    all_consuming(delimited(ws, number::<nom::error::Error<&str>>, ws))(input)
        .ok()
        .map(|(_, v)| v)
}

/// Comma and/or whitespace separated numbers; empty input is an empty list
pub fn parse_number_list(input: &str) -> Option<Vec<f32>> {
    all_consuming(delimited(
        ws,
        opt(separated_items(number::<nom::error::Error<&str>>)),
        ws,
    ))(input)
    .ok()
    .map(|(_, v)| v.unwrap_or_default())
}

/// Format a number compactly for serialization (`1`, `0.5`, `-2.25`).
///
/// The output is the shortest text that parses back to the same `f32`.
pub fn format_number(v: f32) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        return format!("{}", v as i64);
    }
    format!("{v}")
}

// ============================================================================
// Lengths
// ============================================================================

fn unit_suffix<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    alt((tag("%"), take_while1(|c: char| c.is_ascii_alphabetic())))(input)
}

/// A length with an optional unit suffix
pub fn length<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, LengthValue, E> {
    let (rest, value) = number(input)?;
    let (rest, suffix) = opt(unit_suffix)(rest)?;
    match suffix {
        Some("%") => Ok((rest, LengthValue::Percent(value))),
        Some(s) => match Unit::from_suffix(s) {
            Some(unit) => Ok((rest, LengthValue::Length(Length::new(value, unit)))),
            None => Err(nom::Err::Error(E::from_error_kind(
                input,
                nom::error::ErrorKind::Tag,
            ))),
        },
        None => Ok((rest, LengthValue::Length(Length::px(value)))),
    }
}

pub fn parse_length(input: &str) -> Option<LengthValue> {
    all_consuming(delimited(ws, length::<nom::error::Error<&str>>, ws))(input)
        .ok()
        .map(|(_, v)| v)
}

/// Whitespace separated lengths (CSS shorthands such as `padding: 4px 8px`)
pub fn parse_length_list(input: &str) -> Option<Vec<LengthValue>> {
    all_consuming(delimited(
        ws,
        opt(separated_items(length::<nom::error::Error<&str>>)),
        ws,
    ))(input)
    .ok()
    .map(|(_, v)| v.unwrap_or_default())
}

// ============================================================================
// Colors
// ============================================================================

/// Parse a CSS/SVG color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
/// `rgb()`, `rgba()`, or a named color
pub fn parse_color(input: &str) -> Option<Color> {
    let input = input.trim();
    if let Ok((_, color)) = all_consuming(hex_color::<nom::error::Error<&str>>)(input) {
        return Some(color);
    }
    if let Ok((_, color)) = all_consuming(rgb_function::<nom::error::Error<&str>>)(input) {
        return Some(color);
    }
    named_color(input)
}

fn hex_color<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Color, E> {
    let (rest, hex) = preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit()))(input)?;
    let digit = |i: usize, n: usize| -> u8 {
        let s = &hex[i..i + n];
        let v = u8::from_str_radix(s, 16).unwrap_or(0);
        if n == 1 {
            v * 17
        } else {
            v
        }
    };
    let color = match hex.len() {
        3 => Color::from_rgba8(digit(0, 1), digit(1, 1), digit(2, 1), 255),
        4 => Color::from_rgba8(digit(0, 1), digit(1, 1), digit(2, 1), digit(3, 1)),
        6 => Color::from_rgba8(digit(0, 2), digit(2, 2), digit(4, 2), 255),
        8 => Color::from_rgba8(digit(0, 2), digit(2, 2), digit(4, 2), digit(6, 2)),
        _ => {
            return Err(nom::Err::Error(E::from_error_kind(
                input,
                nom::error::ErrorKind::LengthValue,
            )))
        }
    };
    Ok((rest, color))
}

/// One channel of `rgb()`: a 0-255 number or a percentage
fn channel<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f32, E> {
    let (rest, v) = number(input)?;
    let (rest, pct) = opt(char('%'))(rest)?;
    Ok((rest, if pct.is_some() { v / 100.0 } else { v / 255.0 }))
}

/// Alpha: 0-1 number or a percentage
fn alpha<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f32, E> {
    let (rest, v) = number(input)?;
    let (rest, pct) = opt(char('%'))(rest)?;
    Ok((rest, if pct.is_some() { v / 100.0 } else { v }))
}

fn rgb_function<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Color, E> {
    let (input, _) = alt((tag_no_case("rgba"), tag_no_case("rgb")))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, r) = channel(input)?;
    let (input, _) = list_sep(input)?;
    let (input, g) = channel(input)?;
    let (input, _) = list_sep(input)?;
    let (input, b) = channel(input)?;
    let (input, a) = opt(preceded(
        tuple((ws, alt((char(','), char('/'))), ws)),
        alpha,
    ))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;
    Ok((
        input,
        Color::rgba(
            r.clamp(0.0, 1.0),
            g.clamp(0.0, 1.0),
            b.clamp(0.0, 1.0),
            a.unwrap_or(1.0).clamp(0.0, 1.0),
        ),
    ))
}

/// Named colors (the CSS basic set plus the common extended names)
pub fn named_color(name: &str) -> Option<Color> {
    let hex = match name.to_ascii_lowercase().as_str() {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "green" => 0x008000,
        "lime" => 0x00ff00,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "cyan" | "aqua" => 0x00ffff,
        "magenta" | "fuchsia" => 0xff00ff,
        "gray" | "grey" => 0x808080,
        "silver" => 0xc0c0c0,
        "maroon" => 0x800000,
        "olive" => 0x808000,
        "navy" => 0x000080,
        "purple" => 0x800080,
        "teal" => 0x008080,
        "orange" => 0xffa500,
        "pink" => 0xffc0cb,
        "brown" => 0xa52a2a,
        "gold" => 0xffd700,
        "indigo" => 0x4b0082,
        "violet" => 0xee82ee,
        "coral" => 0xff7f50,
        "salmon" => 0xfa8072,
        "tomato" => 0xff6347,
        "crimson" => 0xdc143c,
        "khaki" => 0xf0e68c,
        "beige" => 0xf5f5dc,
        "ivory" => 0xfffff0,
        "lavender" => 0xe6e6fa,
        "plum" => 0xdda0dd,
        "orchid" => 0xda70d6,
        "turquoise" => 0x40e0d0,
        "skyblue" => 0x87ceeb,
        "steelblue" => 0x4682b4,
        "royalblue" => 0x4169e1,
        "darkblue" => 0x00008b,
        "darkgreen" => 0x006400,
        "darkred" => 0x8b0000,
        "darkgray" | "darkgrey" => 0xa9a9a9,
        "lightgray" | "lightgrey" => 0xd3d3d3,
        "lightblue" => 0xadd8e6,
        "lightgreen" => 0x90ee90,
        "whitesmoke" => 0xf5f5f5,
        "gainsboro" => 0xdcdcdc,
        "slategray" | "slategrey" => 0x708090,
        "dimgray" | "dimgrey" => 0x696969,
        _ => return None,
    };
    Some(Color::from_hex(hex))
}

// ============================================================================
// Transforms
// ============================================================================

fn transform_args<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<f32>, E> {
    map(
        delimited(
            tuple((ws, char('('), ws)),
            opt(separated_items(number)),
            tuple((ws, char(')'))),
        ),
        Option::unwrap_or_default,
    )(input)
}

fn transform_item<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Option<Affine2D>, E> {
    let (rest, name) = take_while1(|c: char| c.is_ascii_alphabetic())(input)?;
    let (rest, args) = transform_args(rest)?;
    let deg = |v: f32| v.to_radians();
    let t = match (name, args.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => Some(Affine2D::new(a, b, c, d, e, f)),
        ("translate", &[x]) => Some(Affine2D::translation(x, 0.0)),
        ("translate", &[x, y]) => Some(Affine2D::translation(x, y)),
        ("scale", &[s]) => Some(Affine2D::scale(s, s)),
        ("scale", &[sx, sy]) => Some(Affine2D::scale(sx, sy)),
        ("rotate", &[a]) => Some(Affine2D::rotation(deg(a))),
        ("rotate", &[a, cx, cy]) => Some(
            Affine2D::translation(cx, cy)
                .then(&Affine2D::rotation(deg(a)))
                .then(&Affine2D::translation(-cx, -cy)),
        ),
        ("skewX", &[a]) => Some(Affine2D::skew_x(deg(a))),
        ("skewY", &[a]) => Some(Affine2D::skew_y(deg(a))),
        _ => None,
    };
    Ok((rest, t))
}

/// Parse an SVG transform list (`translate(10 20) rotate(45)`); items
/// compose left to right as in SVG
pub fn parse_transform(input: &str) -> Option<Affine2D> {
    let (_, items) = all_consuming(delimited(
        ws,
        many0(map(
            pair(transform_item::<nom::error::Error<&str>>, list_sep),
            |(t, _)| t,
        )),
        ws,
    ))(input)
    .ok()?;
    let mut out = Affine2D::IDENTITY;
    for item in items {
        out = out.then(&item?);
    }
    Some(out)
}

/// Serialize a transform as an SVG `matrix(...)`
pub fn format_transform(t: &Affine2D) -> String {
    let [a, b, c, d, e, f] = t.elements;
    format!(
        "matrix({} {} {} {} {} {})",
        format_number(a),
        format_number(b),
        format_number(c),
        format_number(d),
        format_number(e),
        format_number(f)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_number(" -1.5 "), Some(-1.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number_list("1,2 3 , 4"), Some(vec![1.0, 2.0, 3.0, 4.0]));
        assert_eq!(parse_number_list("1"), Some(vec![1.0]));
        assert_eq!(parse_number_list("0 0 100 100"), Some(vec![0.0, 0.0, 100.0, 100.0]));
        assert_eq!(parse_number_list(""), Some(Vec::new()));
        assert_eq!(parse_number_list("1,,2"), None);
        assert_eq!(parse_number_list("1 2,"), None);
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(parse_number(&format_number(0.1 + 0.2)), Some(0.1 + 0.2));
    }

    #[test]
    fn lengths_with_units() {
        assert_eq!(
            parse_length("2em"),
            Some(LengthValue::Length(Length::new(2.0, Unit::Em)))
        );
        assert_eq!(parse_length("50%"), Some(LengthValue::Percent(50.0)));
        assert_eq!(parse_length("12"), Some(LengthValue::Length(Length::px(12.0))));
        assert_eq!(parse_length("3parsecs"), None);
        assert_eq!(
            parse_length_list("4px 8px"),
            Some(vec![
                LengthValue::Length(Length::px(4.0)),
                LengthValue::Length(Length::px(8.0)),
            ])
        );
        assert_eq!(parse_length_list("10%").map(|v| v.len()), Some(1));
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("#fff"), Some(Color::WHITE));
        assert_eq!(parse_color("#000000"), Some(Color::BLACK));
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some(Color::RED));
        let c = parse_color("rgba(0, 0, 255, 0.5)").unwrap();
        assert_eq!(c.a, 0.5);
        assert_eq!(parse_color("White"), Some(Color::WHITE));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("notacolor"), None);
    }

    #[test]
    fn transforms_compose_left_to_right() {
        let t = parse_transform("translate(10, 20) scale(2)").unwrap();
        let p = t.transform_point(crate::geometry::Point::new(1.0, 1.0));
        assert_eq!((p.x, p.y), (12.0, 22.0));
        assert!(parse_transform("skewQ(3)").is_none());
        assert_eq!(parse_transform(""), Some(Affine2D::IDENTITY));

        let t = parse_transform("translate(10,20)").unwrap();
        let p = t.transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert_eq!((p.x, p.y), (10.0, 20.0));
    }

    #[test]
    fn abutting_numbers_split_where_the_next_begins() {
        assert_eq!(parse_number_list("1-2"), Some(vec![1.0, -2.0]));
        assert_eq!(parse_number_list(".5.5"), Some(vec![0.5, 0.5]));
        assert_eq!(parse_number_list("3-2.5.5,1e1"), Some(vec![3.0, -2.5, 0.5, 10.0]));
    }
}
