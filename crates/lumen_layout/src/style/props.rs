//! Stylesheet property names applied to a [`Style`]

use lumen_core::parse::{parse_color, parse_length, parse_length_list, parse_number};
use lumen_core::{Brush, Color, Dim, Length, LengthValue, Sides};
use lumen_paint::FontWeight;
use lumen_platform::Cursor;

use super::{
    Align, BorderStyle, Direction, Display, Justify, Overflow, Style, TextAlign, WhiteSpace, XY,
};
use crate::error::{LayoutError, Result};

/// Outcome of applying one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Yes,
    UnknownProperty,
}

fn invalid(property: &str, value: &str) -> LayoutError {
    LayoutError::InvalidProperty {
        property: property.to_string(),
        value: value.to_string(),
    }
}

/// Percentages resolve against the parent content size along `dim`
fn length_along(value: &str, dim: Dim) -> Option<Length> {
    match parse_length(value)? {
        LengthValue::Length(l) => Some(l),
        LengthValue::Percent(p) => Some(match dim {
            Dim::X => Length::pw(p),
            Dim::Y => Length::ph(p),
        }),
    }
}

fn length_list(value: &str) -> Option<Vec<Length>> {
    parse_length_list(value)?
        .into_iter()
        .map(|v| match v {
            LengthValue::Length(l) => Some(l),
            LengthValue::Percent(p) => Some(Length::pw(p)),
        })
        .collect()
}

fn sides(value: &str) -> Option<Sides<Length>> {
    Sides::from_shorthand(&length_list(value)?)
}

fn justify(value: &str) -> Option<Justify> {
    Some(match value {
        "start" | "flex-start" | "left" | "top" => Justify::Start,
        "center" => Justify::Center,
        "end" | "flex-end" | "right" | "bottom" => Justify::End,
        "space-between" => Justify::SpaceBetween,
        "space-around" => Justify::SpaceAround,
        "space-evenly" => Justify::SpaceEvenly,
        _ => return None,
    })
}

fn align(value: &str) -> Option<Align> {
    Some(match value {
        "start" | "flex-start" => Align::Start,
        "center" => Align::Center,
        "end" | "flex-end" => Align::End,
        "stretch" => Align::Stretch,
        _ => return None,
    })
}

fn overflow(value: &str) -> Option<Overflow> {
    Some(match value {
        "visible" => Overflow::Visible,
        "hidden" | "clip" => Overflow::Hidden,
        "auto" => Overflow::Auto,
        "scroll" => Overflow::Scroll,
        _ => return None,
    })
}

fn cursor(value: &str) -> Option<Cursor> {
    Some(match value {
        "default" | "arrow" | "auto" => Cursor::Arrow,
        "pointer" => Cursor::Pointer,
        "text" => Cursor::Text,
        "ew-resize" | "col-resize" => Cursor::ResizeEW,
        "ns-resize" | "row-resize" => Cursor::ResizeNS,
        "grab" => Cursor::Grab,
        "grabbing" => Cursor::Grabbing,
        "not-allowed" => Cursor::NotAllowed,
        "copy" => Cursor::DragCopy,
        "move" => Cursor::DragMove,
        "alias" => Cursor::DragLink,
        _ => return None,
    })
}

fn font_weight(value: &str) -> Option<FontWeight> {
    Some(match value {
        "normal" => FontWeight::Normal,
        "bold" => FontWeight::Bold,
        "lighter" => FontWeight::Light,
        "bolder" => FontWeight::Black,
        n => FontWeight::from_number(n.parse().ok()?),
    })
}

impl Style {
    /// Apply a single `property: value` declaration.
    ///
    /// Unknown properties are reported as [`Applied::UnknownProperty`] and
    /// leave the style untouched; known properties with a value that does not
    /// parse return [`LayoutError::InvalidProperty`].
    pub fn apply_property(&mut self, property: &str, value: &str) -> Result<Applied> {
        let v = value.trim();
        let lower = v.to_ascii_lowercase();
        let bad = || invalid(property, value);

        match property {
            "display" => {
                self.display = match lower.as_str() {
                    "flex" => Display::Flex,
                    "grid" => Display::Grid,
                    "stacked" | "stack" => Display::Stacked,
                    "custom" => Display::Custom,
                    "none" => Display::None,
                    _ => return Err(bad()),
                }
            }
            "flex-direction" | "direction" => {
                self.direction = match lower.as_str() {
                    "row" => Direction::Row,
                    "column" => Direction::Column,
                    _ => return Err(bad()),
                }
            }
            "flex-wrap" => {
                self.wrap = match lower.as_str() {
                    "wrap" => true,
                    "nowrap" => false,
                    _ => return Err(bad()),
                }
            }
            "justify-content" => self.justify = justify(&lower).ok_or_else(bad)?,
            "align-content" => self.align_content = justify(&lower).ok_or_else(bad)?,
            "align-items" => self.align = align(&lower).ok_or_else(bad)?,
            "align-self" => {
                self.align_self = if lower == "auto" {
                    None
                } else {
                    Some(align(&lower).ok_or_else(bad)?)
                }
            }
            "justify-self" => {
                self.justify_self = if lower == "auto" {
                    None
                } else {
                    Some(align(&lower).ok_or_else(bad)?)
                }
            }
            "gap" => {
                let list = length_list(v).ok_or_else(bad)?;
                match *list.as_slice() {
                    [g] => self.gap = XY::splat(g),
                    [row, col] => self.gap = XY::new(col, row),
                    _ => return Err(bad()),
                }
            }
            "row-gap" => self.gap.y = length_along(v, Dim::Y).ok_or_else(bad)?,
            "column-gap" => self.gap.x = length_along(v, Dim::X).ok_or_else(bad)?,
            "columns" | "grid-columns" => {
                let n: usize = v.parse().map_err(|_| bad())?;
                if n == 0 {
                    return Err(bad());
                }
                self.columns = n;
            }
            "stack-top" => self.stack_top = v.parse().map_err(|_| bad())?,

            "padding" => self.padding = sides(v).ok_or_else(bad)?,
            "padding-top" => self.padding.top = length_along(v, Dim::Y).ok_or_else(bad)?,
            "padding-right" => self.padding.right = length_along(v, Dim::X).ok_or_else(bad)?,
            "padding-bottom" => self.padding.bottom = length_along(v, Dim::Y).ok_or_else(bad)?,
            "padding-left" => self.padding.left = length_along(v, Dim::X).ok_or_else(bad)?,

            "border-width" => self.border.width = sides(v).ok_or_else(bad)?,
            "border-color" => {
                self.border.color = Sides::all(parse_color(v).ok_or_else(bad)?);
            }
            "border-radius" => self.border.radius = length_along(v, Dim::X).ok_or_else(bad)?,
            "border-style" => {
                self.border.style = match lower.as_str() {
                    "solid" => BorderStyle::Solid,
                    "dashed" => BorderStyle::Dashed,
                    "dotted" => BorderStyle::Dotted,
                    "none" => BorderStyle::None,
                    _ => return Err(bad()),
                }
            }
            "border" => self.apply_border_shorthand(v).ok_or_else(bad)?,

            "width" => {
                let l = length_along(v, Dim::X).ok_or_else(bad)?;
                self.min.x = l;
                self.max.x = l;
            }
            "height" => {
                let l = length_along(v, Dim::Y).ok_or_else(bad)?;
                self.min.y = l;
                self.max.y = l;
            }
            "min-width" => self.min.x = length_along(v, Dim::X).ok_or_else(bad)?,
            "min-height" => self.min.y = length_along(v, Dim::Y).ok_or_else(bad)?,
            "max-width" => self.max.x = length_along(v, Dim::X).ok_or_else(bad)?,
            "max-height" => self.max.y = length_along(v, Dim::Y).ok_or_else(bad)?,
            "flex-grow" => self.grow.x = parse_number(v).ok_or_else(bad)?,
            "grow" => {
                let nums: Option<Vec<f32>> = v.split_whitespace().map(parse_number).collect();
                match nums.as_deref() {
                    Some([g]) => self.grow = XY::splat(*g),
                    Some([x, y]) => self.grow = XY::new(*x, *y),
                    _ => return Err(bad()),
                }
            }

            "background" | "background-color" => {
                self.background = Brush::Solid(parse_color(v).ok_or_else(bad)?);
            }
            "color" => self.color = parse_color(v).ok_or_else(bad)?,
            "opacity" => self.opacity = parse_number(v).ok_or_else(bad)?.clamp(0.0, 1.0),
            "cursor" => self.cursor = cursor(&lower).ok_or_else(bad)?,
            "overflow" => self.overflow = XY::splat(overflow(&lower).ok_or_else(bad)?),
            "overflow-x" => self.overflow.x = overflow(&lower).ok_or_else(bad)?,
            "overflow-y" => self.overflow.y = overflow(&lower).ok_or_else(bad)?,
            "scrollbar-width" => {
                self.scrollbar_width = length_along(v, Dim::X).ok_or_else(bad)?;
            }

            "font-size" => {
                self.font.size = match parse_length(v).ok_or_else(bad)? {
                    LengthValue::Length(l) => l,
                    LengthValue::Percent(p) => Length::em(p / 100.0),
                }
            }
            "font-family" => self.font.family = v.trim_matches(['"', '\'']).to_string(),
            "font-weight" => self.font.weight = font_weight(&lower).ok_or_else(bad)?,
            "line-height" => self.font.line_height = parse_number(v).ok_or_else(bad)?,
            "text-align" => {
                self.text_align = match lower.as_str() {
                    "start" | "left" => TextAlign::Start,
                    "center" => TextAlign::Center,
                    "end" | "right" => TextAlign::End,
                    _ => return Err(bad()),
                }
            }
            "white-space" => {
                self.white_space = match lower.as_str() {
                    "normal" => WhiteSpace::Normal,
                    "nowrap" => WhiteSpace::NoWrap,
                    "pre" => WhiteSpace::Pre,
                    _ => return Err(bad()),
                }
            }
            _ => return Ok(Applied::UnknownProperty),
        }
        Ok(Applied::Yes)
    }

    /// `border: <width> [<style>] [<color>]` in any order
    fn apply_border_shorthand(&mut self, value: &str) -> Option<()> {
        let mut width = None;
        let mut style = None;
        let mut color: Option<Color> = None;
        for token in value.split_whitespace() {
            let lower = token.to_ascii_lowercase();
            match lower.as_str() {
                "solid" => style = Some(BorderStyle::Solid),
                "dashed" => style = Some(BorderStyle::Dashed),
                "dotted" => style = Some(BorderStyle::Dotted),
                "none" => style = Some(BorderStyle::None),
                _ => {
                    if let Some(LengthValue::Length(l)) = parse_length(token) {
                        width = Some(l);
                    } else {
                        color = Some(parse_color(token)?);
                    }
                }
            }
        }
        if width.is_none() && style.is_none() && color.is_none() {
            return None;
        }
        if let Some(w) = width {
            self.border.width = Sides::all(w);
        }
        if let Some(s) = style {
            self.border.style = s;
        }
        if let Some(c) = color {
            self.border.color = Sides::all(c);
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Unit;

    #[test]
    fn known_properties() {
        let mut s = Style::default();
        s.apply_property("padding", "4px 8px").unwrap();
        assert_eq!(s.padding.left, Length::px(8.0));
        s.apply_property("width", "50%").unwrap();
        assert_eq!(s.min.x.unit, Unit::Pw);
        s.apply_property("border", "2px solid red").unwrap();
        assert_eq!(s.border.color.top, Color::RED);
        assert_eq!(s.border.width.left, Length::px(2.0));
        s.apply_property("grow", "1 0").unwrap();
        assert_eq!(s.grow, XY::new(1.0, 0.0));
        s.apply_property("overflow-y", "auto").unwrap();
        assert_eq!(s.overflow.y, Overflow::Auto);
    }

    #[test]
    fn unknown_and_invalid() {
        let mut s = Style::default();
        assert_eq!(
            s.apply_property("box-shadow", "none").unwrap(),
            Applied::UnknownProperty
        );
        let err = s.apply_property("display", "sideways").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidProperty { .. }));
        assert_eq!(s, Style::default());
    }
}
