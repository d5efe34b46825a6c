//! The resolved style record of a widget
//!
//! A [`Style`] is rebuilt from scratch on every style pass: defaults, then the
//! inheritable fields of the parent, then stylers and stylesheet rules, then
//! the state layer. Lengths keep their authored unit until
//! [`Style::to_dots`] converts them for the widget's [`UnitContext`].

mod props;

pub use props::Applied;

use lumen_core::{Brush, Color, CornerRadius, Dim, Length, Sides, Size, UnitContext};
use lumen_paint::FontWeight;
use lumen_platform::Cursor;

use crate::flags::{Abilities, StateFlags};

/// A pair of per-axis values
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> XY<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: T) -> Self {
        Self { x: v, y: v }
    }

    pub fn dim(&self, dim: Dim) -> T {
        match dim {
            Dim::X => self.x,
            Dim::Y => self.y,
        }
    }

    pub fn set_dim(&mut self, dim: Dim, value: T) {
        match dim {
            Dim::X => self.x = value,
            Dim::Y => self.y = value,
        }
    }
}

impl XY<Length> {
    /// Converted values as a size
    pub fn dots(&self) -> Size {
        Size::new(self.x.dots, self.y.dots)
    }
}

/// How a widget arranges its children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Display {
    #[default]
    Flex,
    Grid,
    /// Children share the content box; only `stack_top` is shown
    Stacked,
    /// Children keep the positions their owner gives them
    Custom,
    /// The widget is not shown and takes no space
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Row,
    Column,
}

impl Direction {
    /// Main axis
    pub fn dim(self) -> Dim {
        match self {
            Direction::Row => Dim::X,
            Direction::Column => Dim::Y,
        }
    }
}

/// Distribution of free space along an axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Placement of an item inside its cross-axis slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    /// Scrollbar when the content does not fit
    Auto,
    /// Scrollbar always
    Scroll,
}

impl Overflow {
    pub fn scrolls(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Wrap at break opportunities
    #[default]
    Normal,
    NoWrap,
    /// Keep newlines, no wrapping
    Pre,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Border {
    pub width: Sides<Length>,
    pub color: Sides<Color>,
    pub radius: Length,
    pub style: BorderStyle,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: Sides::all(Length::ZERO),
            color: Sides::all(Color::TRANSPARENT),
            radius: Length::ZERO,
            style: BorderStyle::Solid,
        }
    }
}

impl Border {
    pub fn widths(&self) -> Sides<f32> {
        if self.style == BorderStyle::None {
            return Sides::ZERO;
        }
        self.width.map(|l| l.dots)
    }

    pub fn corner_radius(&self) -> CornerRadius {
        CornerRadius::uniform(self.radius.dots)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub size: Length,
    pub family: String,
    pub weight: FontWeight,
    /// Multiple of the font size
    pub line_height: f32,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: Length::dp(16.0),
            family: "sans-serif".to_string(),
            weight: FontWeight::Normal,
            line_height: 1.2,
        }
    }
}

/// Resolved style of one widget
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    // Typography (inherited)
    pub font: Font,
    pub color: Color,
    pub text_align: TextAlign,
    pub white_space: WhiteSpace,

    // Box model
    pub padding: Sides<Length>,
    pub border: Border,
    /// Minimum size; zero means content sized
    pub min: XY<Length>,
    /// Maximum size; zero means unconstrained
    pub max: XY<Length>,
    pub grow: XY<f32>,

    // Paint
    pub background: Brush,
    pub opacity: f32,
    pub cursor: Cursor,

    // Layout
    pub display: Display,
    pub direction: Direction,
    pub wrap: bool,
    pub justify: Justify,
    /// Cross-axis alignment of items
    pub align: Align,
    /// Distribution of wrapped tracks
    pub align_content: Justify,
    pub justify_self: Option<Align>,
    pub align_self: Option<Align>,
    pub gap: XY<Length>,
    /// Grid column count
    pub columns: usize,
    /// Visible child of a stacked layout
    pub stack_top: usize,
    pub overflow: XY<Overflow>,
    pub scrollbar_width: Length,

    // State
    pub state: StateFlags,
    pub abilities: Abilities,
    /// Opacity of the state overlay
    pub state_layer: f32,
    pub state_color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font: Font::default(),
            color: Color::BLACK,
            text_align: TextAlign::Start,
            white_space: WhiteSpace::Normal,
            padding: Sides::all(Length::ZERO),
            border: Border::default(),
            min: XY::splat(Length::ZERO),
            max: XY::splat(Length::ZERO),
            grow: XY::splat(0.0),
            background: Brush::Solid(Color::TRANSPARENT),
            opacity: 1.0,
            cursor: Cursor::Arrow,
            display: Display::Flex,
            direction: Direction::Row,
            wrap: false,
            justify: Justify::Start,
            align: Align::Start,
            align_content: Justify::Start,
            justify_self: None,
            align_self: None,
            gap: XY::splat(Length::ZERO),
            columns: 1,
            stack_top: 0,
            overflow: XY::splat(Overflow::Visible),
            scrollbar_width: Length::dp(10.0),
            state: StateFlags::empty(),
            abilities: Abilities::empty(),
            state_layer: 0.0,
            state_color: Color::BLACK,
        }
    }
}

impl Style {
    /// Copy the inheritable fields from a parent's resolved style
    pub fn inherit(&mut self, parent: &Style) {
        self.font = parent.font.clone();
        // Inherit the computed size so relative units do not compound
        self.font.size = Length::px(parent.font.size.dots);
        self.color = parent.color;
        self.text_align = parent.text_align;
        self.white_space = parent.white_space;
    }

    pub fn is(&self, state: StateFlags) -> bool {
        self.state.contains(state)
    }

    pub fn can(&self, ability: Abilities) -> bool {
        self.abilities.contains(ability)
    }

    pub fn is_disabled(&self) -> bool {
        self.is(StateFlags::DISABLED)
    }

    /// Convert every length to dots.
    ///
    /// The font size is resolved first against the parent font size in
    /// `ctx`, then becomes the em base of everything else.
    pub fn to_dots(&mut self, ctx: &UnitContext) {
        let font_size = self.font.size.to_dots(ctx);
        let ctx = UnitContext { font_size, ..*ctx };

        for side in [
            &mut self.padding.top,
            &mut self.padding.right,
            &mut self.padding.bottom,
            &mut self.padding.left,
            &mut self.border.width.top,
            &mut self.border.width.right,
            &mut self.border.width.bottom,
            &mut self.border.width.left,
        ] {
            side.to_dots(&ctx);
        }
        self.border.radius.to_dots(&ctx);
        for l in [
            &mut self.min.x,
            &mut self.min.y,
            &mut self.max.x,
            &mut self.max.y,
            &mut self.gap.x,
            &mut self.gap.y,
            &mut self.scrollbar_width,
        ] {
            l.to_dots(&ctx);
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font.size.dots
    }

    pub fn line_height(&self) -> f32 {
        self.font.size.dots * self.font.line_height
    }

    pub fn padding_dots(&self) -> Sides<f32> {
        self.padding.map(|l| l.dots)
    }

    /// Padding plus border, the space between the total box and the content box
    pub fn box_space(&self) -> Sides<f32> {
        self.padding_dots().add(&self.border.widths())
    }

    /// Clamp a total size by the min and max constraints.
    ///
    /// A max below the min is raised to the min.
    pub fn clamp_size(&self, size: Size) -> Size {
        let mut out = size;
        for dim in [Dim::X, Dim::Y] {
            let min = self.min.dim(dim).dots;
            let mut v = size.dim(dim).max(min);
            let max = self.max.dim(dim).dots;
            if max > 0.0 {
                v = v.min(max.max(min));
            }
            out.set_dim(dim, v);
        }
        out
    }

    /// Whether `other` differs only in fields that do not affect geometry
    pub fn layout_eq(&self, other: &Style) -> bool {
        self.font == other.font
            && self.white_space == other.white_space
            && self.padding == other.padding
            && self.border.width == other.border.width
            && self.border.style == other.border.style
            && self.min == other.min
            && self.max == other.max
            && self.grow == other.grow
            && self.display == other.display
            && self.direction == other.direction
            && self.wrap == other.wrap
            && self.justify == other.justify
            && self.align == other.align
            && self.align_content == other.align_content
            && self.justify_self == other.justify_self
            && self.align_self == other.align_self
            && self.gap == other.gap
            && self.columns == other.columns
            && self.stack_top == other.stack_top
            && self.overflow == other.overflow
            && self.scrollbar_width == other.scrollbar_width
    }

    // Builder-style helpers used by stylers

    pub fn set_padding(&mut self, all: Length) -> &mut Self {
        self.padding = Sides::all(all);
        self
    }

    pub fn set_min(&mut self, width: Length, height: Length) -> &mut Self {
        self.min = XY::new(width, height);
        self
    }

    /// Fixed size: min and max both set
    pub fn set_size(&mut self, width: Length, height: Length) -> &mut Self {
        self.min = XY::new(width, height);
        self.max = XY::new(width, height);
        self
    }

    pub fn set_grow(&mut self, x: f32, y: f32) -> &mut Self {
        self.grow = XY::new(x, y);
        self
    }

    pub fn set_gap(&mut self, gap: Length) -> &mut Self {
        self.gap = XY::splat(gap);
        self
    }

    pub fn set_background(&mut self, brush: impl Into<Brush>) -> &mut Self {
        self.background = brush.into();
        self
    }

    pub fn set_border(&mut self, width: Length, color: Color) -> &mut Self {
        self.border.width = Sides::all(width);
        self.border.color = Sides::all(color);
        self
    }

    pub fn column(&mut self) -> &mut Self {
        self.direction = Direction::Column;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_dots_uses_own_font_size_for_em() {
        let mut s = Style::default();
        s.font.size = Length::dp(20.0);
        s.padding = Sides::all(Length::em(0.5));
        s.min = XY::new(Length::pw(50.0), Length::dp(10.0));
        let mut ctx = UnitContext::with_dpi(320.0);
        ctx.set_parent_size(300.0, 100.0);
        s.to_dots(&ctx);
        assert_eq!(s.font_size(), 40.0);
        assert_eq!(s.padding_dots().left, 20.0);
        assert_eq!(s.min.x.dots, 150.0);
        assert_eq!(s.min.y.dots, 20.0);
    }

    #[test]
    fn clamp_prefers_min_over_max() {
        let mut s = Style::default();
        s.min = XY::new(Length::px(50.0), Length::ZERO);
        s.max = XY::new(Length::px(30.0), Length::px(10.0));
        assert_eq!(s.clamp_size(Size::new(10.0, 40.0)), Size::new(50.0, 10.0));
    }

    #[test]
    fn inherit_copies_typography_only() {
        let mut parent = Style::default();
        parent.color = Color::RED;
        parent.padding = Sides::all(Length::px(9.0));
        let mut child = Style::default();
        child.inherit(&parent);
        assert_eq!(child.color, Color::RED);
        assert_eq!(child.padding, Sides::all(Length::ZERO));
    }
}
