//! Logical units and their conversion to device dots
//!
//! A [`Length`] keeps the authored value and unit next to the converted
//! `dots`, so a style can be re-resolved when the DPI or font size changes.

use std::fmt;

/// Unit of a [`Length`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Raw device dots
    #[default]
    Px,
    /// Density-independent pixels, 1/160 inch
    Dp,
    /// Typographic points, 1/72 inch
    Pt,
    /// Multiples of the current font size
    Em,
    /// Width of the `0` glyph, approximated as half an em
    Ch,
    /// Percent of the parent content width
    Pw,
    /// Percent of the parent content height
    Ph,
    /// Percent of the viewport width
    Vw,
    /// Percent of the viewport height
    Vh,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Dp => "dp",
            Unit::Pt => "pt",
            Unit::Em => "em",
            Unit::Ch => "ch",
            Unit::Pw => "pw",
            Unit::Ph => "ph",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
        }
    }

    pub fn from_suffix(s: &str) -> Option<Unit> {
        Some(match s.to_ascii_lowercase().as_str() {
            "" | "px" => Unit::Px,
            "dp" => Unit::Dp,
            "pt" => Unit::Pt,
            "em" | "rem" => Unit::Em,
            "ch" | "ex" => Unit::Ch,
            "pw" => Unit::Pw,
            "ph" => Unit::Ph,
            "vw" => Unit::Vw,
            "vh" => Unit::Vh,
            _ => return None,
        })
    }
}

/// A value with a unit and its most recent conversion to dots
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: Unit,
    /// Converted value, valid after [`Length::to_dots`]
    pub dots: f32,
}

impl Length {
    pub const ZERO: Length = Length {
        value: 0.0,
        unit: Unit::Px,
        dots: 0.0,
    };

    pub const fn new(value: f32, unit: Unit) -> Self {
        Self {
            value,
            unit,
            dots: if matches!(unit, Unit::Px) { value } else { 0.0 },
        }
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, Unit::Px)
    }

    pub const fn dp(value: f32) -> Self {
        Self::new(value, Unit::Dp)
    }

    pub const fn em(value: f32) -> Self {
        Self::new(value, Unit::Em)
    }

    pub const fn pw(value: f32) -> Self {
        Self::new(value, Unit::Pw)
    }

    pub const fn ph(value: f32) -> Self {
        Self::new(value, Unit::Ph)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Convert using `ctx`, caching the result in `dots`
    pub fn to_dots(&mut self, ctx: &UnitContext) -> f32 {
        self.dots = ctx.to_dots(self.value, self.unit);
        self.dots
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Conversion table from logical units to device dots for one widget
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitContext {
    /// Logical dots per inch
    pub dpi: f32,
    /// Font size in dots (the em base)
    pub font_size: f32,
    /// Parent content size in dots (percent bases)
    pub parent_width: f32,
    pub parent_height: f32,
    /// Viewport size in dots
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            dpi: 160.0,
            font_size: 16.0,
            parent_width: 0.0,
            parent_height: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl UnitContext {
    pub fn with_dpi(dpi: f32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    pub fn set_parent_size(&mut self, width: f32, height: f32) {
        self.parent_width = width;
        self.parent_height = height;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    pub fn to_dots(&self, value: f32, unit: Unit) -> f32 {
        match unit {
            Unit::Px => value,
            Unit::Dp => value * self.dpi / 160.0,
            Unit::Pt => value * self.dpi / 72.0,
            Unit::Em => value * self.font_size,
            Unit::Ch => value * self.font_size * 0.5,
            Unit::Pw => value * self.parent_width / 100.0,
            Unit::Ph => value * self.parent_height / 100.0,
            Unit::Vw => value * self.viewport_width / 100.0,
            Unit::Vh => value * self.viewport_height / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let mut ctx = UnitContext::with_dpi(320.0);
        ctx.font_size = 20.0;
        ctx.set_parent_size(200.0, 50.0);
        ctx.set_viewport(1000.0, 800.0);
        assert_eq!(ctx.to_dots(10.0, Unit::Dp), 20.0);
        assert_eq!(ctx.to_dots(2.0, Unit::Em), 40.0);
        assert_eq!(ctx.to_dots(50.0, Unit::Pw), 100.0);
        assert_eq!(ctx.to_dots(10.0, Unit::Vh), 80.0);
        let mut l = Length::dp(4.0);
        assert_eq!(l.to_dots(&ctx), 8.0);
        assert_eq!(l.dots, 8.0);
    }

    #[test]
    fn suffix_round_trip() {
        for unit in [Unit::Px, Unit::Dp, Unit::Em, Unit::Vw] {
            assert_eq!(Unit::from_suffix(unit.suffix()), Some(unit));
        }
        assert_eq!(Unit::from_suffix("furlong"), None);
    }
}
