//! Presentation attributes and their cascade
//!
//! [`SvgStyle`] is what a single element specifies, either through
//! presentation attributes (`fill="red"`) or a `style="fill: red"`
//! declaration list. [`ResolvedStyle`] is the result of inheriting the
//! unset properties from the parent element.

use lumen_core::parse::{format_number, parse_color, parse_number, parse_number_list};
use lumen_core::{Color, FillRule, LineCap, LineJoin, Stroke};

/// Value of `fill` / `stroke`
#[derive(Clone, Debug, PartialEq)]
pub enum PaintValue {
    None,
    Color(Color),
    CurrentColor,
    /// `url(#id)` with an optional fallback color
    Url { id: String, fallback: Option<Color> },
}

impl PaintValue {
    pub fn parse(value: &str) -> Option<PaintValue> {
        let value = value.trim();
        match value {
            "none" => return Some(PaintValue::None),
            "currentColor" | "currentcolor" => return Some(PaintValue::CurrentColor),
            _ => {}
        }
        if let Some(rest) = value.strip_prefix("url(") {
            let close = rest.find(')')?;
            let id = parse_url_id(&rest[..=close])?;
            let tail = rest[close + 1..].trim();
            let fallback = if tail.is_empty() {
                None
            } else {
                Some(parse_color(tail)?)
            };
            return Some(PaintValue::Url { id, fallback });
        }
        parse_color(value).map(PaintValue::Color)
    }

    pub fn to_attribute(&self) -> String {
        match self {
            PaintValue::None => "none".to_string(),
            PaintValue::CurrentColor => "currentColor".to_string(),
            PaintValue::Color(c) => format_color(c),
            PaintValue::Url { id, fallback } => match fallback {
                Some(c) => format!("url(#{id}) {}", format_color(c)),
                None => format!("url(#{id})"),
            },
        }
    }
}

/// Extract `id` from `#id)` / `url(#id)` forms
pub fn parse_url_id(value: &str) -> Option<String> {
    let value = value.trim();
    let value = value.strip_prefix("url(").unwrap_or(value);
    let value = value.strip_suffix(')').unwrap_or(value).trim();
    let value = value.trim_matches(|c| c == '\'' || c == '"');
    let id = value.strip_prefix('#')?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Colors are written as `#rrggbb`, or `rgba()` with an exact alpha when
/// translucent
pub fn format_color(c: &Color) -> String {
    let [r, g, b, _] = c.to_rgba8();
    if c.a >= 1.0 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("rgba({r},{g},{b},{})", format_number(c.a))
    }
}

/// Outcome of applying one property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyStatus {
    Applied,
    /// Not a presentation property; the caller keeps it verbatim
    Unknown,
    /// A known property with an unreadable value; ignored
    Invalid,
}

/// Properties specified on one element; `None` means inherit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvgStyle {
    pub fill: Option<PaintValue>,
    pub fill_opacity: Option<f32>,
    pub fill_rule: Option<FillRule>,
    pub stroke: Option<PaintValue>,
    pub stroke_width: Option<f32>,
    pub stroke_opacity: Option<f32>,
    pub stroke_linecap: Option<LineCap>,
    pub stroke_linejoin: Option<LineJoin>,
    pub stroke_miterlimit: Option<f32>,
    /// Empty for `none`
    pub stroke_dasharray: Option<Vec<f32>>,
    pub stroke_dashoffset: Option<f32>,
    pub color: Option<Color>,
    pub marker_start: Option<String>,
    pub marker_mid: Option<String>,
    pub marker_end: Option<String>,
    pub clip_rule: Option<FillRule>,
    pub visible: Option<bool>,
    // Not inherited
    pub opacity: Option<f32>,
    pub clip_path: Option<String>,
    pub display_none: bool,
}

fn parse_fill_rule(v: &str) -> Option<FillRule> {
    match v {
        "nonzero" => Some(FillRule::NonZero),
        "evenodd" => Some(FillRule::EvenOdd),
        _ => None,
    }
}

fn fill_rule_name(rule: FillRule) -> &'static str {
    match rule {
        FillRule::NonZero => "nonzero",
        FillRule::EvenOdd => "evenodd",
    }
}

fn parse_opacity(v: &str) -> Option<f32> {
    let v = v.trim();
    match v.strip_suffix('%') {
        Some(p) => parse_number(p).map(|n| (n / 100.0).clamp(0.0, 1.0)),
        None => parse_number(v).map(|n| n.clamp(0.0, 1.0)),
    }
}

fn parse_marker_ref(v: &str) -> Option<Option<String>> {
    if v.trim() == "none" {
        return Some(None);
    }
    parse_url_id(v).map(Some)
}

impl SvgStyle {
    /// Apply one presentation property by its attribute/CSS name
    pub fn set_property(&mut self, name: &str, value: &str) -> PropertyStatus {
        let value = value.trim();
        let ok = match name {
            "fill" => PaintValue::parse(value).map(|v| self.fill = Some(v)),
            "fill-opacity" => parse_opacity(value).map(|v| self.fill_opacity = Some(v)),
            "fill-rule" => parse_fill_rule(value).map(|v| self.fill_rule = Some(v)),
            "stroke" => PaintValue::parse(value).map(|v| self.stroke = Some(v)),
            "stroke-width" => parse_number(value.trim_end_matches("px"))
                .filter(|v| *v >= 0.0)
                .map(|v| self.stroke_width = Some(v)),
            "stroke-opacity" => parse_opacity(value).map(|v| self.stroke_opacity = Some(v)),
            "stroke-linecap" => match value {
                "butt" => Some(LineCap::Butt),
                "round" => Some(LineCap::Round),
                "square" => Some(LineCap::Square),
                _ => None,
            }
            .map(|v| self.stroke_linecap = Some(v)),
            "stroke-linejoin" => match value {
                "miter" => Some(LineJoin::Miter),
                "round" => Some(LineJoin::Round),
                "bevel" => Some(LineJoin::Bevel),
                _ => None,
            }
            .map(|v| self.stroke_linejoin = Some(v)),
            "stroke-miterlimit" => {
                parse_number(value).map(|v| self.stroke_miterlimit = Some(v.max(1.0)))
            }
            "stroke-dasharray" => {
                if value == "none" {
                    self.stroke_dasharray = Some(Vec::new());
                    Some(())
                } else {
                    parse_number_list(value)
                        .filter(|v| v.iter().all(|d| *d >= 0.0))
                        .map(|v| self.stroke_dasharray = Some(v))
                }
            }
            "stroke-dashoffset" => parse_number(value).map(|v| self.stroke_dashoffset = Some(v)),
            "color" => parse_color(value).map(|v| self.color = Some(v)),
            "opacity" => parse_opacity(value).map(|v| self.opacity = Some(v)),
            "clip-path" => {
                if value == "none" {
                    self.clip_path = None;
                    Some(())
                } else {
                    parse_url_id(value).map(|v| self.clip_path = Some(v))
                }
            }
            "clip-rule" => parse_fill_rule(value).map(|v| self.clip_rule = Some(v)),
            "marker-start" => parse_marker_ref(value).map(|v| self.marker_start = v),
            "marker-mid" => parse_marker_ref(value).map(|v| self.marker_mid = v),
            "marker-end" => parse_marker_ref(value).map(|v| self.marker_end = v),
            "marker" => parse_marker_ref(value).map(|v| {
                self.marker_start = v.clone();
                self.marker_mid = v.clone();
                self.marker_end = v;
            }),
            "display" => {
                self.display_none = value == "none";
                Some(())
            }
            "visibility" => match value {
                "visible" => Some(true),
                "hidden" | "collapse" => Some(false),
                _ => None,
            }
            .map(|v| self.visible = Some(v)),
            _ => return PropertyStatus::Unknown,
        };
        match ok {
            Some(()) => PropertyStatus::Applied,
            None => PropertyStatus::Invalid,
        }
    }

    /// Presentation attributes for the serializer, in a fixed order
    pub fn to_attributes(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let num = |v: f32| format_number(v);
        let marker = |m: &Option<String>| match m {
            Some(id) => format!("url(#{id})"),
            None => "none".to_string(),
        };
        if let Some(v) = &self.fill {
            out.push(("fill", v.to_attribute()));
        }
        if let Some(v) = self.fill_opacity {
            out.push(("fill-opacity", num(v)));
        }
        if let Some(v) = self.fill_rule {
            out.push(("fill-rule", fill_rule_name(v).to_string()));
        }
        if let Some(v) = &self.stroke {
            out.push(("stroke", v.to_attribute()));
        }
        if let Some(v) = self.stroke_width {
            out.push(("stroke-width", num(v)));
        }
        if let Some(v) = self.stroke_opacity {
            out.push(("stroke-opacity", num(v)));
        }
        if let Some(v) = self.stroke_linecap {
            let name = match v {
                LineCap::Butt => "butt",
                LineCap::Round => "round",
                LineCap::Square => "square",
            };
            out.push(("stroke-linecap", name.to_string()));
        }
        if let Some(v) = self.stroke_linejoin {
            let name = match v {
                LineJoin::Miter => "miter",
                LineJoin::Round => "round",
                LineJoin::Bevel => "bevel",
            };
            out.push(("stroke-linejoin", name.to_string()));
        }
        if let Some(v) = self.stroke_miterlimit {
            out.push(("stroke-miterlimit", num(v)));
        }
        if let Some(v) = &self.stroke_dasharray {
            let text = if v.is_empty() {
                "none".to_string()
            } else {
                v.iter().map(|d| num(*d)).collect::<Vec<_>>().join(" ")
            };
            out.push(("stroke-dasharray", text));
        }
        if let Some(v) = self.stroke_dashoffset {
            out.push(("stroke-dashoffset", num(v)));
        }
        if let Some(v) = &self.color {
            out.push(("color", format_color(v)));
        }
        if self.marker_start.is_some() {
            out.push(("marker-start", marker(&self.marker_start)));
        }
        if self.marker_mid.is_some() {
            out.push(("marker-mid", marker(&self.marker_mid)));
        }
        if self.marker_end.is_some() {
            out.push(("marker-end", marker(&self.marker_end)));
        }
        if let Some(v) = self.clip_rule {
            out.push(("clip-rule", fill_rule_name(v).to_string()));
        }
        if let Some(v) = self.visible {
            out.push(("visibility", if v { "visible" } else { "hidden" }.to_string()));
        }
        if let Some(v) = self.opacity {
            out.push(("opacity", num(v)));
        }
        if let Some(id) = &self.clip_path {
            out.push(("clip-path", format!("url(#{id})")));
        }
        if self.display_none {
            out.push(("display", "none".to_string()));
        }
        out
    }

    /// Inherit every unset property from `parent`
    pub fn resolve(&self, parent: &ResolvedStyle) -> ResolvedStyle {
        ResolvedStyle {
            fill: self.fill.clone().unwrap_or_else(|| parent.fill.clone()),
            fill_opacity: self.fill_opacity.unwrap_or(parent.fill_opacity),
            fill_rule: self.fill_rule.unwrap_or(parent.fill_rule),
            stroke: self.stroke.clone().unwrap_or_else(|| parent.stroke.clone()),
            stroke_width: self.stroke_width.unwrap_or(parent.stroke_width),
            stroke_opacity: self.stroke_opacity.unwrap_or(parent.stroke_opacity),
            stroke_linecap: self.stroke_linecap.unwrap_or(parent.stroke_linecap),
            stroke_linejoin: self.stroke_linejoin.unwrap_or(parent.stroke_linejoin),
            stroke_miterlimit: self.stroke_miterlimit.unwrap_or(parent.stroke_miterlimit),
            stroke_dasharray: self
                .stroke_dasharray
                .clone()
                .unwrap_or_else(|| parent.stroke_dasharray.clone()),
            stroke_dashoffset: self.stroke_dashoffset.unwrap_or(parent.stroke_dashoffset),
            color: self.color.unwrap_or(parent.color),
            marker_start: self.marker_start.clone().or_else(|| parent.marker_start.clone()),
            marker_mid: self.marker_mid.clone().or_else(|| parent.marker_mid.clone()),
            marker_end: self.marker_end.clone().or_else(|| parent.marker_end.clone()),
            clip_rule: self.clip_rule.unwrap_or(parent.clip_rule),
            visible: self.visible.unwrap_or(parent.visible),
            opacity: self.opacity.unwrap_or(1.0),
            clip_path: self.clip_path.clone(),
        }
    }
}

/// Fully inherited properties of one element
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub fill: PaintValue,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    pub stroke: PaintValue,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
    pub stroke_linecap: LineCap,
    pub stroke_linejoin: LineJoin,
    pub stroke_miterlimit: f32,
    pub stroke_dasharray: Vec<f32>,
    pub stroke_dashoffset: f32,
    pub color: Color,
    pub marker_start: Option<String>,
    pub marker_mid: Option<String>,
    pub marker_end: Option<String>,
    pub clip_rule: FillRule,
    pub visible: bool,
    pub opacity: f32,
    pub clip_path: Option<String>,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            fill: PaintValue::Color(Color::BLACK),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: PaintValue::None,
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            stroke_linecap: LineCap::Butt,
            stroke_linejoin: LineJoin::Miter,
            stroke_miterlimit: 4.0,
            stroke_dasharray: Vec::new(),
            stroke_dashoffset: 0.0,
            color: Color::BLACK,
            marker_start: None,
            marker_mid: None,
            marker_end: None,
            clip_rule: FillRule::NonZero,
            visible: true,
            opacity: 1.0,
            clip_path: None,
        }
    }
}

impl ResolvedStyle {
    pub fn stroke(&self) -> Stroke {
        let mut stroke = Stroke::new(self.stroke_width)
            .with_cap(self.stroke_linecap)
            .with_join(self.stroke_linejoin);
        stroke.miter_limit = self.stroke_miterlimit;
        if !self.stroke_dasharray.is_empty() {
            stroke = stroke.with_dash(self.stroke_dasharray.clone(), self.stroke_dashoffset);
        }
        stroke
    }

    pub fn has_markers(&self) -> bool {
        self.marker_start.is_some() || self.marker_mid.is_some() || self.marker_end.is_some()
    }
}

/// Split a `style="a: b; c: d"` attribute into trimmed declarations
pub fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let name = name.trim();
        (!name.is_empty()).then(|| (name, value.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_values() {
        assert_eq!(PaintValue::parse("none"), Some(PaintValue::None));
        assert_eq!(
            PaintValue::parse("url(#grad) red"),
            Some(PaintValue::Url {
                id: "grad".into(),
                fallback: Some(Color::RED)
            })
        );
        assert_eq!(
            PaintValue::parse("#00ff00"),
            Some(PaintValue::Color(Color::GREEN))
        );
        assert_eq!(PaintValue::parse("url(grad)"), None);
    }

    #[test]
    fn inheritance_skips_opacity_and_clip() {
        let mut parent_style = SvgStyle::default();
        parent_style.set_property("stroke", "blue");
        parent_style.set_property("opacity", "0.5");
        parent_style.set_property("clip-path", "url(#c)");
        let parent = parent_style.resolve(&ResolvedStyle::default());
        let child = SvgStyle::default().resolve(&parent);
        assert_eq!(child.stroke, PaintValue::Color(Color::BLUE));
        assert_eq!(child.opacity, 1.0);
        assert_eq!(child.clip_path, None);
        assert_eq!(child.fill, PaintValue::Color(Color::BLACK));
    }

    #[test]
    fn property_status() {
        let mut style = SvgStyle::default();
        assert_eq!(style.set_property("fill-rule", "evenodd"), PropertyStatus::Applied);
        assert_eq!(style.set_property("stroke-width", "-2"), PropertyStatus::Invalid);
        assert_eq!(style.set_property("font-family", "serif"), PropertyStatus::Unknown);
        assert_eq!(style.fill_rule, Some(FillRule::EvenOdd));
        assert_eq!(style.stroke_width, None);
    }

    #[test]
    fn declaration_split() {
        let decls: Vec<_> = declarations("fill: red; stroke:blue;;").collect();
        assert_eq!(decls, vec![("fill", "red"), ("stroke", "blue")]);
    }
}
