//! SVG reader: XML text to [`SvgTree`]
//!
//! The XML is read with `roxmltree`. Interpreted elements become typed nodes;
//! anything else is kept as an opaque node holding its source text. Values
//! that cannot be read are logged and skipped, so a document with a few bad
//! attributes still loads with everything that was readable.

use lumen_core::parse::{parse_length, parse_number, parse_number_list, parse_transform};
use lumen_core::{
    Color, GradientSpread, GradientStop, GradientUnits, LengthValue, Point, Rect, Size,
    UnitContext,
};
use tracing::{debug, warn};

use crate::error::{Result, SvgError};
use crate::path_data::parse_path_data;
use crate::style::{declarations, PropertyStatus};
use crate::tree::{
    AspectRatio, GradientDef, MarkerDef, MarkerOrient, MarkerUnits, SvgKind, SvgNode, SvgNodeId,
    SvgTree,
};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Axis a percentage length refers to
#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    Diagonal,
}

struct Reader<'a> {
    text: &'a str,
    viewport: Size,
}

/// Parse SVG text into a node tree
pub fn read_svg(text: &str) -> Result<SvgTree> {
    let doc = roxmltree::Document::parse(text).map_err(|e| SvgError::Parse(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(SvgError::Parse(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let mut reader = Reader {
        text,
        viewport: Size::new(100.0, 100.0),
    };
    let view_box = root.attribute("viewBox").and_then(parse_view_box);
    let width = root.attribute("width").and_then(|v| reader.absolute(v));
    let height = root.attribute("height").and_then(|v| reader.absolute(v));
    let aspect = match root.attribute("preserveAspectRatio") {
        Some(v) if v.trim() == "none" => AspectRatio::Stretch,
        _ => AspectRatio::Meet,
    };

    let mut tree = SvgTree::new(width, height, view_box);
    reader.viewport = view_box.map(|vb| vb.size).unwrap_or_else(|| tree.size());
    let root_id = tree.root();
    if let Some(node) = tree.get_mut(root_id) {
        if let SvgKind::Svg {
            aspect: ref mut a, ..
        } = node.kind
        {
            *a = aspect;
        }
        for ns in root.namespaces() {
            match ns.name() {
                Some(prefix) if prefix != "xml" => {
                    node.extra.insert(format!("xmlns:{prefix}"), ns.uri().to_string());
                }
                _ => {}
            }
        }
        reader.read_common(
            root,
            node,
            &["width", "height", "viewBox", "preserveAspectRatio", "version"],
        );
    }
    reader.read_children(root, root_id, &mut tree)?;
    Ok(tree)
}

fn parse_view_box(v: &str) -> Option<Rect> {
    match parse_number_list(v)?.as_slice() {
        &[x, y, w, h] if w >= 0.0 && h >= 0.0 => Some(Rect::new(x, y, w, h)),
        _ => {
            warn!(value = v, "invalid viewBox");
            None
        }
    }
}

fn is_svg_element(node: &roxmltree::Node) -> bool {
    matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

/// `prefix:name` for namespaced attributes, `name` otherwise
fn qualified_name(node: &roxmltree::Node, attr: &roxmltree::Attribute) -> String {
    match attr.namespace() {
        None => attr.name().to_string(),
        Some(XML_NS) => format!("xml:{}", attr.name()),
        Some(uri) => match node
            .namespaces()
            .find(|ns| ns.uri() == uri)
            .and_then(|ns| ns.name())
        {
            Some(prefix) => format!("{prefix}:{}", attr.name()),
            None => attr.name().to_string(),
        },
    }
}

impl<'a> Reader<'a> {
    /// A length in user units; percentages resolve against the viewport
    fn length(&self, v: &str, axis: Axis) -> Option<f32> {
        match parse_length(v)? {
            LengthValue::Length(l) => Some(UnitContext::default().to_dots(l.value, l.unit)),
            LengthValue::Percent(p) => {
                let base = match axis {
                    Axis::X => self.viewport.width,
                    Axis::Y => self.viewport.height,
                    Axis::Diagonal => {
                        (self.viewport.width.powi(2) + self.viewport.height.powi(2)).sqrt()
                            / std::f32::consts::SQRT_2
                    }
                };
                Some(p / 100.0 * base)
            }
        }
    }

    /// Root width/height: percentages mean "fit the viewport", left unset
    fn absolute(&self, v: &str) -> Option<f32> {
        match parse_length(v)? {
            LengthValue::Length(l) => Some(UnitContext::default().to_dots(l.value, l.unit)),
            LengthValue::Percent(_) => None,
        }
    }

    fn attr_length(&self, node: &roxmltree::Node, name: &str, axis: Axis) -> f32 {
        match node.attribute(name) {
            Some(v) => self.length(v, axis).unwrap_or_else(|| {
                warn!(element = node.tag_name().name(), attribute = name, value = v, "invalid length");
                0.0
            }),
            None => 0.0,
        }
    }

    /// id, transform, style and presentation attributes; everything not
    /// interpreted and not in `consumed` is kept in `extra`
    fn read_common(&self, xml: roxmltree::Node, node: &mut SvgNode, consumed: &[&str]) {
        let mut style_attr = None;
        for attr in xml.attributes() {
            let name = qualified_name(&xml, &attr);
            if consumed.contains(&name.as_str()) {
                continue;
            }
            match name.as_str() {
                "id" => node.id = Some(attr.value().to_string()),
                "style" => style_attr = Some(attr.value()),
                "transform" => match parse_transform(attr.value()) {
                    Some(t) => node.transform = Some(t),
                    None => warn!(value = attr.value(), "invalid transform ignored"),
                },
                _ => self.apply_property(node, &name, attr.value()),
            }
        }
        // Declarations in `style` override presentation attributes
        if let Some(style) = style_attr {
            for (name, value) in declarations(style) {
                self.apply_property(node, name, value);
            }
        }
    }

    fn apply_property(&self, node: &mut SvgNode, name: &str, value: &str) {
        match node.style.set_property(name, value) {
            PropertyStatus::Applied => {}
            PropertyStatus::Unknown => {
                node.extra.insert(name.to_string(), value.to_string());
            }
            PropertyStatus::Invalid => {
                warn!(property = name, value, "invalid presentation value ignored")
            }
        }
    }

    fn read_children(
        &mut self,
        xml: roxmltree::Node,
        parent: SvgNodeId,
        tree: &mut SvgTree,
    ) -> Result<()> {
        for child in xml.children().filter(|c| c.is_element()) {
            let node = self.read_element(child);
            let recurse = matches!(
                node.kind,
                SvgKind::Group | SvgKind::Defs | SvgKind::ClipPath { .. } | SvgKind::Marker(_)
            );
            let id = tree.append(parent, node)?;
            if recurse {
                self.read_children(child, id, tree)?;
            }
        }
        Ok(())
    }

    fn read_element(&self, xml: roxmltree::Node) -> SvgNode {
        let tag = xml.tag_name().name();
        let len = |name: &str, axis: Axis| self.attr_length(&xml, name, axis);
        let (kind, consumed): (SvgKind, &[&str]) = if !is_svg_element(&xml) {
            (self.opaque(&xml), &[])
        } else {
            match tag {
                "g" => (SvgKind::Group, &[]),
                "defs" => (SvgKind::Defs, &[]),
                "rect" => (
                    SvgKind::Rect {
                        rect: Rect::new(
                            len("x", Axis::X),
                            len("y", Axis::Y),
                            len("width", Axis::X),
                            len("height", Axis::Y),
                        ),
                        rx: len("rx", Axis::X),
                        ry: len("ry", Axis::Y),
                    },
                    &["x", "y", "width", "height", "rx", "ry"],
                ),
                "circle" => (
                    SvgKind::Circle {
                        center: Point::new(len("cx", Axis::X), len("cy", Axis::Y)),
                        r: len("r", Axis::Diagonal),
                    },
                    &["cx", "cy", "r"],
                ),
                "ellipse" => (
                    SvgKind::Ellipse {
                        center: Point::new(len("cx", Axis::X), len("cy", Axis::Y)),
                        rx: len("rx", Axis::X),
                        ry: len("ry", Axis::Y),
                    },
                    &["cx", "cy", "rx", "ry"],
                ),
                "line" => (
                    SvgKind::Line {
                        from: Point::new(len("x1", Axis::X), len("y1", Axis::Y)),
                        to: Point::new(len("x2", Axis::X), len("y2", Axis::Y)),
                    },
                    &["x1", "y1", "x2", "y2"],
                ),
                "polyline" => (SvgKind::Polyline(read_points(&xml)), &["points"]),
                "polygon" => (SvgKind::Polygon(read_points(&xml)), &["points"]),
                "path" => {
                    let d = xml.attribute("d").unwrap_or("");
                    let path = parse_path_data(d).unwrap_or_else(|err| {
                        warn!(offset = err.offset, "path data truncated at first error");
                        err.partial
                    });
                    (SvgKind::Path(path), &["d"])
                }
                "linearGradient" => (
                    SvgKind::LinearGradient(self.read_gradient(&xml)),
                    GRADIENT_ATTRIBUTES,
                ),
                "radialGradient" => (
                    SvgKind::RadialGradient(self.read_gradient(&xml)),
                    GRADIENT_ATTRIBUTES,
                ),
                "clipPath" => (
                    SvgKind::ClipPath {
                        units: match xml.attribute("clipPathUnits") {
                            Some("objectBoundingBox") => GradientUnits::ObjectBoundingBox,
                            _ => GradientUnits::UserSpaceOnUse,
                        },
                    },
                    &["clipPathUnits"],
                ),
                "marker" => (
                    SvgKind::Marker(self.read_marker(&xml)),
                    &[
                        "refX",
                        "refY",
                        "markerWidth",
                        "markerHeight",
                        "markerUnits",
                        "orient",
                        "viewBox",
                    ],
                ),
                "use" => {
                    let href = xml
                        .attributes()
                        .find(|a| a.name() == "href")
                        .map(|a| a.value().trim_start_matches('#').to_string())
                        .unwrap_or_default();
                    (
                        SvgKind::Use {
                            href,
                            x: len("x", Axis::X),
                            y: len("y", Axis::Y),
                        },
                        &["href", "xlink:href", "x", "y"],
                    )
                }
                _ => (self.opaque(&xml), &[]),
            }
        };

        let mut node = SvgNode::new(kind);
        if !matches!(node.kind, SvgKind::Opaque { .. }) {
            self.read_common(xml, &mut node, consumed);
        }
        node
    }

    fn opaque(&self, xml: &roxmltree::Node) -> SvgKind {
        debug!(tag = xml.tag_name().name(), "keeping element as opaque source");
        SvgKind::Opaque {
            tag: xml.tag_name().name().to_string(),
            source: self.text[xml.range()].to_string(),
        }
    }

    fn read_gradient(&self, xml: &roxmltree::Node) -> GradientDef {
        let coord = |name: &str| {
            let v = xml.attribute(name)?;
            match parse_length(v) {
                Some(LengthValue::Percent(p)) => Some(p / 100.0),
                Some(LengthValue::Length(l)) => Some(l.value),
                None => {
                    warn!(attribute = name, value = v, "invalid gradient coordinate");
                    None
                }
            }
        };
        GradientDef {
            x1: coord("x1"),
            y1: coord("y1"),
            x2: coord("x2"),
            y2: coord("y2"),
            cx: coord("cx"),
            cy: coord("cy"),
            r: coord("r"),
            fx: coord("fx"),
            fy: coord("fy"),
            units: xml.attribute("gradientUnits").and_then(|v| match v {
                "userSpaceOnUse" => Some(GradientUnits::UserSpaceOnUse),
                "objectBoundingBox" => Some(GradientUnits::ObjectBoundingBox),
                _ => None,
            }),
            spread: xml.attribute("spreadMethod").and_then(|v| match v {
                "pad" => Some(GradientSpread::Pad),
                "reflect" => Some(GradientSpread::Reflect),
                "repeat" => Some(GradientSpread::Repeat),
                _ => None,
            }),
            transform: xml.attribute("gradientTransform").and_then(parse_transform),
            stops: read_stops(xml),
            href: xml
                .attributes()
                .find(|a| a.name() == "href")
                .map(|a| a.value().trim_start_matches('#').to_string()),
        }
    }

    fn read_marker(&self, xml: &roxmltree::Node) -> MarkerDef {
        let num = |name: &str, default: f32| {
            xml.attribute(name)
                .and_then(|v| self.length(v, Axis::X))
                .unwrap_or(default)
        };
        let defaults = MarkerDef::default();
        MarkerDef {
            ref_x: num("refX", defaults.ref_x),
            ref_y: num("refY", defaults.ref_y),
            width: num("markerWidth", defaults.width),
            height: num("markerHeight", defaults.height),
            units: match xml.attribute("markerUnits") {
                Some("userSpaceOnUse") => MarkerUnits::UserSpaceOnUse,
                _ => MarkerUnits::StrokeWidth,
            },
            orient: match xml.attribute("orient").map(str::trim) {
                Some("auto") => MarkerOrient::Auto,
                Some("auto-start-reverse") => MarkerOrient::AutoStartReverse,
                Some(v) => parse_number(v.trim_end_matches("deg"))
                    .map_or(MarkerOrient::Zero, MarkerOrient::Angle),
                None => MarkerOrient::Zero,
            },
            view_box: xml.attribute("viewBox").and_then(parse_view_box),
        }
    }
}

const GRADIENT_ATTRIBUTES: &[&str] = &[
    "x1",
    "y1",
    "x2",
    "y2",
    "cx",
    "cy",
    "r",
    "fx",
    "fy",
    "gradientUnits",
    "spreadMethod",
    "gradientTransform",
    "href",
    "xlink:href",
];

fn read_points(xml: &roxmltree::Node) -> Vec<Point> {
    let Some(values) = xml.attribute("points").and_then(parse_number_list) else {
        return Vec::new();
    };
    if values.len() % 2 != 0 {
        warn!("odd coordinate count in points; last value dropped");
    }
    values
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

fn read_stops(xml: &roxmltree::Node) -> Vec<GradientStop> {
    let mut stops = Vec::new();
    let mut last = 0.0f32;
    for stop in xml
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "stop")
    {
        let offset = match stop.attribute("offset").map(str::trim) {
            Some(v) => match v.strip_suffix('%') {
                Some(p) => parse_number(p).map(|n| n / 100.0),
                None => parse_number(v),
            }
            .unwrap_or(0.0),
            None => 0.0,
        };
        let mut color = stop.attribute("stop-color");
        let mut opacity = stop.attribute("stop-opacity");
        if let Some(style) = stop.attribute("style") {
            for (name, value) in declarations(style) {
                match name {
                    "stop-color" => color = Some(value),
                    "stop-opacity" => opacity = Some(value),
                    _ => {}
                }
            }
        }
        let color = color
            .and_then(lumen_core::parse::parse_color)
            .unwrap_or(Color::BLACK);
        let opacity = opacity
            .and_then(parse_number)
            .map_or(1.0, |o| o.clamp(0.0, 1.0));
        let offset = offset.clamp(0.0, 1.0).max(last);
        last = offset;
        stops.push(GradientStop::new(offset, color.with_alpha(color.a * opacity)));
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PaintValue;
    use lumen_core::PathCommand;

    #[test]
    fn reads_shapes_and_style() {
        let tree = read_svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 20 10">
                <g id="layer" transform="translate(1 2)" style="fill: red; stroke-width: 2">
                    <rect x="1" y="1" width="5" height="5" rx="1"/>
                    <path d="M0 0 L5 5 Z" fill="none" stroke="#0000ff"/>
                </g>
            </svg>"##,
        )
        .unwrap();
        assert_eq!(tree.size(), Size::new(200.0, 100.0));
        let g = tree.find("layer").unwrap();
        let group = tree.get(g).unwrap();
        assert_eq!(group.style.fill, Some(PaintValue::Color(Color::RED)));
        assert_eq!(group.style.stroke_width, Some(2.0));
        assert!(group.transform.is_some());

        let children = tree.children(g);
        assert_eq!(children.len(), 2);
        match &tree.get(children[1]).unwrap().kind {
            SvgKind::Path(p) => assert_eq!(p.commands().last(), Some(&PathCommand::Close)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_elements_are_opaque() {
        let tree = read_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><foreignObject width="5"><p>hi</p></foreignObject></svg>"#,
        )
        .unwrap();
        let child = tree.children(tree.root())[0];
        match &tree.get(child).unwrap().kind {
            SvgKind::Opaque { tag, source } => {
                assert_eq!(tag, "foreignObject");
                assert_eq!(source, r#"<foreignObject width="5"><p>hi</p></foreignObject>"#);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gradient_stops_and_href() {
        let tree = read_svg(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
                <linearGradient id="a" x2="100%">
                    <stop offset="0" stop-color="white"/>
                    <stop offset="50%" style="stop-color: black; stop-opacity: 0.5"/>
                </linearGradient>
                <linearGradient id="b" xlink:href="#a"/>
            </svg>"##,
        )
        .unwrap();
        let a = tree.get(tree.find("a").unwrap()).unwrap();
        let SvgKind::LinearGradient(def) = &a.kind else {
            panic!("not a gradient");
        };
        assert_eq!(def.x2, Some(1.0));
        assert_eq!(def.stops[1].offset, 0.5);
        assert_eq!(def.stops[1].color.a, 0.5);
        let b = tree.get(tree.find("b").unwrap()).unwrap();
        let SvgKind::LinearGradient(def) = &b.kind else {
            panic!("not a gradient");
        };
        assert_eq!(def.href.as_deref(), Some("a"));
        assert_eq!(tree.resolve_gradient("b").unwrap().stops.len(), 2);
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(matches!(read_svg("<svg><g></svg>"), Err(SvgError::Parse(_))));
        assert!(matches!(read_svg("<html/>"), Err(SvgError::Parse(_))));
    }

    #[test]
    fn bad_values_are_skipped() {
        let tree = read_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L10 10 L" fill="bogus"/></svg>"#,
        )
        .unwrap();
        let node = tree.get(tree.children(tree.root())[0]).unwrap();
        assert_eq!(node.style.fill, None);
        match &node.kind {
            SvgKind::Path(p) => assert_eq!(p.commands().len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
