//! Brush to shader conversion
//!
//! Gradient coordinates are handed to the rasterizer in gradient space; the
//! shader transform maps them to user space (bounding-box units first, then
//! the gradient's own transform). The draw call's transform then maps user
//! space to device space for both the geometry and the shader.

use lumen_core::{Brush, Color, Gradient, GradientKind, GradientSpread, Rect};
use tracing::trace;

use crate::path::to_skia_transform;

pub fn to_skia_color(color: &Color, opacity: f32) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        (color.a * opacity).clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::TRANSPARENT)
}

fn to_skia_spread(spread: GradientSpread) -> tiny_skia::SpreadMode {
    match spread {
        GradientSpread::Pad => tiny_skia::SpreadMode::Pad,
        GradientSpread::Reflect => tiny_skia::SpreadMode::Reflect,
        GradientSpread::Repeat => tiny_skia::SpreadMode::Repeat,
    }
}

/// Build a shader for `gradient` painted on a shape with user-space `bbox`
pub fn gradient_shader(
    gradient: &Gradient,
    bbox: &Rect,
    opacity: f32,
) -> Option<tiny_skia::Shader<'static>> {
    if gradient.stops.is_empty() {
        return None;
    }
    if gradient.stops.len() == 1 {
        return Some(tiny_skia::Shader::SolidColor(to_skia_color(
            &gradient.stops[0].color,
            opacity,
        )));
    }
    let stops: Vec<tiny_skia::GradientStop> = gradient
        .stops
        .iter()
        .map(|s| tiny_skia::GradientStop::new(s.offset, to_skia_color(&s.color, opacity)))
        .collect();
    let transform = to_skia_transform(&gradient.to_user_space(bbox));
    let spread = to_skia_spread(gradient.spread);
    let shader = match gradient.kind {
        GradientKind::Linear { start, end } => tiny_skia::LinearGradient::new(
            tiny_skia::Point::from_xy(start.x, start.y),
            tiny_skia::Point::from_xy(end.x, end.y),
            stops,
            spread,
            transform,
        ),
        GradientKind::Radial {
            center,
            radius,
            focal,
        } => {
            let focal = focal.unwrap_or(center);
            tiny_skia::RadialGradient::new(
                tiny_skia::Point::from_xy(focal.x, focal.y),
                tiny_skia::Point::from_xy(center.x, center.y),
                radius,
                stops,
                spread,
                transform,
            )
        }
    };
    if shader.is_none() {
        // Degenerate geometry (zero-length vector or zero-size bbox) paints the last stop
        trace!("degenerate gradient, painting last stop");
        return gradient.stops.last().map(|s| {
            tiny_skia::Shader::SolidColor(to_skia_color(&s.color, opacity))
        });
    }
    shader
}

/// Build a paint for `brush` on a shape with user-space `bbox`
pub fn brush_paint(brush: &Brush, bbox: &Rect, opacity: f32) -> Option<tiny_skia::Paint<'static>> {
    let shader = match brush {
        Brush::Solid(color) => {
            if color.a * opacity <= 0.0 {
                return None;
            }
            tiny_skia::Shader::SolidColor(to_skia_color(color, opacity))
        }
        Brush::Gradient(g) => gradient_shader(g, bbox, opacity)?,
    };
    Some(tiny_skia::Paint {
        shader,
        anti_alias: true,
        ..tiny_skia::Paint::default()
    })
}
