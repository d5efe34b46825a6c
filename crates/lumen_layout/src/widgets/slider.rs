//! Horizontal slider
//!
//! Pressing the track does not move the value; sliding does, by the pointer
//! distance relative to the track width. The value is committed with
//! `Change` when the slide stops.

use lumen_core::{Color, Key, Length, Point, Size, Stroke};
use lumen_platform::Cursor;

use crate::events::EventType;
use crate::flags::Abilities;
use crate::widget::{MeasureCx, RenderCx, Widget, WidgetMut};

/// Default track length in em
const TRACK_EM: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub value: f32,
    /// Keyboard increment
    pub step: f32,
    /// Thumb diameter in dp
    pub thumb: f32,
    slide_from: f32,
}

impl Slider {
    pub fn new(min: f32, max: f32, value: f32) -> Self {
        Self {
            min,
            max,
            value: value.clamp(min, max),
            step: (max - min) / 100.0,
            thumb: 20.0,
            slide_from: value,
        }
    }

    pub fn set_value(&mut self, value: f32) -> bool {
        let v = value.clamp(self.min.min(self.max), self.max.max(self.min));
        let changed = (v - self.value).abs() > f32::EPSILON;
        self.value = v;
        changed
    }

    /// Position of the value along the track, 0 to 1
    pub fn fraction(&self) -> f32 {
        let range = self.max - self.min;
        if range.abs() <= f32::EPSILON {
            0.0
        } else {
            (self.value - self.min) / range
        }
    }

    fn range(&self) -> f32 {
        self.max - self.min
    }
}

impl Widget for Slider {
    fn type_name(&self) -> &'static str {
        "slider"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::SLIDEABLE | Abilities::FOCUSABLE | Abilities::HOVERABLE);
        let thumb = self.thumb;
        w.styler(move |s| {
            s.cursor = Cursor::Grab;
            s.min.y = Length::dp(thumb);
            s.state_color = Color::from_hex(0x1e88e5);
        });
        w.on(EventType::SlideStart, |cx, ev| {
            if let Some(s) = cx.widget_mut::<Slider>() {
                s.slide_from = s.value;
            }
            ev.set_handled();
        });
        w.on(EventType::SlideMove, |cx, ev| {
            let width = cx.geom().map_or(0.0, |g| g.content.width());
            if width <= 0.0 {
                return;
            }
            let changed = cx.widget_mut::<Slider>().is_some_and(|s| {
                let target = s.slide_from + ev.delta.x / width * s.range();
                s.set_value(target)
            });
            if changed {
                cx.send(EventType::Input, ev.time);
                cx.needs_render();
            }
            ev.set_handled();
        });
        w.on(EventType::SlideStop, |cx, ev| {
            cx.send(EventType::Change, ev.time);
            ev.set_handled();
        });
        w.on(EventType::KeyDown, |cx, ev| {
            let Some(chord) = ev.chord else {
                return;
            };
            let dir = match chord.key {
                Key::Left | Key::Down => -1.0,
                Key::Right | Key::Up => 1.0,
                _ => return,
            };
            let changed = cx
                .widget_mut::<Slider>()
                .is_some_and(|s| s.set_value(s.value + dir * s.step));
            if changed {
                cx.send(EventType::Change, ev.time);
                cx.needs_render();
            }
            ev.set_handled();
        });
    }

    fn content_size(&self, cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        Size::new(cx.style.font_size() * TRACK_EM, self.thumb)
    }

    fn render(&self, cx: &mut RenderCx<'_, '_>) {
        let c = cx.geom.content;
        let r = (self.thumb / 2.0).min(c.height() / 2.0);
        let mid = c.y() + c.height() / 2.0;
        let x = c.x() + r + (c.width() - 2.0 * r).max(0.0) * self.fraction();
        let track = Stroke::new(4.0);
        let accent = cx.style.state_color;
        cx.paint.draw_line(
            Point::new(c.x() + r, mid),
            Point::new(c.max_x() - r, mid),
            &track,
            &Color::GRAY.into(),
        );
        cx.paint.draw_line(Point::new(c.x() + r, mid), Point::new(x, mid), &track, &accent.into());
        cx.paint.fill_ellipse(Point::new(x, mid), r, r, &accent.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_clamps_to_range() {
        let mut s = Slider::new(0.0, 100.0, 150.0);
        assert_eq!(s.value, 100.0);
        assert!(s.set_value(-5.0));
        assert_eq!(s.value, 0.0);
        assert!(!s.set_value(0.0));
        s.set_value(25.0);
        assert!((s.fraction() - 0.25).abs() < 1e-6);
    }
}
