//! Single-line text entry
//!
//! Editing keys go to the focused field. Ctrl+C, Ctrl+X and Ctrl+V use the
//! scene clipboard for the whole text; there is no selection model.

use lumen_core::{Color, Key, Length, Point, Size, Stroke};
use lumen_paint::TextRun;
use lumen_platform::Cursor;

use crate::events::{Event, EventCx, EventType};
use crate::flags::{Abilities, StateFlags};
use crate::text::TextLayoutOptions;
use crate::widget::{MeasureCx, RenderCx, Widget, WidgetMut};

/// Minimum width in em
const MIN_EM: f32 = 12.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextField {
    text: String,
    placeholder: String,
    /// Cursor position in chars
    cursor: usize,
}

impl TextField {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            text,
            placeholder: String::new(),
            cursor,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    fn byte_at(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, s: &str) {
        let at = self.byte_at(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the char before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
        true
    }

    /// Delete the char after the cursor
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.chars().count() {
            return false;
        }
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
        true
    }

    /// Apply one key press; returns whether the text changed
    fn edit(&mut self, key: Key, text: Option<char>) -> bool {
        let len = self.text.chars().count();
        match key {
            Key::Backspace => self.backspace(),
            Key::Delete => self.delete(),
            Key::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            Key::Right => {
                self.cursor = (self.cursor + 1).min(len);
                false
            }
            Key::Home => {
                self.cursor = 0;
                false
            }
            Key::End => {
                self.cursor = len;
                false
            }
            _ => match text {
                Some(c) if !c.is_control() => {
                    let mut buf = [0u8; 4];
                    self.insert(c.encode_utf8(&mut buf));
                    true
                }
                _ => false,
            },
        }
    }
}

fn on_key(cx: &mut EventCx<'_>, ev: &mut Event) {
    let Some(chord) = ev.chord else {
        return;
    };
    let read_only = cx.is(StateFlags::READ_ONLY);
    if chord.modifiers.ctrl || chord.modifiers.meta {
        let Key::Char(c) = chord.key else {
            return;
        };
        match c.to_ascii_lowercase() {
            'c' => {
                if let Some(text) = cx.widget::<TextField>().map(|f| f.text.clone()) {
                    cx.clipboard().write_text(&text);
                }
            }
            'x' if !read_only => {
                let text = cx.widget_mut::<TextField>().map(|f| {
                    let t = std::mem::take(&mut f.text);
                    f.cursor = 0;
                    t
                });
                if let Some(text) = text {
                    cx.clipboard().write_text(&text);
                    cx.send(EventType::Input, ev.time);
                }
            }
            'v' if !read_only => {
                let Some(paste) = cx.clipboard().read_text() else {
                    return;
                };
                let line = paste.lines().next().unwrap_or_default().to_string();
                if let Some(f) = cx.widget_mut::<TextField>() {
                    f.insert(&line);
                }
                cx.send(EventType::Input, ev.time);
            }
            _ => return,
        }
        ev.set_handled();
        cx.needs_layout();
        return;
    }
    if chord.key == Key::Enter {
        cx.send(EventType::Change, ev.time);
        ev.set_handled();
        return;
    }
    if read_only {
        return;
    }
    let before = cx.widget::<TextField>().map(|f| f.cursor);
    let changed = cx
        .widget_mut::<TextField>()
        .is_some_and(|f| f.edit(chord.key, ev.text));
    let moved = cx.widget::<TextField>().map(|f| f.cursor) != before;
    if changed {
        cx.send(EventType::Input, ev.time);
        cx.needs_layout();
    }
    if changed || moved {
        cx.needs_render();
        ev.set_handled();
    }
}

impl Widget for TextField {
    fn type_name(&self) -> &'static str {
        "text-field"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::FOCUSABLE | Abilities::HOVERABLE);
        w.styler(|s| {
            s.set_padding(Length::dp(6.0));
            s.set_border(Length::dp(1.0), Color::GRAY);
            s.border.radius = Length::dp(4.0);
            s.cursor = Cursor::Text;
            s.set_background(Color::WHITE);
        });
        w.on(EventType::KeyDown, on_key);
        w.on(EventType::DeFocus, |cx, ev| {
            cx.send(EventType::Change, ev.time);
        });
    }

    fn content_size(&self, cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        let size = cx.style.font_size();
        let opts = TextLayoutOptions::from_style(cx.style);
        let m = cx.measurer.measure_line(&self.text, size, &opts);
        Size::new(m.width.max(size * MIN_EM), size * cx.style.font.line_height)
    }

    fn render(&self, cx: &mut RenderCx<'_, '_>) {
        let c = cx.geom.content;
        let size = cx.style.font_size();
        let line_height = size * cx.style.font.line_height;
        let (text, color) = if self.text.is_empty() {
            (self.placeholder.clone(), cx.style.color.mul_alpha(0.5))
        } else {
            (self.text.clone(), cx.style.color)
        };
        cx.paint.draw_text(&TextRun {
            text,
            origin: c.origin,
            font_size: size,
            line_height,
            family: cx.style.font.family.clone(),
            weight: cx.style.font.weight,
            color,
        });
        if cx.state.contains(StateFlags::FOCUSED) {
            let opts = TextLayoutOptions::from_style(cx.style);
            let before: String = self.text.chars().take(self.cursor).collect();
            let x = c.x() + cx.measurer.measure_line(&before, size, &opts).width;
            cx.paint.draw_line(
                Point::new(x, c.y()),
                Point::new(x, c.y() + line_height),
                &Stroke::new(1.5),
                &cx.style.color.into(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_keys() {
        let mut f = TextField::new("héllo");
        assert_eq!(f.cursor(), 5);
        assert!(f.edit(Key::Backspace, None));
        assert_eq!(f.text(), "héll");
        f.edit(Key::Home, None);
        assert!(!f.edit(Key::Backspace, None));
        f.edit(Key::Right, None);
        assert!(f.edit(Key::Char('x'), Some('x')));
        assert_eq!(f.text(), "hxéll");
        assert!(f.edit(Key::Delete, None));
        assert_eq!(f.text(), "hxll");
        assert!(!f.edit(Key::Char('\u{8}'), Some('\u{8}')));
    }
}
