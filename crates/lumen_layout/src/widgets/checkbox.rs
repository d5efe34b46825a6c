//! Checkbox with an optional label
//!
//! The box is drawn as the widget's own content; the label is a part placed
//! to its right. Toggling sets [`StateFlags::CHECKED`] and sends `Change`.

use lumen_core::{Color, CornerRadius, Length, Path, Rect, Sides, Size, Stroke};

use crate::error::Result;
use crate::events::EventType;
use crate::flags::{Abilities, StateFlags};
use crate::widget::{MeasureCx, RenderCx, Widget, WidgetMut};
use crate::widgets::text::Text;

/// Box size in em
const BOX_EM: f32 = 1.2;
/// Space between box and label in em
const GAP_EM: f32 = 0.5;

pub struct Checkbox {
    label: Option<String>,
    checked: bool,
}

impl Checkbox {
    pub fn new(checked: bool) -> Self {
        Self {
            label: None,
            checked,
        }
    }

    pub fn labeled(label: impl Into<String>, checked: bool) -> Self {
        Self {
            label: Some(label.into()),
            checked,
        }
    }
}

impl Widget for Checkbox {
    fn type_name(&self) -> &'static str {
        "checkbox"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::CHECKABLE | Abilities::FOCUSABLE | Abilities::HOVERABLE);
        w.set_state(StateFlags::CHECKED, self.checked);
        w.styler(|s| {
            s.set_padding(Length::dp(2.0));
            s.state_color = Color::from_hex(0x1e88e5);
        });
        w.on(EventType::Click, |cx, ev| {
            if cx.is(StateFlags::READ_ONLY) {
                return;
            }
            let on = !cx.is(StateFlags::CHECKED);
            cx.set_state(StateFlags::CHECKED, on);
            cx.send(EventType::Change, ev.time);
            ev.set_handled();
        });
    }

    fn config(&mut self, w: &mut WidgetMut<'_>) -> Result<()> {
        let Some(label) = &self.label else {
            return Ok(());
        };
        if w.part("label").is_none() {
            w.add_part("label", Text::new(label.clone()))?;
            w.parts_styler(|s| {
                s.padding = Sides::new(
                    Length::ZERO,
                    Length::ZERO,
                    Length::ZERO,
                    Length::em(BOX_EM + GAP_EM),
                );
            })?;
        }
        Ok(())
    }

    fn content_size(&self, cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        let side = cx.style.font_size() * BOX_EM;
        Size::new(side, side)
    }

    fn render(&self, cx: &mut RenderCx<'_, '_>) {
        let side = cx.style.font_size() * BOX_EM;
        let content = cx.geom.content;
        let y = content.y() + ((content.height() - side) / 2.0).max(0.0);
        let bx = Rect::new(content.x(), y, side, side);
        let radius = CornerRadius::uniform(side * 0.15);
        let accent = cx.style.state_color;
        if cx.state.contains(StateFlags::CHECKED) {
            cx.paint.fill_rounded_rect(bx, radius, &accent.into());
            let check = Path::new()
                .move_to(bx.x() + side * 0.22, bx.y() + side * 0.52)
                .line_to(bx.x() + side * 0.42, bx.y() + side * 0.72)
                .line_to(bx.x() + side * 0.78, bx.y() + side * 0.30);
            cx.paint
                .stroke_path(&check, &Stroke::new(side * 0.12), &Color::WHITE.into());
        } else {
            cx.paint
                .stroke_rounded_rect(bx, radius, &Stroke::new(side * 0.08), &cx.style.color.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SceneTree;

    #[test]
    fn initial_state_and_label_part() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let cb = tree.add(root, "cb", Checkbox::labeled("Remember me", true)).unwrap();
        let node = tree.get(cb).unwrap();
        assert!(node.is(StateFlags::CHECKED));
        assert!(node.can(Abilities::CHECKABLE));
        let parts = node.parts.unwrap();
        assert!(tree.child_by_name(parts, "label", None).is_some());
    }
}
