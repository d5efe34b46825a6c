//! Push button with an optional icon and a label
//!
//! The icon and the label live in the button's parts, so clicking either one
//! clicks the button.
//!
//! # Example
//!
//! ```ignore
//! let ok = tree.add(root, "ok", Button::new("OK").on_click(|cx, _| cx.request(SceneRequest::Close)))?;
//! ```

use std::rc::Rc;

use lumen_core::{Color, Length};
use lumen_platform::Cursor;

use crate::error::Result;
use crate::events::{Event, EventCx, EventType, Listener};
use crate::flags::Abilities;
use crate::style::{Align, Style};
use crate::widget::{Widget, WidgetMut};
use crate::widgets::svg_view::SvgView;
use crate::widgets::text::Text;

pub struct Button {
    label: String,
    icon: Option<String>,
    on_click: Option<Listener>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            on_click: None,
        }
    }

    /// Show an SVG icon before the label
    pub fn with_icon(mut self, svg: impl Into<String>) -> Self {
        self.icon = Some(svg.into());
        self
    }

    pub fn on_click(mut self, f: impl Fn(&mut EventCx<'_>, &mut Event) + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn type_name(&self) -> &'static str {
        "button"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::ACTIVATABLE | Abilities::FOCUSABLE | Abilities::HOVERABLE);
        w.styler(|s| {
            s.padding = lumen_core::Sides::symmetric(Length::dp(6.0), Length::dp(12.0));
            s.border.radius = Length::dp(4.0);
            s.set_background(Color::from_hex(0xe0e0e0));
            s.cursor = Cursor::Pointer;
            s.align = Align::Center;
        });
        if let Some(f) = self.on_click.take() {
            w.on(EventType::Click, move |cx, ev| f(cx, ev));
        }
    }

    fn config(&mut self, w: &mut WidgetMut<'_>) -> Result<()> {
        if let Some(svg) = &self.icon {
            if w.part("icon").is_none() {
                let icon = SvgView::parse(svg)?;
                let id = w.add_part("icon", icon)?;
                if let Some(n) = w.tree().node_mut(id) {
                    n.stylers.main.push(Rc::new(|s: &mut Style| {
                        s.set_size(Length::em(1.0), Length::em(1.0));
                    }));
                }
            }
        }
        match w.part("label") {
            Some(id) => {
                if let Some(t) = w.tree().widget_mut::<Text>(id) {
                    t.set_text(self.label.clone());
                }
            }
            None => {
                w.add_part("label", Text::new(self.label.clone()))?;
                w.parts_styler(|s| {
                    s.set_gap(Length::dp(6.0));
                    s.align = Align::Center;
                })?;
            }
        }
        Ok(())
    }
}
