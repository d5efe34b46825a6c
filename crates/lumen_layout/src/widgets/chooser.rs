//! Drop-down chooser
//!
//! Clicking opens a menu popup below the chooser. The chosen item comes back
//! as a custom event carrying a [`MenuChoice`].

use lumen_core::{Color, Length, Point};
use lumen_platform::Cursor;

use crate::error::Result;
use crate::events::{EventType, SceneRequest};
use crate::flags::Abilities;
use crate::geom::GeomState;
use crate::widget::{Widget, WidgetMut};
use crate::widgets::menu::{Menu, MenuChoice};
use crate::widgets::text::Text;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chooser {
    items: Vec<String>,
    current: usize,
}

impl Chooser {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            current: 0,
        }
    }

    pub fn with_current(mut self, index: usize) -> Self {
        self.current = index.min(self.items.len().saturating_sub(1));
        self
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_item(&self) -> Option<&str> {
        self.items.get(self.current).map(String::as_str)
    }

    pub fn menu(&self) -> Menu {
        let mut menu = Menu::new();
        for item in &self.items {
            menu.item(item.clone());
        }
        menu
    }
}

impl Widget for Chooser {
    fn type_name(&self) -> &'static str {
        "chooser"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::ACTIVATABLE | Abilities::FOCUSABLE | Abilities::HOVERABLE);
        w.styler(|s| {
            s.set_padding(Length::dp(6.0));
            s.set_border(Length::dp(1.0), Color::GRAY);
            s.border.radius = Length::dp(4.0);
            s.cursor = Cursor::Pointer;
        });
        w.on(EventType::Click, |cx, ev| {
            let Some(menu) = cx.widget::<Chooser>().map(Chooser::menu) else {
                return;
            };
            let pos = cx
                .geom()
                .map_or(ev.pos, |g| Point::new(g.total_bbox.x(), g.total_bbox.max_y()));
            let owner = cx.id();
            cx.request(SceneRequest::OpenMenu { owner, menu, pos });
            ev.set_handled();
        });
        w.on(EventType::Custom, |cx, ev| {
            let Some(choice) = ev.payload::<MenuChoice>().cloned() else {
                return;
            };
            let changed = cx.widget_mut::<Chooser>().is_some_and(|c| {
                let valid = choice.index < c.items.len() && choice.index != c.current;
                if valid {
                    c.current = choice.index;
                }
                valid
            });
            if changed {
                cx.reconfig();
                cx.send(EventType::Change, ev.time);
                cx.needs_layout();
            }
            ev.set_handled();
        });
    }

    fn config(&mut self, w: &mut WidgetMut<'_>) -> Result<()> {
        let label = self.current_item().unwrap_or_default().to_string();
        match w.part("label") {
            Some(id) => {
                if let Some(t) = w.tree().widget_mut::<Text>(id) {
                    t.set_text(label);
                }
            }
            None => {
                w.add_part("label", Text::new(label))?;
                w.add_part("arrow", Text::new("\u{25be}"))?;
                w.parts_styler(|s| {
                    s.set_gap(Length::dp(8.0));
                })?;
            }
        }
        Ok(())
    }

    fn context_menu_pos(&self, geom: &GeomState, _pointer: Point) -> Point {
        Point::new(geom.total_bbox.x(), geom.total_bbox.max_y())
    }
}
