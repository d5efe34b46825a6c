//! Menus: the model built by choosers and context-menu builders, and the
//! widgets that show one inside a popup scene
//!
//! A menu popup does not call back into the widget that opened it. Choosing
//! an item raises [`SceneRequest::MenuChosen`]; the stage manager closes the
//! popup and delivers a [`MenuChoice`] custom event to the owner.

use std::rc::Rc;

use lumen_core::{Color, KeyChord, Length};

use crate::error::Result;
use crate::events::{EventType, SceneRequest};
use crate::flags::{Abilities, StateFlags};
use crate::style::{Direction, Justify, Style};
use crate::tree::{SceneTree, WidgetId};
use crate::widget::{Widget, WidgetMut};
use crate::widgets::text::Text;

/// Adds items to a context menu
pub type MenuBuilder = Rc<dyn Fn(&mut Menu)>;

#[derive(Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub shortcut: Option<KeyChord>,
    pub enabled: bool,
}

/// An ordered list of items
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&mut self, label: impl Into<String>) -> &mut Self {
        self.items.push(MenuItem {
            label: label.into(),
            shortcut: None,
            enabled: true,
        });
        self
    }

    /// Add an item showing a keyboard shortcut
    pub fn item_with_shortcut(&mut self, label: impl Into<String>, chord: KeyChord) -> &mut Self {
        self.items.push(MenuItem {
            label: label.into(),
            shortcut: Some(chord),
            enabled: true,
        });
        self
    }

    pub fn disabled_item(&mut self, label: impl Into<String>) -> &mut Self {
        self.items.push(MenuItem {
            label: label.into(),
            shortcut: None,
            enabled: false,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build a menu from every builder in order
    pub fn from_builders(builders: &[MenuBuilder]) -> Self {
        let mut menu = Menu::new();
        for b in builders {
            b(&mut menu);
        }
        menu
    }
}

/// Payload of the custom event sent to a menu's owner when an item is chosen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuChoice {
    pub index: usize,
    pub label: String,
}

/// One selectable row of a menu popup
pub struct MenuRow {
    index: usize,
    item: MenuItem,
}

impl MenuRow {
    pub fn new(index: usize, item: MenuItem) -> Self {
        Self { index, item }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Widget for MenuRow {
    fn type_name(&self) -> &'static str {
        "menu-row"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::ACTIVATABLE | Abilities::HOVERABLE);
        w.set_state(StateFlags::DISABLED, !self.item.enabled);
        w.styler(|s| {
            s.set_padding(Length::dp(6.0));
            s.set_grow(1.0, 0.0);
        });
        let index = self.index;
        w.on(EventType::Click, move |cx, ev| {
            ev.set_handled_stop();
            cx.request(SceneRequest::MenuChosen { index });
        });
    }

    fn config(&mut self, w: &mut WidgetMut<'_>) -> Result<()> {
        if w.part("label").is_none() {
            w.add_part("label", Text::new(self.item.label.clone()))?;
        }
        if let Some(chord) = &self.item.shortcut {
            if w.part("shortcut").is_none() {
                w.add_part("shortcut", Text::new(chord.to_string()))?;
            }
        }
        w.parts_styler(|s| {
            s.set_gap(Length::dp(16.0));
            s.justify = Justify::SpaceBetween;
            s.set_grow(1.0, 0.0);
        })?;
        Ok(())
    }
}

/// Fill a popup scene's root with one row per menu item
pub fn populate(tree: &mut SceneTree, root: WidgetId, menu: &Menu) -> Result<Vec<WidgetId>> {
    if let Some(node) = tree.node_mut(root) {
        node.stylers.main.push(Rc::new(|s: &mut Style| {
            s.direction = Direction::Column;
            s.set_padding(Length::dp(4.0));
            s.set_background(Color::WHITE);
            s.set_border(Length::dp(1.0), Color::GRAY);
        }));
    }
    menu.items
        .iter()
        .enumerate()
        .map(|(i, item)| tree.add(root, &format!("item{i}"), MenuRow::new(i, item.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_run_in_order() {
        let builders: Vec<MenuBuilder> = vec![
            Rc::new(|m: &mut Menu| {
                m.item("Cut");
            }),
            Rc::new(|m: &mut Menu| {
                m.item("Copy").disabled_item("Paste");
            }),
        ];
        let menu = Menu::from_builders(&builders);
        let labels: Vec<&str> = menu.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Cut", "Copy", "Paste"]);
        assert!(!menu.items[2].enabled);
    }

    #[test]
    fn populate_adds_rows() {
        let mut tree = SceneTree::with_root("menu");
        let root = tree.root();
        let mut menu = Menu::new();
        menu.item("One").disabled_item("Two");
        let rows = populate(&mut tree, root, &menu).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(tree.widget::<MenuRow>(rows[1]).unwrap().index(), 1);
        assert!(tree.get(rows[1]).unwrap().is_disabled());
        assert!(tree.get(rows[0]).unwrap().parts.is_some());
    }
}
