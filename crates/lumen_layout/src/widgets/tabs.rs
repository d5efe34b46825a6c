//! Tabbed pages
//!
//! A tabs widget holds two children: a bar of tab buttons and a stacked
//! frame of pages. Only the selected page is laid out visibly and receives
//! events.

use std::cell::Cell;
use std::rc::Rc;

use lumen_core::Length;

use crate::error::{LayoutError, Result};
use crate::events::EventType;
use crate::flags::StateFlags;
use crate::style::{Direction, Display, Style};
use crate::tree::{SceneTree, WidgetId};
use crate::widget::{Widget, WidgetMut};
use crate::widgets::button::Button;
use crate::widgets::frame::Frame;

pub struct Tabs {
    current: Rc<Cell<usize>>,
    bar: Option<WidgetId>,
    pages: Option<WidgetId>,
}

impl Default for Tabs {
    fn default() -> Self {
        Self::new()
    }
}

impl Tabs {
    pub fn new() -> Self {
        Self {
            current: Rc::new(Cell::new(0)),
            bar: None,
            pages: None,
        }
    }

    pub fn current(&self) -> usize {
        self.current.get()
    }

    pub fn bar(&self) -> Option<WidgetId> {
        self.bar
    }

    pub fn pages(&self) -> Option<WidgetId> {
        self.pages
    }
}

impl Widget for Tabs {
    fn type_name(&self) -> &'static str {
        "tabs"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.styler(|s| {
            s.direction = Direction::Column;
        });
    }

    fn config(&mut self, w: &mut WidgetMut<'_>) -> Result<()> {
        if self.bar.is_none() {
            let bar = w.add_child("bar", Frame::row())?;
            let pages = w.add_child("pages", Frame::stacked())?;
            let current = self.current.clone();
            let node = w.tree().get_mut(pages)?;
            node.stylers.main.push(Rc::new(move |s: &mut Style| {
                s.display = Display::Stacked;
                s.stack_top = current.get();
                s.set_grow(1.0, 1.0);
            }));
            w.tree().get_mut(bar)?.stylers.main.push(Rc::new(|s: &mut Style| {
                s.set_gap(Length::dp(2.0));
            }));
            self.bar = Some(bar);
            self.pages = Some(pages);
        }
        Ok(())
    }
}

/// Add a page with a tab titled `title`; returns the page id
pub fn add_tab(
    tree: &mut SceneTree,
    tabs: WidgetId,
    title: &str,
    page: impl Widget,
) -> Result<WidgetId> {
    let (bar, pages, current) = match tree.widget::<Tabs>(tabs) {
        Some(Tabs {
            bar: Some(bar),
            pages: Some(pages),
            current,
        }) => (*bar, *pages, current.clone()),
        _ => return Err(LayoutError::InvalidNode(tabs)),
    };
    let index = tree.children(pages).len();
    let page = tree.add(pages, &format!("page{index}"), page)?;

    let button = Button::new(title).on_click(move |cx, ev| {
        ev.set_handled();
        if current.get() == index {
            return;
        }
        current.set(index);
        let tabs_bar = cx.tree().children(bar).to_vec();
        for (i, tab) in tabs_bar.into_iter().enumerate() {
            cx.set_state_of(tab, StateFlags::SELECTED, i == index);
        }
        cx.restyle_all();
        cx.send(EventType::Change, ev.time);
    });
    let tab = tree.add(bar, &format!("tab{index}"), button)?;
    if index == tree.widget::<Tabs>(tabs).map_or(0, Tabs::current) {
        tree.get_mut(tab)?.state.insert(StateFlags::SELECTED);
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_build_bar_and_pages() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let tabs = tree.add(root, "tabs", Tabs::new()).unwrap();
        let a = add_tab(&mut tree, tabs, "A", Frame::new()).unwrap();
        let b = add_tab(&mut tree, tabs, "B", Frame::new()).unwrap();
        let t = tree.widget::<Tabs>(tabs).unwrap();
        let (bar, pages) = (t.bar().unwrap(), t.pages().unwrap());
        assert_eq!(tree.children(pages), &[a, b]);
        assert_eq!(tree.children(bar).len(), 2);
        assert!(tree.get(tree.children(bar)[0]).unwrap().is(StateFlags::SELECTED));
        assert!(!tree.get(tree.children(bar)[1]).unwrap().is(StateFlags::SELECTED));
    }
}
