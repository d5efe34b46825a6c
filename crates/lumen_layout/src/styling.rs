//! The style pass
//!
//! Runs top-down so every widget sees its parent's resolved style:
//!
//! 1. defaults, then inherited typography from the parent
//! 2. `first` stylers
//! 3. stylesheet rules of the ancestors and the widget itself
//! 4. `main` stylers, then `last` stylers
//! 5. the state layer for the current state flags
//! 6. unit conversion with the widget's [`UnitContext`]
//!
//! A resolved `display: none`, or the `HIDDEN` state, marks the widget
//! invisible.

use std::rc::Rc;

use lumen_core::{Length, Size, Unit, UnitContext};
use tracing::trace;

use crate::css::{SelectorTarget, StyleSheet};
use crate::flags::{Abilities, StateFlags};
use crate::style::{Display, Style};
use crate::tree::{SceneTree, WidgetId};

/// Overlay opacity each state contributes, once
pub const STATE_LAYERS: [(StateFlags, f32); 5] = [
    (StateFlags::HOVERED, 0.08),
    (StateFlags::FOCUSED, 0.10),
    (StateFlags::SELECTED, 0.10),
    (StateFlags::ACTIVE, 0.12),
    (StateFlags::DRAGGING, 0.16),
];

/// Most a state layer may cover
pub const MAX_STATE_LAYER: f32 = 0.3;

/// Opacity multiplier of disabled widgets
pub const DISABLED_OPACITY: f32 = 0.38;

/// Scene-wide inputs of the style pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleCx {
    pub dpi: f32,
    pub viewport: Size,
    /// Default scrollbar strip width in dp
    pub scrollbar_width: f32,
}

impl Default for StyleCx {
    fn default() -> Self {
        Self {
            dpi: 160.0,
            viewport: Size::ZERO,
            scrollbar_width: 10.0,
        }
    }
}

/// State overlay opacity for `state`
pub fn state_layer(state: StateFlags, abilities: Abilities) -> f32 {
    if !abilities.intersects(Abilities::PRESS_TARGET | Abilities::HOVERABLE | Abilities::FOCUSABLE) {
        return 0.0;
    }
    STATE_LAYERS
        .iter()
        .filter(|(flag, _)| state.contains(*flag))
        .map(|(_, v)| v)
        .sum::<f32>()
        .min(MAX_STATE_LAYER)
}

/// Restyle `id` and everything below it. Returns whether any geometry
/// relevant property changed.
pub fn style_tree(tree: &mut SceneTree, id: WidgetId, cx: &StyleCx) -> bool {
    let mut changed = style_widget(tree, id, cx);
    let (parts, children) = match tree.node(id) {
        Some(n) => (n.parts, n.children.clone()),
        None => return changed,
    };
    if let Some(p) = parts {
        changed |= style_tree(tree, p, cx);
    }
    for c in children {
        changed |= style_tree(tree, c, cx);
    }
    changed
}

/// Restyle one widget and its parts, for state-only changes
pub fn style_with_parts(tree: &mut SceneTree, id: WidgetId, cx: &StyleCx) -> bool {
    let mut changed = style_widget(tree, id, cx);
    if let Some(p) = tree.node(id).and_then(|n| n.parts) {
        changed |= style_tree(tree, p, cx);
    }
    changed
}

/// Resolve the style of a single widget from its parent's resolved style
pub fn style_widget(tree: &mut SceneTree, id: WidgetId, cx: &StyleCx) -> bool {
    let parent = tree.parent(id).and_then(|p| tree.node(p));
    let (parent_style, parent_agg, parent_size) = match parent {
        Some(p) => (
            Some(p.style.clone()),
            p.css_agg.clone(),
            p.geom.content.size,
        ),
        None => (None, Vec::new(), cx.viewport),
    };
    let Some(node) = tree.node(id) else {
        return false;
    };

    let mut css_agg: Vec<Rc<StyleSheet>> = parent_agg;
    if let Some(own) = &node.css {
        css_agg.push(own.clone());
    }

    let mut style = Style::default();
    if let Some(p) = &parent_style {
        style.inherit(p);
    }
    style.state = node.state;
    style.abilities = node.abilities;
    style.scrollbar_width = Length::dp(cx.scrollbar_width);

    for f in &node.stylers.first {
        f(&mut style);
    }
    let target = SelectorTarget {
        tag: node.type_name,
        name: &node.name,
        class: &node.class,
        state: node.state,
    };
    for sheet in &css_agg {
        sheet.apply(&target, &mut style);
    }
    for f in node.stylers.main.iter().chain(&node.stylers.last) {
        f(&mut style);
    }

    style.state_layer = (style.state_layer + state_layer(node.state, node.abilities)).min(1.0);
    if node.is_disabled() {
        style.opacity *= DISABLED_OPACITY;
    }

    let mut unit_ctx = UnitContext::with_dpi(cx.dpi);
    unit_ctx.font_size = match &parent_style {
        Some(p) => p.font_size(),
        None => unit_ctx.to_dots(16.0, Unit::Dp),
    };
    unit_ctx.set_parent_size(parent_size.width, parent_size.height);
    unit_ctx.set_viewport(cx.viewport.width, cx.viewport.height);
    style.to_dots(&unit_ctx);

    let hidden = style.display == Display::None || node.is(StateFlags::HIDDEN);
    let layout_changed = !node.style.layout_eq(&style) || node.is(StateFlags::INVISIBLE) != hidden;
    if layout_changed {
        trace!(widget = %node.name, "layout affecting style change");
    }

    if let Some(node) = tree.node_mut(id) {
        node.state.set(StateFlags::INVISIBLE, hidden);
        style.state = node.state;
        node.style = style;
        node.unit_ctx = unit_ctx;
        node.css_agg = css_agg;
    }
    layout_changed
}

/// Re-resolve container relative lengths (`pw`, `ph`) of `id` and everything
/// below it against the content boxes of the layout just run. Returns
/// whether a resolved size changed, in which case the layout is stale.
pub fn rebase_percentages(tree: &mut SceneTree, id: WidgetId, cx: &StyleCx) -> bool {
    let base = match tree.parent(id).and_then(|p| tree.node(p)) {
        Some(p) => p.geom.content.size,
        None => cx.viewport,
    };
    let mut changed = false;
    if let Some(node) = tree.node_mut(id) {
        let ctx = &mut node.unit_ctx;
        let moved = (ctx.parent_width - base.width).abs() > 0.01
            || (ctx.parent_height - base.height).abs() > 0.01;
        if moved {
            ctx.set_parent_size(base.width, base.height);
            let mut style = node.style.clone();
            style.to_dots(&node.unit_ctx);
            changed = !node.style.layout_eq(&style);
            if changed {
                trace!(widget = %node.name, ?base, "percentage base moved");
            }
            node.style = style;
        }
    }
    let (parts, children) = match tree.node(id) {
        Some(n) => (n.parts, n.children.clone()),
        None => return changed,
    };
    for c in parts.into_iter().chain(children) {
        changed |= rebase_percentages(tree, c, cx);
    }
    changed
}

#[cfg(test)]
mod tests {
    use lumen_core::Color;

    use super::*;
    use crate::widgets::frame::Frame;

    fn cx() -> StyleCx {
        StyleCx {
            viewport: Size::new(400.0, 300.0),
            ..StyleCx::default()
        }
    }

    #[test]
    fn stylers_run_in_group_order_around_css() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let id = tree.add(root, "box", Frame::new()).unwrap();
        {
            let node = tree.get_mut(id).unwrap();
            node.class = "tinted".to_string();
            node.css = Some(Rc::new(StyleSheet::parse(".tinted { opacity: 0.5; columns: 4 }")));
            node.stylers.first.push(Rc::new(|s: &mut Style| s.columns = 2));
            node.stylers.main.push(Rc::new(|s: &mut Style| s.opacity *= 0.5));
            node.stylers.last.push(Rc::new(|s: &mut Style| s.columns += 1));
        }
        style_tree(&mut tree, root, &cx());
        let style = &tree.get(id).unwrap().style;
        // css replaced the first styler's value, main saw the css value
        assert_eq!(style.columns, 5);
        assert!((style.opacity - 0.25).abs() < 1e-6);
    }

    #[test]
    fn children_inherit_typography() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        tree.get_mut(root).unwrap().stylers.main.push(Rc::new(|s: &mut Style| {
            s.color = Color::RED;
            s.font.size = Length::px(20.0);
        }));
        let child = tree.add(root, "child", Frame::new()).unwrap();
        tree.get_mut(child)
            .unwrap()
            .stylers
            .main
            .push(Rc::new(|s: &mut Style| s.padding = lumen_core::Sides::all(Length::em(1.0))));
        style_tree(&mut tree, root, &cx());
        let style = &tree.get(child).unwrap().style;
        assert_eq!(style.color, Color::RED);
        assert_eq!(style.font_size(), 20.0);
        assert_eq!(style.padding.left.dots, 20.0);
    }

    #[test]
    fn state_layer_adds_each_state_once() {
        let abilities = Abilities::ACTIVATABLE;
        assert_eq!(state_layer(StateFlags::empty(), abilities), 0.0);
        assert!((state_layer(StateFlags::HOVERED, abilities) - 0.08).abs() < 1e-6);
        let both = state_layer(StateFlags::HOVERED | StateFlags::ACTIVE, abilities);
        assert!((both - 0.20).abs() < 1e-6);
        let all = state_layer(StateFlags::all(), abilities);
        assert_eq!(all, MAX_STATE_LAYER);
        assert_eq!(state_layer(StateFlags::HOVERED, Abilities::empty()), 0.0);
    }

    #[test]
    fn styling_is_idempotent() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let a = tree.add(root, "a", Frame::new()).unwrap();
        tree.get_mut(a).unwrap().css = Some(Rc::new(StyleSheet::parse(
            "frame { padding: 4px 8px; background: #336699 } #a { font-size: 2em }",
        )));
        style_tree(&mut tree, root, &cx());
        let first = tree.get(a).unwrap().style.clone();
        assert!(!style_tree(&mut tree, root, &cx()));
        assert_eq!(tree.get(a).unwrap().style, first);
    }

    #[test]
    fn display_none_marks_invisible() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let a = tree.add(root, "a", Frame::new()).unwrap();
        tree.get_mut(a)
            .unwrap()
            .stylers
            .main
            .push(Rc::new(|s: &mut Style| s.display = Display::None));
        assert!(style_tree(&mut tree, root, &cx()));
        assert!(tree.get(a).unwrap().is(StateFlags::INVISIBLE));
    }

    #[test]
    fn hidden_widgets_stay_invisible_across_restyles() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let a = tree.add(root, "a", Frame::new()).unwrap();
        tree.get_mut(a).unwrap().state.insert(StateFlags::HIDDEN);
        style_tree(&mut tree, root, &cx());
        assert!(tree.get(a).unwrap().is(StateFlags::INVISIBLE));
        assert!(!style_tree(&mut tree, root, &cx()));
        assert!(tree.get(a).unwrap().is(StateFlags::INVISIBLE));

        tree.get_mut(a).unwrap().state.remove(StateFlags::HIDDEN);
        assert!(style_tree(&mut tree, root, &cx()));
        assert!(!tree.get(a).unwrap().is(StateFlags::INVISIBLE));
    }

    #[test]
    fn percentages_follow_the_parent_content_box() {
        let mut tree = SceneTree::with_root("root");
        let root = tree.root();
        let a = tree.add(root, "a", Frame::new()).unwrap();
        tree.get_mut(a)
            .unwrap()
            .stylers
            .main
            .push(Rc::new(|s: &mut Style| {
                s.set_size(Length::pw(50.0), Length::px(10.0));
            }));
        style_tree(&mut tree, root, &cx());
        assert_eq!(tree.get(a).unwrap().style.min.x.dots, 0.0);

        tree.get_mut(root).unwrap().geom.content.size = Size::new(300.0, 100.0);
        assert!(rebase_percentages(&mut tree, root, &cx()));
        assert_eq!(tree.get(a).unwrap().style.min.x.dots, 150.0);
        assert!(!rebase_percentages(&mut tree, root, &cx()));
    }
}
