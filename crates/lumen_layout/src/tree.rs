//! Widget tree arena
//!
//! Every widget of a scene lives in one [`SlotMap`] keyed by [`WidgetId`].
//! Parents own their children through id lists and children point back with
//! a plain id, so removing a subtree invalidates every id in it: later access
//! through a stale id fails with [`LayoutError::InvalidNode`].
//!
//! A widget may own a `parts` subtree (icon, label, indicator) that is laid
//! out and rendered with it but never appears in its child list.

use std::rc::Rc;

use lumen_core::UnitContext;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use tracing::warn;

use crate::css::StyleSheet;
use crate::error::{LayoutError, Result};
use crate::events::{EventType, Listeners};
use crate::flags::{Abilities, StateFlags};
use crate::geom::GeomState;
use crate::style::Style;
use crate::widget::{Stylers, Widget};
use crate::widgets::menu::MenuBuilder;

new_key_type! {
    pub struct WidgetId;
}

impl WidgetId {
    /// Convert to a raw u64 representation, for type-erased contexts such
    /// as custom event targets
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a value produced by [`WidgetId::to_raw`]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Result of a tree walk callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into this node's children
    SkipChildren,
    Break,
}

/// One widget in the arena
pub struct Node {
    pub name: String,
    /// Position among its parent's children
    pub index: usize,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    /// Root of the parts subtree
    pub parts: Option<WidgetId>,
    /// Nearest owner outside any parts subtree; `None` for ordinary widgets
    pub owner: Option<WidgetId>,

    /// Behavior; taken out of the node while one of its hooks runs
    pub(crate) widget: Option<Box<dyn Widget>>,
    pub type_name: &'static str,

    pub class: String,
    pub tooltip: Option<String>,
    pub css: Option<Rc<StyleSheet>>,
    /// Sheets of every ancestor followed by this widget's own
    pub css_agg: Vec<Rc<StyleSheet>>,
    pub stylers: Stylers,
    pub style: Style,
    pub unit_ctx: UnitContext,

    pub geom: GeomState,
    pub state: StateFlags,
    pub abilities: Abilities,

    pub listeners: Listeners,
    /// Event types this widget sees before its descendants
    pub priority_events: SmallVec<[EventType; 2]>,
    pub context_menus: Vec<MenuBuilder>,
}

impl Node {
    fn new(name: String, parent: Option<WidgetId>, owner: Option<WidgetId>) -> Self {
        Self {
            name,
            index: 0,
            parent,
            children: Vec::new(),
            parts: None,
            owner,
            widget: None,
            type_name: "",
            class: String::new(),
            tooltip: None,
            css: None,
            css_agg: Vec::new(),
            stylers: Stylers::default(),
            style: Style::default(),
            unit_ctx: UnitContext::default(),
            geom: GeomState::default(),
            state: StateFlags::empty(),
            abilities: Abilities::empty(),
            listeners: Listeners::default(),
            priority_events: SmallVec::new(),
            context_menus: Vec::new(),
        }
    }

    pub fn is(&self, state: StateFlags) -> bool {
        self.state.contains(state)
    }

    pub fn can(&self, ability: Abilities) -> bool {
        self.abilities.contains(ability)
    }

    /// Has at least one of `abilities`
    pub fn can_any(&self, abilities: Abilities) -> bool {
        self.abilities.intersects(abilities)
    }

    /// Part of some widget's parts subtree
    pub fn is_part(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_disabled(&self) -> bool {
        self.is(StateFlags::DISABLED)
    }

    pub fn widget(&self) -> Option<&dyn Widget> {
        self.widget.as_deref()
    }
}

/// The widget arena of one scene
pub struct SceneTree {
    nodes: SlotMap<WidgetId, Node>,
    root: WidgetId,
    next_unique: u64,
}

impl SceneTree {
    /// A tree holding only the root node; the caller installs its widget
    pub(crate) fn with_root(name: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(name.to_string(), None, None));
        Self {
            nodes,
            root,
            next_unique: 0,
        }
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: WidgetId) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| {
            warn!(widget = ?id, "access to a removed widget");
            LayoutError::InvalidNode(id)
        })
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or_else(|| {
            warn!(widget = ?id, "access to a removed widget");
            LayoutError::InvalidNode(id)
        })
    }

    /// Quiet lookup for internal passes that already hold valid ids
    pub(crate) fn node(&self, id: WidgetId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: WidgetId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &Node)> {
        self.nodes.iter()
    }

    /// Downcast a widget's behavior to its concrete type
    pub fn widget<T: Widget>(&self, id: WidgetId) -> Option<&T> {
        self.nodes
            .get(id)?
            .widget
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn widget_mut<T: Widget>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.nodes
            .get_mut(id)?
            .widget
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Take the behavior out so a hook can borrow the tree mutably
    pub(crate) fn take_widget(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        self.nodes.get_mut(id)?.widget.take()
    }

    pub(crate) fn put_widget(&mut self, id: WidgetId, widget: Box<dyn Widget>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.type_name = widget.type_name();
            node.widget = Some(widget);
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Attach a new empty node under `parent`.
    ///
    /// Duplicate sibling names are allowed; lookups then find the first.
    pub(crate) fn insert(&mut self, parent: WidgetId, name: &str) -> Result<WidgetId> {
        let parent_node = self.get(parent)?;
        if parent_node.children.iter().any(|c| self.nodes[*c].name == name) {
            warn!(parent = %parent_node.name, name, "duplicate child name");
        }
        let owner = parent_node.owner;
        let index = parent_node.children.len();
        let mut node = Node::new(name.to_string(), Some(parent), owner);
        node.index = index;
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Create the parts root of `owner` if it does not exist yet
    pub(crate) fn ensure_parts(&mut self, owner: WidgetId) -> Result<WidgetId> {
        if let Some(parts) = self.get(owner)?.parts {
            return Ok(parts);
        }
        let outer = self.nodes[owner].owner.unwrap_or(owner);
        let mut node = Node::new("parts".to_string(), Some(owner), Some(outer));
        node.type_name = "parts";
        let id = self.nodes.insert(node);
        self.nodes[owner].parts = Some(id);
        Ok(id)
    }

    /// Remove a widget and everything under it, including parts
    pub fn delete(&mut self, id: WidgetId) -> Result<()> {
        if id == self.root {
            return Err(LayoutError::CycleDetected(
                "the scene root cannot be deleted".to_string(),
            ));
        }
        let node = self.get(id)?;
        let parent = node.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            if parent.parts == Some(id) {
                parent.parts = None;
            } else {
                parent.children.retain(|c| *c != id);
                for (i, c) in parent.children.clone().into_iter().enumerate() {
                    if let Some(n) = self.nodes.get_mut(c) {
                        n.index = i;
                    }
                }
            }
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
                stack.extend(node.parts);
            }
        }
        Ok(())
    }

    /// Move `id` to be the last child of `new_parent`
    pub fn reparent(&mut self, id: WidgetId, new_parent: WidgetId) -> Result<()> {
        self.get(id)?;
        self.get(new_parent)?;
        if self.is_ancestor(id, new_parent) || id == new_parent {
            return Err(LayoutError::CycleDetected(format!(
                "{} cannot become a child of its descendant",
                self.nodes[id].name
            )));
        }
        if let Some(old) = self.nodes[id].parent {
            if let Some(p) = self.nodes.get_mut(old) {
                p.children.retain(|c| *c != id);
            }
            self.reindex(old);
        }
        let index = self.nodes[new_parent].children.len();
        self.nodes[new_parent].children.push(id);
        let owner = self.nodes[new_parent].owner;
        let node = &mut self.nodes[id];
        node.parent = Some(new_parent);
        node.index = index;
        node.owner = owner;
        Ok(())
    }

    fn reindex(&mut self, parent: WidgetId) {
        let children = match self.nodes.get(parent) {
            Some(p) => p.children.clone(),
            None => return,
        };
        for (i, c) in children.into_iter().enumerate() {
            if let Some(n) = self.nodes.get_mut(c) {
                n.index = i;
            }
        }
    }

    /// Whether `ancestor` is a proper ancestor of `id`
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cur = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes.get(p).and_then(|n| n.parent);
        }
        false
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id)?.parent
    }

    /// The enclosing widget: the owner for parts, the parent otherwise
    pub fn parent_widget(&self, id: WidgetId) -> Option<WidgetId> {
        let parent = self.nodes.get(id)?.parent?;
        if self.is_parts_root(parent) {
            self.nodes.get(parent)?.parent
        } else {
            Some(parent)
        }
    }

    /// Whether `id` is the container node of some widget's parts
    pub fn is_parts_root(&self, id: WidgetId) -> bool {
        self.parent(id)
            .and_then(|p| self.nodes.get(p))
            .is_some_and(|p| p.parts == Some(id))
    }

    /// Nearest ancestor satisfying `pred`
    pub fn parent_widget_if(
        &self,
        id: WidgetId,
        mut pred: impl FnMut(WidgetId, &Node) -> bool,
    ) -> Option<WidgetId> {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            let node = self.nodes.get(p)?;
            if pred(p, node) {
                return Some(p);
            }
            cur = node.parent;
        }
        None
    }

    /// Child lookup by name; `hint` is checked first
    pub fn child_by_name(&self, parent: WidgetId, name: &str, hint: Option<usize>) -> Option<WidgetId> {
        let children = &self.nodes.get(parent)?.children;
        if let Some(&id) = hint.and_then(|i| children.get(i)) {
            if self.nodes[id].name == name {
                return Some(id);
            }
        }
        children.iter().copied().find(|c| self.nodes[*c].name == name)
    }

    /// Slash separated names from `ancestor` (exclusive) down to `id`
    pub fn path_from(&self, ancestor: WidgetId, id: WidgetId) -> Option<String> {
        let mut names = Vec::new();
        let mut cur = id;
        while cur != ancestor {
            let node = self.nodes.get(cur)?;
            names.push(node.name.as_str());
            cur = node.parent?;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// Resolve a path produced by [`SceneTree::path_from`]
    pub fn find_path(&self, from: WidgetId, path: &str) -> Option<WidgetId> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(from, |cur, name| self.child_by_name(cur, name, None))
    }

    /// Monotonic per-scene id, for generated names such as SVG defs
    pub fn unique_id(&mut self, prefix: &str) -> String {
        self.next_unique += 1;
        format!("{prefix}{}", self.next_unique)
    }

    // ------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------

    /// Depth-first pre-order over `start` and its children (not parts).
    /// Returns false if the walk was broken off.
    pub fn walk_down(
        &self,
        start: WidgetId,
        mut f: impl FnMut(WidgetId, &Node) -> WalkControl,
    ) -> bool {
        self.walk_down_impl(start, false, &mut f)
    }

    /// Like [`SceneTree::walk_down`] but visits parts subtrees before children
    pub fn walk_down_all(
        &self,
        start: WidgetId,
        mut f: impl FnMut(WidgetId, &Node) -> WalkControl,
    ) -> bool {
        self.walk_down_impl(start, true, &mut f)
    }

    fn walk_down_impl(
        &self,
        id: WidgetId,
        parts: bool,
        f: &mut dyn FnMut(WidgetId, &Node) -> WalkControl,
    ) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return true;
        };
        match f(id, node) {
            WalkControl::Break => return false,
            WalkControl::SkipChildren => return true,
            WalkControl::Continue => {}
        }
        if parts {
            if let Some(p) = node.parts {
                if !self.walk_down_impl(p, parts, f) {
                    return false;
                }
            }
        }
        for &child in &node.children {
            if !self.walk_down_impl(child, parts, f) {
                return false;
            }
        }
        true
    }

    /// Walk over widgets, optionally skipping subtrees hidden by style
    pub fn widget_walk_down(
        &self,
        start: WidgetId,
        skip_invisible: bool,
        mut f: impl FnMut(WidgetId, &Node) -> WalkControl,
    ) -> bool {
        self.walk_down(start, |id, node| {
            if skip_invisible && node.is(StateFlags::INVISIBLE) {
                return WalkControl::SkipChildren;
            }
            f(id, node)
        })
    }

    /// From `start` up to the root, `start` included
    pub fn walk_up(&self, start: WidgetId, mut f: impl FnMut(WidgetId, &Node) -> WalkControl) -> bool {
        let mut cur = Some(start);
        while let Some(id) = cur {
            let Some(node) = self.nodes.get(id) else {
                return true;
            };
            if f(id, node) == WalkControl::Break {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Next widget in depth-first order over children
    pub fn next(&self, id: WidgetId) -> Option<WidgetId> {
        let node = self.nodes.get(id)?;
        if let Some(&first) = node.children.first() {
            return Some(first);
        }
        let mut cur = id;
        loop {
            let node = self.nodes.get(cur)?;
            let parent = node.parent?;
            let siblings = &self.nodes.get(parent)?.children;
            if self.nodes.get(parent)?.parts == Some(cur) {
                return None;
            }
            if let Some(&sib) = siblings.get(node.index + 1) {
                return Some(sib);
            }
            cur = parent;
        }
    }

    /// Previous widget in depth-first order over children
    pub fn prev(&self, id: WidgetId) -> Option<WidgetId> {
        let node = self.nodes.get(id)?;
        let parent = node.parent?;
        if node.index == 0 {
            return Some(parent);
        }
        let mut cur = *self.nodes.get(parent)?.children.get(node.index - 1)?;
        while let Some(&last) = self.nodes.get(cur)?.children.last() {
            cur = last;
        }
        Some(cur)
    }

    /// The widget `id` and all its descendants in depth-first order
    pub fn subtree(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        self.walk_down(id, |w, _| {
            out.push(w);
            WalkControl::Continue
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (SceneTree, WidgetId, WidgetId, WidgetId, WidgetId) {
        let mut t = SceneTree::with_root("root");
        let root = t.root();
        let a = t.insert(root, "a").unwrap();
        let a1 = t.insert(a, "a1").unwrap();
        let b = t.insert(root, "b").unwrap();
        (t, root, a, a1, b)
    }

    #[test]
    fn depth_first_order() {
        let (t, root, a, a1, b) = tree();
        assert_eq!(t.next(root), Some(a));
        assert_eq!(t.next(a), Some(a1));
        assert_eq!(t.next(a1), Some(b));
        assert_eq!(t.next(b), None);
        assert_eq!(t.prev(b), Some(a1));
        assert_eq!(t.prev(a1), Some(a));
        assert_eq!(t.subtree(root), vec![root, a, a1, b]);
    }

    #[test]
    fn names_and_paths() {
        let (mut t, root, a, a1, _) = tree();
        assert_eq!(t.path_from(root, a1).as_deref(), Some("/a/a1"));
        assert_eq!(t.find_path(root, "/a/a1"), Some(a1));
        assert_eq!(t.child_by_name(root, "b", Some(0)), t.children(root).get(1).copied());
        let dup = t.insert(root, "a").unwrap();
        assert_eq!(t.child_by_name(root, "a", None), Some(a));
        assert_ne!(dup, a);
        assert_eq!(t.unique_id("grad"), "grad1");
        assert_eq!(t.unique_id("grad"), "grad2");
    }

    #[test]
    fn walks_break_and_skip() {
        let (t, root, a, _, b) = tree();
        let mut seen = Vec::new();
        t.walk_down(root, |id, _| {
            seen.push(id);
            if id == a {
                WalkControl::SkipChildren
            } else {
                WalkControl::Continue
            }
        });
        assert_eq!(seen, vec![root, a, b]);

        let mut ups = 0;
        assert!(!t.walk_up(b, |_, _| {
            ups += 1;
            WalkControl::Break
        }));
        assert_eq!(ups, 1);
    }

    #[test]
    fn deleted_ids_become_invalid() {
        let (mut t, root, a, a1, b) = tree();
        t.delete(a).unwrap();
        assert!(matches!(t.get(a1), Err(LayoutError::InvalidNode(_))));
        assert_eq!(t.children(root), &[b]);
        assert_eq!(t.get(b).unwrap().index, 0);
        assert!(t.delete(a).is_err());
        assert!(t.delete(root).is_err());
    }

    #[test]
    fn reparent_rejects_cycles() {
        let (mut t, _, a, a1, b) = tree();
        assert!(matches!(t.reparent(a, a1), Err(LayoutError::CycleDetected(_))));
        t.reparent(b, a1).unwrap();
        assert!(t.is_ancestor(a, b));
        assert_eq!(t.parent_widget_if(b, |_, n| n.name == "a"), Some(a));
    }

    #[test]
    fn raw_ids_round_trip() {
        let (t, _, a, _, _) = tree();
        assert_eq!(WidgetId::from_raw(a.to_raw()), a);
        assert!(t.contains(a));
    }
}
