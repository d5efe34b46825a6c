//! Event routing from wire events to widget listeners
//!
//! # Architecture
//!
//! ```text
//! WireEvent (pointer, key, custom)
//!     ↓
//! Router (hit path, hover set, press/slide/drag state, focus, shortcuts)
//!     ↓
//! Event delivered deepest-first along the hit path
//!     ↓
//! listeners mutate widgets through EventCx; deferred work runs after each
//! ```
//!
//! The hit path is the chain of widgets whose clipped box contains the
//! pointer, from the deepest widget up to the root. Ancestors that list an
//! event type as a priority event see it before anything else on the path.
//!
//! Slides and drags capture the pointer: once started, every move goes to
//! the widget that began the gesture, whatever is under the pointer.

use std::time::Instant;

use lumen_core::{Dim, Key, KeyChord, KeyState, Modifiers, MouseButton, Point, Vec2};
use lumen_platform::{CustomEvent, Cursor, KeyEvent, PointerEvent, PointerKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use crate::events::{Deferred, Event, EventCx, EventType, SceneEnv, SceneRequest};
use crate::flags::{Abilities, SceneNeeds, StateFlags};
use crate::scroll::{scroll_into_view, scroll_to, scroll_wheel};
use crate::tree::{SceneTree, WalkControl, WidgetId};
use crate::widgets::menu::Menu;

/// Rounds of deferred work run after one delivery before the rest is dropped
const MAX_DEFERRED_ROUNDS: usize = 16;

/// Widgets under `pos`, deepest first.
///
/// Each level takes the last child whose clipped box contains the point, so
/// later siblings win where they overlap. Parts join the path only when
/// `parts_events` is set and the part has listeners or abilities.
pub fn hit_path(tree: &SceneTree, pos: Point, parts_events: bool) -> Vec<WidgetId> {
    let mut path = Vec::new();
    let root = tree.root();
    let Some(node) = tree.node(root) else {
        return path;
    };
    if node.is(StateFlags::INVISIBLE) || !node.geom.content_bbox.contains(pos) {
        return path;
    }
    let mut current = root;
    path.push(root);
    'descend: loop {
        let Some(node) = tree.node(current) else {
            break;
        };
        for &child in node.children.iter().rev() {
            if hits(tree, child, pos) {
                path.push(child);
                current = child;
                continue 'descend;
            }
        }
        if parts_events {
            if let Some(parts) = node.parts {
                if let Some(part) = hit_part(tree, parts, pos) {
                    path.push(part);
                    current = part;
                    continue 'descend;
                }
            }
        }
        break;
    }
    path.reverse();
    path
}

fn hits(tree: &SceneTree, id: WidgetId, pos: Point) -> bool {
    tree.node(id)
        .is_some_and(|n| !n.is(StateFlags::INVISIBLE) && n.geom.content_bbox.contains(pos))
}

fn hit_part(tree: &SceneTree, parts: WidgetId, pos: Point) -> Option<WidgetId> {
    tree.children(parts).iter().rev().copied().find(|&p| {
        hits(tree, p, pos)
            && tree
                .node(p)
                .is_some_and(|n| !n.listeners.is_empty() || !n.abilities.is_empty())
    })
}

/// `id` followed by its widget ancestors
fn ancestry(tree: &SceneTree, id: WidgetId) -> Vec<WidgetId> {
    let mut out = vec![id];
    let mut cur = id;
    while let Some(p) = tree.parent_widget(cur) {
        out.push(p);
        cur = p;
    }
    out
}

#[derive(Clone, Copy, Debug)]
struct Press {
    target: Option<WidgetId>,
    button: MouseButton,
    pos: Point,
    time: Instant,
    /// Moved too far for a long press
    moved: bool,
    long_fired: bool,
}

#[derive(Clone, Copy, Debug)]
enum Capture {
    Slide(WidgetId),
    Drag(WidgetId),
    /// Dragging a scrollbar thumb
    Thumb {
        id: WidgetId,
        dim: Dim,
        grab: f32,
        from: f32,
        per_pixel: f32,
    },
}

#[derive(Clone, Copy, Debug)]
struct LastClick {
    target: WidgetId,
    time: Instant,
    pos: Point,
}

#[derive(Clone, Copy, Debug)]
struct HoverTimer {
    target: WidgetId,
    since: Instant,
    origin: Point,
    fired: bool,
}

/// Per-scene input state
pub struct Router {
    pos: Point,
    hovered: FxHashSet<WidgetId>,
    focus: Option<WidgetId>,
    press: Option<Press>,
    capture: Option<Capture>,
    last_click: Option<LastClick>,
    hover: Option<HoverTimer>,
    shortcuts: FxHashMap<KeyChord, WidgetId>,
    cursor: Cursor,
    last_time: Instant,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            pos: Point::ZERO,
            hovered: FxHashSet::default(),
            focus: None,
            press: None,
            capture: None,
            last_click: None,
            hover: None,
            shortcuts: FxHashMap::default(),
            cursor: Cursor::Arrow,
            last_time: Instant::now(),
        }
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focus
    }

    pub fn is_hovered(&self, id: WidgetId) -> bool {
        self.hovered.contains(&id)
    }

    pub fn hovered(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.hovered.iter().copied()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn pointer_pos(&self) -> Point {
        self.pos
    }

    /// Whether a slide, drag or thumb drag owns the pointer
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Route `chord` to `target` when the focused widget leaves it unhandled
    pub fn add_shortcut(&mut self, chord: KeyChord, target: WidgetId) -> Option<WidgetId> {
        self.shortcuts.insert(chord, target)
    }

    pub fn remove_shortcut(&mut self, chord: &KeyChord) -> Option<WidgetId> {
        self.shortcuts.remove(chord)
    }

    pub fn shortcut(&self, chord: &KeyChord) -> Option<WidgetId> {
        self.shortcuts.get(chord).copied()
    }

    /// Drop references to widgets that left the tree
    pub(crate) fn prune(&mut self, tree: &SceneTree) {
        self.hovered.retain(|id| tree.contains(*id));
        if self.focus.is_some_and(|f| !tree.contains(f)) {
            self.focus = None;
        }
        if self.press.and_then(|p| p.target).is_some_and(|t| !tree.contains(t)) {
            self.press = None;
        }
        let captured = match self.capture {
            Some(Capture::Slide(id) | Capture::Drag(id) | Capture::Thumb { id, .. }) => Some(id),
            None => None,
        };
        if captured.is_some_and(|id| !tree.contains(id)) {
            self.capture = None;
        }
        if self.hover.is_some_and(|h| !tree.contains(h.target)) {
            self.hover = None;
        }
        self.shortcuts.retain(|_, id| tree.contains(*id));
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Run the listeners of one widget; no deferred work
    fn call(&mut self, env: &mut SceneEnv<'_>, id: WidgetId, ev: &mut Event) {
        let Some(node) = env.tree.node(id) else {
            return;
        };
        let exempt = matches!(ev.kind, EventType::MouseLeave | EventType::DeFocus);
        if node.is_disabled() && !exempt {
            return;
        }
        let listeners = node.listeners.snapshot(ev.kind);
        ev.clear_handled();
        for listener in listeners {
            let mut cx = EventCx::new(env, id);
            listener(&mut cx, ev);
            if ev.is_handled() {
                break;
            }
        }
    }

    /// Deliver to one widget, then run the work its listeners queued
    fn deliver(&mut self, env: &mut SceneEnv<'_>, id: WidgetId, ev: &mut Event) {
        self.call(env, id, ev);
        self.run_deferred(env);
    }

    /// Deliver along `path` (deepest first) after priority ancestors.
    /// Returns whether any widget handled the event.
    fn bubble(&mut self, env: &mut SceneEnv<'_>, path: &[WidgetId], ev: &mut Event) -> bool {
        let mut handled = false;
        let kind = ev.kind;
        let priority: Vec<WidgetId> = path
            .iter()
            .rev()
            .copied()
            .filter(|&id| {
                env.tree
                    .node(id)
                    .is_some_and(|n| n.priority_events.contains(&kind))
            })
            .collect();
        for &id in &priority {
            self.deliver(env, id, ev);
            handled |= ev.is_handled();
            if ev.is_stopped() {
                return handled;
            }
        }
        for &id in path {
            if priority.contains(&id) {
                continue;
            }
            self.deliver(env, id, ev);
            handled |= ev.is_handled();
            if ev.is_stopped() {
                break;
            }
        }
        handled
    }

    fn run_deferred(&mut self, env: &mut SceneEnv<'_>) {
        for _ in 0..MAX_DEFERRED_ROUNDS {
            if env.deferred.is_empty() {
                return;
            }
            let work: Vec<Deferred> = env.deferred.drain(..).collect();
            for item in work {
                match item {
                    Deferred::Emit(target, mut ev) => self.call(env, target, &mut ev),
                    Deferred::Focus(id) => self.focus_without_deferred(env, id),
                }
            }
        }
        warn!(
            pending = env.deferred.len(),
            "dropping deferred work after {MAX_DEFERRED_ROUNDS} rounds"
        );
        env.deferred.clear();
    }

    fn set_state(env: &mut SceneEnv<'_>, id: WidgetId, state: StateFlags, on: bool) {
        if let Some(node) = env.tree.node_mut(id) {
            if node.state.contains(state) != on {
                node.state.set(state, on);
                env.restyle.push(id);
                env.needs.insert(SceneNeeds::STYLE | SceneNeeds::RENDER);
            }
        }
    }

    fn event(&self, kind: EventType, pos: Point, time: Instant) -> Event {
        let mut ev = Event::new(kind, time).at(pos);
        if let Some(p) = &self.press {
            ev.start_pos = p.pos;
            ev.button = p.button;
            ev.delta = pos.sub(p.pos);
        }
        ev
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Move focus to `id`, sending DeFocus then Focus
    pub(crate) fn set_focus(&mut self, env: &mut SceneEnv<'_>, id: Option<WidgetId>) {
        self.focus_without_deferred(env, id);
        self.run_deferred(env);
    }

    fn focus_without_deferred(&mut self, env: &mut SceneEnv<'_>, id: Option<WidgetId>) {
        let id = id.filter(|&i| env.tree.contains(i));
        if id == self.focus {
            return;
        }
        let time = self.last_time;
        if let Some(old) = self.focus.take() {
            Self::set_state(env, old, StateFlags::FOCUSED, false);
            self.call(env, old, &mut Event::new(EventType::DeFocus, time));
        }
        self.focus = id;
        if let Some(new) = id {
            debug!(widget = ?new, "focus");
            Self::set_state(env, new, StateFlags::FOCUSED, true);
            self.call(env, new, &mut Event::new(EventType::Focus, time));
            if scroll_into_view(env.tree, new) {
                env.needs.insert(SceneNeeds::POSITION | SceneNeeds::RENDER);
            }
        }
    }

    /// Focusable widgets in depth-first order
    pub fn focus_chain(tree: &SceneTree) -> Vec<WidgetId> {
        let mut out = Vec::new();
        tree.walk_down(tree.root(), |id, node| {
            let clipped_out = node.geom.content_bbox.is_empty() && !node.geom.total_bbox.is_empty();
            if node.is(StateFlags::INVISIBLE) || node.is_disabled() || clipped_out {
                return WalkControl::SkipChildren;
            }
            if node.can(Abilities::FOCUSABLE) {
                out.push(id);
            }
            WalkControl::Continue
        });
        out
    }

    fn focus_step(&mut self, env: &mut SceneEnv<'_>, forward: bool) {
        let chain = Self::focus_chain(env.tree);
        if chain.is_empty() {
            return;
        }
        let n = chain.len();
        let next = match self.focus.and_then(|f| chain.iter().position(|&c| c == f)) {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None if forward => 0,
            None => n - 1,
        };
        self.set_focus(env, Some(chain[next]));
    }

    pub(crate) fn focus_next(&mut self, env: &mut SceneEnv<'_>) {
        self.focus_step(env, true);
    }

    pub(crate) fn focus_prev(&mut self, env: &mut SceneEnv<'_>) {
        self.focus_step(env, false);
    }

    pub(crate) fn focus_first(&mut self, env: &mut SceneEnv<'_>) {
        let first = Self::focus_chain(env.tree).first().copied();
        self.set_focus(env, first);
    }

    pub(crate) fn focus_last(&mut self, env: &mut SceneEnv<'_>) {
        let last = Self::focus_chain(env.tree).last().copied();
        self.set_focus(env, last);
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    pub(crate) fn pointer(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) {
        self.last_time = pe.time;
        match pe.kind {
            PointerKind::Move | PointerKind::Enter => self.pointer_move(env, pe),
            PointerKind::Down => self.pointer_down(env, pe),
            PointerKind::Up => self.pointer_up(env, pe),
            PointerKind::Scroll => self.pointer_scroll(env, pe),
            PointerKind::Leave => self.pointer_leave(env, pe.time),
        }
    }

    fn update_hover(&mut self, env: &mut SceneEnv<'_>, path: &[WidgetId], pos: Point, time: Instant) {
        let now: FxHashSet<WidgetId> = path.iter().copied().collect();
        let left: Vec<WidgetId> = self.hovered.difference(&now).copied().collect();
        let entered: Vec<WidgetId> = path.iter().rev().copied().filter(|id| !self.hovered.contains(id)).collect();
        self.hovered = now;
        for id in left {
            Self::set_state(env, id, StateFlags::HOVERED, false);
            self.deliver(env, id, &mut Event::new(EventType::MouseLeave, time).at(pos));
        }
        for id in entered {
            Self::set_state(env, id, StateFlags::HOVERED, true);
            self.deliver(env, id, &mut Event::new(EventType::MouseEnter, time).at(pos));
        }
    }

    fn update_cursor(&mut self, tree: &SceneTree, path: &[WidgetId]) {
        if self.capture.is_some() {
            return;
        }
        self.cursor = path
            .iter()
            .filter_map(|&id| tree.node(id))
            .map(|n| n.style.cursor)
            .find(|c| *c != Cursor::Arrow)
            .unwrap_or(Cursor::Arrow);
    }

    fn end_long_hover(&mut self, env: &mut SceneEnv<'_>) {
        if let Some(h) = self.hover.take() {
            if h.fired {
                Self::set_state(env, h.target, StateFlags::LONG_HOVERED, false);
                env.requests.push(SceneRequest::HideTooltip);
            }
        }
    }

    fn track_hover(&mut self, env: &mut SceneEnv<'_>, path: &[WidgetId], pos: Point, time: Instant) {
        let target = path.iter().copied().find(|&id| {
            env.tree
                .node(id)
                .is_some_and(|n| n.tooltip.is_some() || n.can(Abilities::LONG_HOVERABLE))
        });
        let keep = match (&self.hover, target) {
            (Some(h), Some(t)) => {
                h.target == t && pos.distance(h.origin) <= env.settings.hover_max_distance
            }
            _ => false,
        };
        if keep {
            return;
        }
        if self.hover.is_some_and(|h| Some(h.target) == target && h.fired) {
            // still over the widget showing its tooltip
            return;
        }
        self.end_long_hover(env);
        self.hover = target.map(|t| HoverTimer {
            target: t,
            since: time,
            origin: pos,
            fired: false,
        });
    }

    fn pointer_move(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) {
        let pos = pe.pos;
        self.pos = pos;

        match self.capture {
            Some(Capture::Slide(id)) => {
                let mut ev = self.event(EventType::SlideMove, pos, pe.time);
                ev.modifiers = pe.modifiers;
                self.deliver(env, id, &mut ev);
                return;
            }
            Some(Capture::Thumb {
                id,
                dim,
                grab,
                from,
                per_pixel,
            }) => {
                let offset = from + (pos.dim(dim) - grab) * per_pixel;
                if scroll_to(env.tree, id, dim, offset) {
                    env.needs.insert(SceneNeeds::POSITION | SceneNeeds::RENDER);
                }
                return;
            }
            Some(Capture::Drag(id)) => {
                let mut ev = self.event(EventType::DragMove, pos, pe.time);
                ev.source = Some(id);
                self.deliver(env, id, &mut ev);
            }
            None => {
                if self.start_gesture(env, pe) {
                    return;
                }
            }
        }

        let path = hit_path(env.tree, pos, env.settings.parts_receive_events);
        self.update_hover(env, &path, pos, pe.time);
        let mut ev = self.event(EventType::MouseMove, pos, pe.time);
        ev.modifiers = pe.modifiers;
        self.bubble(env, &path, &mut ev);
        if self.press.is_none() {
            self.track_hover(env, &path, pos, pe.time);
        }
        self.update_cursor(env.tree, &path);
    }

    /// Start a slide or drag once the press has moved far enough
    fn start_gesture(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) -> bool {
        let Some(press) = self.press.as_mut() else {
            return false;
        };
        if pe.buttons.is_empty() {
            return false;
        }
        let dist = pe.pos.distance(press.pos);
        if dist > env.settings.hover_max_distance {
            press.moved = true;
        }
        let (target, held) = match press.target {
            Some(t) => (t, pe.time.saturating_duration_since(press.time)),
            None => return false,
        };
        let Some((slideable, draggable)) = env
            .tree
            .node(target)
            .map(|n| (n.can(Abilities::SLIDEABLE), n.can(Abilities::DRAGGABLE)))
        else {
            return false;
        };
        let settings = env.settings;
        if slideable && dist > settings.slide_start_distance {
            trace!(widget = ?target, "slide start");
            self.capture = Some(Capture::Slide(target));
            Self::set_state(env, target, StateFlags::SLIDING, true);
            let mut ev = self.event(EventType::SlideStart, pe.pos, pe.time);
            self.deliver(env, target, &mut ev);
            let mut ev = self.event(EventType::SlideMove, pe.pos, pe.time);
            self.deliver(env, target, &mut ev);
            return true;
        }
        if draggable && dist > settings.drag_start_distance && held >= settings.drag_start() {
            trace!(widget = ?target, "drag start");
            self.capture = Some(Capture::Drag(target));
            Self::set_state(env, target, StateFlags::DRAGGING, true);
            let mut ev = self.event(EventType::DragStart, pe.pos, pe.time);
            ev.source = Some(target);
            self.deliver(env, target, &mut ev);
        }
        false
    }

    /// A scrollbar thumb on the path under `pos`
    fn thumb_at(tree: &SceneTree, path: &[WidgetId], pos: Point) -> Option<Capture> {
        path.iter().find_map(|&id| {
            let g = &tree.node(id)?.geom;
            [Dim::X, Dim::Y].into_iter().find_map(|dim| {
                let bar = g.scrollbars.dim(dim)?;
                bar.thumb.contains(pos).then(|| Capture::Thumb {
                    id,
                    dim,
                    grab: pos.dim(dim),
                    from: match dim {
                        Dim::X => g.scroll.x,
                        Dim::Y => g.scroll.y,
                    },
                    per_pixel: bar.scroll_per_pixel(g.max_scroll(dim)),
                })
            })
        })
    }

    fn pointer_down(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) {
        let pos = pe.pos;
        self.pos = pos;
        self.end_long_hover(env);
        env.requests.push(SceneRequest::HideTooltip);

        let path = hit_path(env.tree, pos, env.settings.parts_receive_events);
        self.update_hover(env, &path, pos, pe.time);

        if pe.button == MouseButton::Left {
            if let Some(thumb) = Self::thumb_at(env.tree, &path, pos) {
                self.capture = Some(thumb);
                self.press = None;
                return;
            }
        }

        let target = path.iter().copied().find(|&id| {
            env.tree
                .node(id)
                .is_some_and(|n| n.can_any(Abilities::PRESS_TARGET) && !n.is_disabled())
        });
        self.press = Some(Press {
            target,
            button: pe.button,
            pos,
            time: pe.time,
            moved: false,
            long_fired: false,
        });
        if let Some(t) = target {
            Self::set_state(env, t, StateFlags::ACTIVE, true);
        }

        let focusable = path.iter().copied().find(|&id| {
            env.tree
                .node(id)
                .is_some_and(|n| n.can(Abilities::FOCUSABLE) && !n.is_disabled())
        });
        if focusable.is_some() || self.focus.is_some_and(|f| !path.contains(&f)) {
            self.set_focus(env, focusable);
        }

        let mut ev = self.event(EventType::MouseDown, pos, pe.time);
        ev.button = pe.button;
        ev.modifiers = pe.modifiers;
        let handled = self.bubble(env, &path, &mut ev);

        if pe.button == MouseButton::Right && !handled {
            self.context_menu(env, &path, pos, pe.time);
        }
    }

    fn context_menu(&mut self, env: &mut SceneEnv<'_>, path: &[WidgetId], pos: Point, time: Instant) {
        let mut ev = Event::new(EventType::ContextMenu, time).at(pos);
        ev.button = MouseButton::Right;
        if self.bubble(env, path, &mut ev) {
            return;
        }
        let Some((owner, menu, at)) = path.iter().find_map(|&id| {
            let node = env.tree.node(id)?;
            if node.context_menus.is_empty() {
                return None;
            }
            let menu = Menu::from_builders(&node.context_menus);
            let at = node
                .widget()
                .map_or(pos, |w| w.context_menu_pos(&node.geom, pos));
            Some((id, menu, at))
        }) else {
            return;
        };
        if !menu.is_empty() {
            env.requests.push(SceneRequest::OpenMenu {
                owner,
                menu,
                pos: at,
            });
        }
    }

    fn pointer_up(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) {
        let pos = pe.pos;
        self.pos = pos;
        let path = hit_path(env.tree, pos, env.settings.parts_receive_events);
        let capture = self.capture.take();

        match capture {
            Some(Capture::Slide(id)) => {
                Self::set_state(env, id, StateFlags::SLIDING, false);
                let mut ev = self.event(EventType::SlideStop, pos, pe.time);
                self.deliver(env, id, &mut ev);
            }
            Some(Capture::Drag(id)) => {
                Self::set_state(env, id, StateFlags::DRAGGING, false);
                let target = path.iter().copied().find(|&t| {
                    t != id
                        && env
                            .tree
                            .node(t)
                            .is_some_and(|n| n.can(Abilities::DROPPABLE) && !n.is_disabled())
                });
                if let Some(t) = target {
                    let mut ev = self.event(EventType::Drop, pos, pe.time);
                    ev.source = Some(id);
                    self.deliver(env, t, &mut ev);
                }
            }
            Some(Capture::Thumb { .. }) | None => {}
        }

        let press = self.press.take();
        self.update_hover(env, &path, pos, pe.time);
        let mut ev = self.event(EventType::MouseUp, pos, pe.time);
        ev.button = pe.button;
        ev.modifiers = pe.modifiers;
        if let Some(p) = &press {
            ev.start_pos = p.pos;
        }
        self.bubble(env, &path, &mut ev);

        let Some(press) = press else {
            self.update_cursor(env.tree, &path);
            return;
        };
        let Some(target) = press.target else {
            self.update_cursor(env.tree, &path);
            return;
        };
        Self::set_state(env, target, StateFlags::ACTIVE, false);

        let is_click = capture.is_none()
            && !press.long_fired
            && press.button == MouseButton::Left
            && pe.button == MouseButton::Left
            && pos.distance(press.pos) <= env.settings.click_max_distance
            && path.contains(&target);
        if is_click {
            let from = path.iter().position(|&id| id == target).unwrap_or(0);
            let chain = &path[from..];
            let mut ev = Event::new(EventType::Click, pe.time).at(pos);
            ev.start_pos = press.pos;
            ev.modifiers = pe.modifiers;
            self.bubble(env, chain, &mut ev);

            let double = self.last_click.is_some_and(|c| {
                c.target == target
                    && pe.time.saturating_duration_since(c.time) <= env.settings.double_click()
                    && pos.distance(c.pos) <= env.settings.click_max_distance
            });
            if double {
                self.last_click = None;
                let mut ev = Event::new(EventType::DoubleClick, pe.time).at(pos);
                ev.modifiers = pe.modifiers;
                self.bubble(env, chain, &mut ev);
            } else {
                self.last_click = Some(LastClick {
                    target,
                    time: pe.time,
                    pos,
                });
            }
        }
        self.update_cursor(env.tree, &path);
    }

    fn pointer_scroll(&mut self, env: &mut SceneEnv<'_>, pe: &PointerEvent) {
        self.pos = pe.pos;
        let path = hit_path(env.tree, pe.pos, env.settings.parts_receive_events);
        let mut ev = Event::new(EventType::Scroll, pe.time).at(pe.pos);
        ev.delta = pe.delta;
        ev.modifiers = pe.modifiers;
        if self.bubble(env, &path, &mut ev) {
            return;
        }
        let f = env.settings.scroll_wheel_factor;
        let delta = Vec2::new(pe.delta.x * f, pe.delta.y * f);
        if let Some(id) = scroll_wheel(env.tree, &path, delta) {
            trace!(widget = ?id, ?delta, "scrolled");
            env.needs.insert(SceneNeeds::POSITION | SceneNeeds::RENDER);
        }
    }

    fn pointer_leave(&mut self, env: &mut SceneEnv<'_>, time: Instant) {
        self.update_hover(env, &[], self.pos, time);
        self.end_long_hover(env);
        self.cursor = Cursor::Arrow;
    }

    /// Abandon any press, slide or drag in progress, as when a modal popup
    /// takes over input
    pub(crate) fn cancel_gestures(&mut self, env: &mut SceneEnv<'_>) {
        if let Some(t) = self.press.take().and_then(|p| p.target) {
            Self::set_state(env, t, StateFlags::ACTIVE, false);
        }
        match self.capture.take() {
            Some(Capture::Slide(id)) => Self::set_state(env, id, StateFlags::SLIDING, false),
            Some(Capture::Drag(id)) => Self::set_state(env, id, StateFlags::DRAGGING, false),
            _ => {}
        }
        self.end_long_hover(env);
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Fire long-press and long-hover timers that have elapsed at `now`
    pub(crate) fn tick(&mut self, env: &mut SceneEnv<'_>, now: Instant) {
        self.last_time = now;
        if let Some(press) = self.press {
            let due = now.saturating_duration_since(press.time) >= env.settings.long_press();
            if due && !press.moved && !press.long_fired && self.capture.is_none() {
                if let Some(t) = press.target.filter(|&t| {
                    env.tree.node(t).is_some_and(|n| n.can(Abilities::LONG_PRESSABLE))
                }) {
                    if let Some(p) = self.press.as_mut() {
                        p.long_fired = true;
                    }
                    let chain = ancestry(env.tree, t);
                    let mut ev = Event::new(EventType::LongPress, now).at(press.pos);
                    ev.start_pos = press.pos;
                    self.bubble(env, &chain, &mut ev);
                }
            }
        }

        let Some(h) = self.hover else {
            return;
        };
        if h.fired || now.saturating_duration_since(h.since) < env.settings.long_hover() {
            return;
        }
        if let Some(timer) = self.hover.as_mut() {
            timer.fired = true;
        }
        Self::set_state(env, h.target, StateFlags::LONG_HOVERED, true);
        let mut ev = Event::new(EventType::LongHover, now).at(self.pos);
        self.deliver(env, h.target, &mut ev);
        let text = env.tree.node(h.target).and_then(|n| {
            let w = n.widget()?;
            w.widget_tooltip(n.tooltip.as_deref(), self.pos)
        });
        let text = text.or_else(|| env.tree.node(h.target).and_then(|n| n.tooltip.clone()));
        if let Some(text) = text {
            env.requests.push(SceneRequest::ShowTooltip {
                owner: h.target,
                text,
                pos: self.pos,
            });
        }
    }

    // ========================================================================
    // Keys and custom events
    // ========================================================================

    pub(crate) fn key(&mut self, env: &mut SceneEnv<'_>, ke: &KeyEvent) {
        self.last_time = ke.time;
        let kind = match ke.state {
            KeyState::Pressed => EventType::KeyDown,
            KeyState::Released => EventType::KeyUp,
        };
        let mut ev = Event::new(kind, ke.time).at(self.pos);
        ev.chord = Some(ke.chord);
        ev.text = ke.text;
        ev.modifiers = ke.chord.modifiers;

        let chain = self
            .focus
            .filter(|&f| env.tree.contains(f))
            .map(|f| ancestry(env.tree, f))
            .unwrap_or_default();
        let handled = self.bubble(env, &chain, &mut ev);
        if handled || ke.state == KeyState::Released {
            return;
        }

        let chord = ke.chord;
        if let Some(f) = self.focus {
            let activates = chord.modifiers.is_empty()
                && matches!(chord.key, Key::Enter | Key::Space)
                && env.tree.node(f).is_some_and(|n| {
                    n.can_any(Abilities::ACTIVATABLE | Abilities::CHECKABLE)
                });
            if activates {
                let mut click = Event::new(EventType::Click, ke.time).at(self.pos);
                self.bubble(env, &chain, &mut click);
                return;
            }
        }

        if let Some(target) = self.shortcuts.get(&chord).copied() {
            if env.tree.contains(target) {
                debug!(%chord, widget = ?target, "shortcut");
                let mut ev = Event::new(EventType::KeyChord, ke.time).at(self.pos);
                ev.chord = Some(chord);
                self.deliver(env, target, &mut ev);
                if !ev.is_handled() {
                    let mut click = Event::new(EventType::Click, ke.time).at(self.pos);
                    self.deliver(env, target, &mut click);
                }
                return;
            }
        }

        match chord.key {
            Key::Tab if chord.modifiers == Modifiers::SHIFT => self.focus_prev(env),
            Key::Tab if chord.modifiers.is_empty() => self.focus_next(env),
            Key::Escape => env.requests.push(SceneRequest::Dismiss),
            _ => {}
        }
    }

    pub(crate) fn custom(&mut self, env: &mut SceneEnv<'_>, ce: &CustomEvent) {
        let target = ce
            .target
            .map(WidgetId::from_raw)
            .filter(|&id| env.tree.contains(id))
            .unwrap_or_else(|| env.tree.root());
        let mut ev = Event::new(EventType::Custom, self.last_time).at(self.pos);
        ev.payload = Some(ce.payload.clone());
        let chain = ancestry(env.tree, target);
        self.bubble(env, &chain, &mut ev);
    }
}

#[cfg(test)]
mod tests;
