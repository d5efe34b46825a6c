//! Widget-level events and listener storage
//!
//! The router turns wire events into [`Event`]s and hands them to the
//! listeners registered on each widget. Listeners get an [`EventCx`] giving
//! mutable access to the tree; anything that must happen after the current
//! listener returns (emitting to another widget, moving focus) is queued and
//! run by the router in order.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use lumen_core::{KeyChord, Modifiers, MouseButton, Point, Vec2};
use lumen_platform::Clipboard;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::flags::{SceneNeeds, StateFlags};
use crate::geom::GeomState;
use crate::settings::Settings;
use crate::tree::{Node, SceneTree, WidgetId};
use crate::widget::Widget;
use crate::widgets::menu::Menu;

/// Widget-level event types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    Scroll,
    Click,
    DoubleClick,
    LongPress,
    LongHover,
    SlideStart,
    SlideMove,
    SlideStop,
    DragStart,
    DragMove,
    Drop,
    ContextMenu,
    Focus,
    DeFocus,
    KeyDown,
    KeyUp,
    /// A registered shortcut fired
    KeyChord,
    /// A widget's value was committed
    Change,
    /// A widget's value is being edited
    Input,
    Custom,
}

/// A widget-level event
#[derive(Clone)]
pub struct Event {
    pub kind: EventType,
    /// Pointer position in scene coordinates
    pub pos: Point,
    /// Where the current press began
    pub start_pos: Point,
    /// Slide/drag offset from `start_pos`, or the wheel delta for scrolls
    pub delta: Vec2,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub chord: Option<KeyChord>,
    pub text: Option<char>,
    pub time: Instant,
    /// Drag source for drops
    pub source: Option<WidgetId>,
    pub payload: Option<Arc<dyn Any + Send + Sync>>,
    handled: bool,
    stop: bool,
}

impl Event {
    pub fn new(kind: EventType, time: Instant) -> Self {
        Self {
            kind,
            pos: Point::ZERO,
            start_pos: Point::ZERO,
            delta: Vec2::ZERO,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
            chord: None,
            text: None,
            time,
            source: None,
            payload: None,
            handled: false,
            stop: false,
        }
    }

    pub fn at(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    /// A copy of this event with a different type
    pub fn derive(&self, kind: EventType) -> Self {
        Self {
            kind,
            handled: false,
            stop: false,
            ..self.clone()
        }
    }

    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Stop the remaining listeners of the current widget
    pub fn set_handled(&mut self) {
        self.handled = true;
    }

    /// Stop the remaining listeners and every later widget
    pub fn set_handled_stop(&mut self) {
        self.handled = true;
        self.stop = true;
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn is_stopped(&self) -> bool {
        self.stop
    }

    pub(crate) fn clear_handled(&mut self) {
        self.handled = false;
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("pos", &self.pos)
            .field("delta", &self.delta)
            .field("chord", &self.chord)
            .field("handled", &self.handled)
            .finish_non_exhaustive()
    }
}

/// A listener callback
///
/// Uses Rc since a scene is single-threaded.
pub type Listener = Rc<dyn Fn(&mut EventCx<'_>, &mut Event)>;

/// Listeners of one widget keyed by event type
#[derive(Clone, Default)]
pub struct Listeners {
    map: FxHashMap<EventType, SmallVec<[Listener; 2]>>,
}

impl Listeners {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn has(&self, kind: EventType) -> bool {
        self.map.contains_key(&kind)
    }

    pub fn on(&mut self, kind: EventType, f: impl Fn(&mut EventCx<'_>, &mut Event) + 'static) {
        self.map.entry(kind).or_default().push(Rc::new(f));
    }

    /// The listeners for `kind` as of now; additions made while they run
    /// take effect on the next event
    pub fn snapshot(&self, kind: EventType) -> SmallVec<[Listener; 2]> {
        self.map.get(&kind).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Something a scene's owner must do on a scene's behalf
#[derive(Clone)]
pub enum SceneRequest {
    /// Open a popup menu for `owner` at `pos` (scene coordinates)
    OpenMenu {
        owner: WidgetId,
        menu: Menu,
        pos: Point,
    },
    /// An item of a menu scene was chosen
    MenuChosen { index: usize },
    ShowTooltip {
        owner: WidgetId,
        text: String,
        pos: Point,
    },
    HideTooltip,
    Snackbar { text: String },
    /// An unhandled Escape: dismiss the top popup or dialog
    Dismiss,
    /// Close this scene's stage
    Close,
}

impl fmt::Debug for SceneRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneRequest::OpenMenu { owner, menu, pos } => f
                .debug_struct("OpenMenu")
                .field("owner", owner)
                .field("items", &menu.len())
                .field("pos", pos)
                .finish(),
            SceneRequest::MenuChosen { index } => {
                f.debug_struct("MenuChosen").field("index", index).finish()
            }
            SceneRequest::ShowTooltip { owner, text, .. } => f
                .debug_struct("ShowTooltip")
                .field("owner", owner)
                .field("text", text)
                .finish(),
            SceneRequest::HideTooltip => f.write_str("HideTooltip"),
            SceneRequest::Snackbar { text } => {
                f.debug_struct("Snackbar").field("text", text).finish()
            }
            SceneRequest::Dismiss => f.write_str("Dismiss"),
            SceneRequest::Close => f.write_str("Close"),
        }
    }
}

/// Work queued by listeners, run after the current listener returns
pub(crate) enum Deferred {
    Emit(WidgetId, Event),
    Focus(Option<WidgetId>),
}

/// The scene state listeners may touch
pub(crate) struct SceneEnv<'a> {
    pub tree: &'a mut SceneTree,
    pub settings: &'a Settings,
    pub clipboard: &'a dyn Clipboard,
    pub needs: &'a mut SceneNeeds,
    pub restyle: &'a mut Vec<WidgetId>,
    pub requests: &'a mut Vec<SceneRequest>,
    pub deferred: &'a mut Vec<Deferred>,
}

/// Context handed to listeners
pub struct EventCx<'a> {
    tree: &'a mut SceneTree,
    settings: &'a Settings,
    clipboard: &'a dyn Clipboard,
    needs: &'a mut SceneNeeds,
    restyle: &'a mut Vec<WidgetId>,
    requests: &'a mut Vec<SceneRequest>,
    deferred: &'a mut Vec<Deferred>,
    id: WidgetId,
}

impl<'a> EventCx<'a> {
    pub(crate) fn new(env: &'a mut SceneEnv<'_>, id: WidgetId) -> Self {
        Self {
            tree: &mut *env.tree,
            settings: env.settings,
            clipboard: env.clipboard,
            needs: &mut *env.needs,
            restyle: &mut *env.restyle,
            requests: &mut *env.requests,
            deferred: &mut *env.deferred,
            id,
        }
    }

    /// The widget receiving the event
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&mut self) -> &mut SceneTree {
        self.tree
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn clipboard(&self) -> &dyn Clipboard {
        self.clipboard
    }

    pub fn node(&self) -> Option<&Node> {
        self.tree.node(self.id)
    }

    pub fn geom(&self) -> Option<&GeomState> {
        self.node().map(|n| &n.geom)
    }

    pub fn is(&self, state: StateFlags) -> bool {
        self.node().is_some_and(|n| n.is(state))
    }

    /// This widget's behavior, downcast
    pub fn widget<T: Widget>(&self) -> Option<&T> {
        self.tree.widget::<T>(self.id)
    }

    pub fn widget_mut<T: Widget>(&mut self) -> Option<&mut T> {
        self.tree.widget_mut::<T>(self.id)
    }

    /// Set or clear a state flag, restyling the widget when it changes
    pub fn set_state(&mut self, state: StateFlags, on: bool) {
        let id = self.id;
        self.set_state_of(id, state, on);
    }

    pub fn set_state_of(&mut self, id: WidgetId, state: StateFlags, on: bool) {
        if let Some(node) = self.tree.node_mut(id) {
            if node.state.contains(state) != on {
                node.state.set(state, on);
                self.restyle.push(id);
                self.needs.insert(SceneNeeds::STYLE | SceneNeeds::RENDER);
            }
        }
    }

    /// Queue `event` for delivery to `target` only
    pub fn emit(&mut self, target: WidgetId, event: Event) {
        self.deferred.push(Deferred::Emit(target, event));
    }

    /// Queue a fresh event of `kind` to this widget
    pub fn send(&mut self, kind: EventType, time: Instant) {
        let id = self.id;
        self.emit(id, Event::new(kind, time));
    }

    pub fn set_focus(&mut self, id: Option<WidgetId>) {
        self.deferred.push(Deferred::Focus(id));
    }

    pub fn request(&mut self, request: SceneRequest) {
        self.requests.push(request);
    }

    pub fn needs_render(&mut self) {
        self.needs.insert(SceneNeeds::RENDER);
    }

    pub fn needs_layout(&mut self) {
        self.needs.insert(SceneNeeds::LAYOUT | SceneNeeds::RENDER);
    }

    /// Restyle this widget and its parts, then lay out again
    pub fn restyle(&mut self) {
        self.restyle.push(self.id);
        self.needs
            .insert(SceneNeeds::STYLE | SceneNeeds::LAYOUT | SceneNeeds::RENDER);
    }

    /// Restyle every widget, for changes that stylers of other widgets read
    pub fn restyle_all(&mut self) {
        self.needs.insert(
            SceneNeeds::REBUILD | SceneNeeds::STYLE | SceneNeeds::LAYOUT | SceneNeeds::RENDER,
        );
    }

    /// Rebuild this widget's parts and children from its model
    pub fn reconfig(&mut self) {
        if let Err(err) = self.tree.reconfig(self.id) {
            tracing::warn!(widget = ?self.id, "reconfig failed: {err}");
        }
        self.needs.insert(SceneNeeds::REBUILD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handled_flags() {
        let mut ev = Event::new(EventType::Click, Instant::now());
        assert!(!ev.is_handled());
        ev.set_handled();
        assert!(ev.is_handled() && !ev.is_stopped());
        let derived = ev.derive(EventType::DoubleClick);
        assert!(!derived.is_handled());
        ev.set_handled_stop();
        assert!(ev.is_stopped());
    }

    #[test]
    fn payload_downcast() {
        let ev = Event::new(EventType::Custom, Instant::now()).with_payload(42u32);
        assert_eq!(ev.payload::<u32>(), Some(&42));
        assert!(ev.payload::<String>().is_none());
    }

    #[test]
    fn snapshot_is_independent() {
        let mut l = Listeners::default();
        l.on(EventType::Click, |_, ev| ev.set_handled());
        let snap = l.snapshot(EventType::Click);
        l.on(EventType::Click, |_, _| {});
        assert_eq!(snap.len(), 1);
        assert_eq!(l.snapshot(EventType::Click).len(), 2);
        assert!(l.snapshot(EventType::Drop).is_empty());
    }
}
