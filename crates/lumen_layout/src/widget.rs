//! The widget capability trait and the handle used to configure widgets
//!
//! A widget is a node in the [`SceneTree`] plus an optional behavior object
//! implementing [`Widget`]. Behavior supplies intrinsic content size, painting
//! and a few query hooks; everything else (styling, events, children) is
//! installed on the node through a [`WidgetMut`] during `init` and `config`.
//!
//! # Example
//!
//! ```ignore
//! struct Badge(String);
//!
//! impl Widget for Badge {
//!     fn type_name(&self) -> &'static str { "badge" }
//!
//!     fn init(&mut self, w: &mut WidgetMut<'_>) {
//!         w.styler(|s| { s.set_padding(Length::dp(4.0)); });
//!         w.on(EventType::Click, |cx, ev| { ev.set_handled(); cx.needs_render(); });
//!     }
//! }
//! ```

use std::any::Any;
use std::rc::Rc;

use lumen_core::{Point, Size};
use lumen_paint::{PaintContext, Pixmap};

use crate::css::StyleSheet;
use crate::error::Result;
use crate::events::{Event, EventCx, EventType};
use crate::flags::{Abilities, StateFlags};
use crate::geom::GeomState;
use crate::style::Style;
use crate::text::TextMeasurer;
use crate::tree::{Node, SceneTree, WidgetId};
use crate::widgets::menu::Menu;

/// Downcasting support for widget behavior objects
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A function that mutates a style record
pub type StylerFn = Rc<dyn Fn(&mut Style)>;

/// The three ordered styler groups of a widget
#[derive(Clone, Default)]
pub struct Stylers {
    pub first: Vec<StylerFn>,
    pub main: Vec<StylerFn>,
    pub last: Vec<StylerFn>,
}

impl Stylers {
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.main.is_empty() && self.last.is_empty()
    }

    pub fn len(&self) -> usize {
        self.first.len() + self.main.len() + self.last.len()
    }
}

/// Inputs for measuring intrinsic content
pub struct MeasureCx<'a> {
    pub measurer: &'a dyn TextMeasurer,
    pub style: &'a Style,
}

/// Inputs for painting a widget's own content
pub struct RenderCx<'a, 'p> {
    pub paint: &'a mut PaintContext<'p>,
    pub style: &'a Style,
    pub geom: &'a GeomState,
    pub state: StateFlags,
    pub measurer: &'a dyn TextMeasurer,
}

/// Behavior of one widget type.
///
/// Every hook has a default, so a plain container needs only `type_name`.
pub trait Widget: AsAny {
    /// Type tag, also the CSS element name
    fn type_name(&self) -> &'static str;

    /// Install default stylers and listeners; runs once when added
    fn init(&mut self, _w: &mut WidgetMut<'_>) {}

    /// Build parts and children from the widget's current model
    fn config(&mut self, _w: &mut WidgetMut<'_>) -> Result<()> {
        Ok(())
    }

    /// Size of the widget's own content, excluding padding and border.
    ///
    /// `width` is the available content width once the parent has
    /// allocated space; `None` during the bottom-up sizing pass.
    fn content_size(&self, _cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        Size::ZERO
    }

    /// Whether the content reshapes to the allocated width
    fn is_flexible(&self, _style: &Style) -> bool {
        false
    }

    /// Paint the widget's own content inside `cx.geom.content`
    fn render(&self, _cx: &mut RenderCx<'_, '_>) {}

    /// Tooltip for a pointer at `pos`
    fn widget_tooltip(&self, tooltip: Option<&str>, _pos: Point) -> Option<String> {
        tooltip.map(str::to_string)
    }

    /// Where a context menu opened at `pointer` should appear
    fn context_menu_pos(&self, _geom: &GeomState, pointer: Point) -> Point {
        pointer
    }

    /// Image pushed to its own drawer slot instead of painting into the scene
    fn direct_upload(&self) -> Option<&Pixmap> {
        None
    }
}

/// Mutable access to one widget during construction
pub struct WidgetMut<'t> {
    tree: &'t mut SceneTree,
    id: WidgetId,
}

impl<'t> WidgetMut<'t> {
    pub(crate) fn new(tree: &'t mut SceneTree, id: WidgetId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&mut self) -> &mut SceneTree {
        self.tree
    }

    fn node(&mut self) -> Option<&mut Node> {
        self.tree.node_mut(self.id)
    }

    /// Add a styler to the main group
    pub fn styler(&mut self, f: impl Fn(&mut Style) + 'static) -> &mut Self {
        if let Some(n) = self.node() {
            n.stylers.main.push(Rc::new(f));
        }
        self
    }

    /// Add a styler that runs before stylesheet rules
    pub fn first_styler(&mut self, f: impl Fn(&mut Style) + 'static) -> &mut Self {
        if let Some(n) = self.node() {
            n.stylers.first.push(Rc::new(f));
        }
        self
    }

    /// Add a styler that runs after every other styler
    pub fn final_styler(&mut self, f: impl Fn(&mut Style) + 'static) -> &mut Self {
        if let Some(n) = self.node() {
            n.stylers.last.push(Rc::new(f));
        }
        self
    }

    /// Style the parts container
    pub fn parts_styler(&mut self, f: impl Fn(&mut Style) + 'static) -> Result<&mut Self> {
        let parts = self.tree.ensure_parts(self.id)?;
        if let Some(n) = self.tree.node_mut(parts) {
            n.stylers.main.push(Rc::new(f));
        }
        Ok(self)
    }

    /// Register a listener
    pub fn on(
        &mut self,
        kind: EventType,
        f: impl Fn(&mut EventCx<'_>, &mut Event) + 'static,
    ) -> &mut Self {
        if let Some(n) = self.node() {
            n.listeners.on(kind, f);
        }
        self
    }

    /// Receive `kind` before any descendant on the hit path
    pub fn priority(&mut self, kind: EventType) -> &mut Self {
        if let Some(n) = self.node() {
            if !n.priority_events.contains(&kind) {
                n.priority_events.push(kind);
            }
        }
        self
    }

    pub fn set_abilities(&mut self, abilities: Abilities) -> &mut Self {
        if let Some(n) = self.node() {
            n.abilities |= abilities;
        }
        self
    }

    pub fn set_state(&mut self, state: StateFlags, on: bool) -> &mut Self {
        if let Some(n) = self.node() {
            n.state.set(state, on);
        }
        self
    }

    pub fn tooltip(&mut self, text: impl Into<String>) -> &mut Self {
        if let Some(n) = self.node() {
            n.tooltip = Some(text.into());
        }
        self
    }

    pub fn class(&mut self, class: impl Into<String>) -> &mut Self {
        if let Some(n) = self.node() {
            n.class = class.into();
        }
        self
    }

    pub fn css(&mut self, sheet: StyleSheet) -> &mut Self {
        if let Some(n) = self.node() {
            n.css = Some(Rc::new(sheet));
        }
        self
    }

    pub fn context_menu(&mut self, builder: impl Fn(&mut Menu) + 'static) -> &mut Self {
        if let Some(n) = self.node() {
            n.context_menus.push(Rc::new(builder));
        }
        self
    }

    /// Add a child widget, running its `init` and `config`
    pub fn add_child(&mut self, name: &str, widget: impl Widget) -> Result<WidgetId> {
        self.tree.add(self.id, name, widget)
    }

    /// Add a widget to the parts subtree
    pub fn add_part(&mut self, name: &str, widget: impl Widget) -> Result<WidgetId> {
        self.tree.add_part(self.id, name, widget)
    }

    /// Existing part by name, for `config` run more than once
    pub fn part(&self, name: &str) -> Option<WidgetId> {
        let parts = self.tree.node(self.id)?.parts?;
        self.tree.child_by_name(parts, name, None)
    }

    pub fn widget<T: Widget>(&mut self) -> Option<&mut T> {
        self.tree.widget_mut::<T>(self.id)
    }
}

impl SceneTree {
    /// Add `widget` as the last child of `parent`
    pub fn add(&mut self, parent: WidgetId, name: &str, widget: impl Widget) -> Result<WidgetId> {
        let id = self.insert(parent, name)?;
        self.install(id, Box::new(widget))?;
        Ok(id)
    }

    /// Add `widget` to the parts of `owner`
    pub fn add_part(&mut self, owner: WidgetId, name: &str, widget: impl Widget) -> Result<WidgetId> {
        let parts = self.ensure_parts(owner)?;
        let id = self.insert(parts, name)?;
        self.install(id, Box::new(widget))?;
        Ok(id)
    }

    /// Attach behavior to an existing node and run its lifecycle hooks
    pub(crate) fn install(&mut self, id: WidgetId, mut widget: Box<dyn Widget>) -> Result<()> {
        self.get(id)?;
        if let Some(node) = self.node_mut(id) {
            node.type_name = widget.type_name();
        }
        let mut w = WidgetMut::new(self, id);
        widget.init(&mut w);
        let config = widget.config(&mut w);
        self.put_widget(id, widget);
        config
    }

    /// Re-run `config` after the widget's model changed
    pub fn reconfig(&mut self, id: WidgetId) -> Result<()> {
        let Some(mut widget) = self.take_widget(id) else {
            return Ok(());
        };
        let result = widget.config(&mut WidgetMut::new(self, id));
        self.put_widget(id, widget);
        result
    }
}
