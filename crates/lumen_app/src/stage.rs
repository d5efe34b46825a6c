//! Stages: top-level surfaces showing one scene each

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use lumen_core::{Point, Rect, Size};
use lumen_layout::widgets::Menu;
use lumen_layout::{Scene, WidgetId};

use crate::manager::StageManager;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Fills the render window
    Window,
    /// Centered over the window, modal
    Dialog,
    /// Slides up from the bottom edge, modal
    Sheet,
    Menu,
    Tooltip,
    Snackbar,
    /// Suggestion list under a text field
    Completer,
}

impl StageKind {
    pub fn is_popup(self) -> bool {
        matches!(
            self,
            StageKind::Menu | StageKind::Tooltip | StageKind::Snackbar | StageKind::Completer
        )
    }

    pub fn is_main(self) -> bool {
        !self.is_popup()
    }

    fn default_modal(self) -> bool {
        matches!(self, StageKind::Dialog | StageKind::Sheet)
    }

    /// A press outside closes the popup
    pub fn dismiss_on_outside_press(self) -> bool {
        matches!(self, StageKind::Menu | StageKind::Completer | StageKind::Tooltip)
    }

    /// Receives keyboard input ahead of the main stage
    pub fn takes_keys(self) -> bool {
        matches!(self, StageKind::Menu | StageKind::Completer)
    }

    /// Stacking rank under [`lumen_layout::PopupOrder::KindPriority`]
    pub(crate) fn popup_rank(self) -> u8 {
        match self {
            StageKind::Menu | StageKind::Completer => 0,
            StageKind::Snackbar => 1,
            StageKind::Tooltip => 2,
            _ => 0,
        }
    }
}

/// Identity of a stage, unique for the process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(u64);

impl StageId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StageId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The widget a popup was opened for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub stage: StageId,
    pub widget: WidgetId,
}

pub struct Stage {
    id: StageId,
    kind: StageKind,
    scene: Scene,
    pub modal: bool,
    /// Tracks the window size instead of its own
    pub full_window: bool,
    /// Top-left corner in window coordinates
    pub pos: Point,
    pub anchor: Option<Anchor>,
    /// Closed on the first tick at or after this time
    pub expires: Option<Instant>,
    /// Items shown by a menu stage
    pub(crate) menu: Option<Menu>,
    /// Popups layered over this stage; present on main stages once pushed
    pub(crate) popups: Option<StageManager>,
}

impl Stage {
    pub fn new(kind: StageKind, scene: Scene) -> Self {
        Self {
            id: StageId::next(),
            kind,
            scene,
            modal: kind.default_modal(),
            full_window: kind == StageKind::Window,
            pos: Point::ZERO,
            anchor: None,
            expires: None,
            menu: None,
            popups: None,
        }
    }

    pub fn window(scene: Scene) -> Self {
        Self::new(StageKind::Window, scene)
    }

    pub fn dialog(scene: Scene) -> Self {
        Self::new(StageKind::Dialog, scene)
    }

    pub fn with_modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    pub fn at(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn expires_at(mut self, when: Instant) -> Self {
        self.expires = Some(when);
        self
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn size(&self) -> Size {
        self.scene.size()
    }

    /// Area covered in window coordinates
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.pos, self.size())
    }

    pub fn contains(&self, pos: Point) -> bool {
        self.rect().contains(pos)
    }

    /// Window position to scene position
    pub fn to_local(&self, pos: Point) -> Point {
        Point::new(pos.x - self.pos.x, pos.y - self.pos.y)
    }

    /// Scene position to window position
    pub fn to_window(&self, pos: Point) -> Point {
        Point::new(pos.x + self.pos.x, pos.y + self.pos.y)
    }

    pub fn popups(&self) -> Option<&StageManager> {
        self.popups.as_ref()
    }

    pub fn popups_mut(&mut self) -> Option<&mut StageManager> {
        self.popups.as_mut()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires.is_some_and(|t| now >= t)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("scene", &self.scene.name())
            .field("modal", &self.modal)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lumen_layout::Settings;

    use super::*;

    #[test]
    fn kinds_pick_their_defaults() {
        let dialog = Stage::dialog(Scene::new("d", Settings::default()));
        assert!(dialog.modal && !dialog.full_window);
        let window = Stage::window(Scene::new("w", Settings::default()));
        assert!(!window.modal && window.full_window);
        assert!(StageKind::Tooltip.is_popup());
        assert!(StageKind::Sheet.is_main());
        assert_ne!(dialog.id(), window.id());
    }

    #[test]
    fn coordinates_and_expiry() {
        let mut scene = Scene::new("menu", Settings::default());
        scene.resize(Size::new(50.0, 20.0));
        let t0 = Instant::now();
        let stage = Stage::new(StageKind::Snackbar, scene)
            .at(Point::new(100.0, 10.0))
            .expires_at(t0 + Duration::from_millis(10));
        assert!(stage.contains(Point::new(120.0, 25.0)));
        assert!(!stage.contains(Point::new(90.0, 25.0)));
        assert_eq!(stage.to_local(Point::new(120.0, 25.0)), Point::new(20.0, 15.0));
        assert!(!stage.is_expired(t0));
        assert!(stage.is_expired(t0 + Duration::from_millis(10)));
    }
}
