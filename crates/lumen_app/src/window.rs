//! Render windows: a backend window, its stage stack and its event loop
//!
//! ```text
//! EventQueue ──► dispatch ──► stage under the pointer / key stage ──► Scene
//!                   │                                                 │
//!                   └──── requests (menus, tooltips, dialogs) ◄───────┘
//! tick(now) ──► timers, expired snackbars
//! paint()   ──► update + render every stage ──► Compositor ──► Drawer
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::{Color, Length, Point, Rect, Size};
use lumen_layout::widgets::menu::{populate, Menu, MenuChoice};
use lumen_layout::widgets::Text;
use lumen_layout::{Scene, SceneRequest, Settings, WidgetId};
use lumen_platform::{
    Clipboard, CustomEvent, Drawer, EventSender, KeyEvent, NoopDrawer, PointerEvent, PointerKind,
    Window, WindowEvent, WireEvent,
};
use tracing::{debug, error, info, trace, warn};

use crate::compose::{Compositor, RenderScenes};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::manager::StageManager;
use crate::prefs::WindowGeometry;
use crate::stage::{Anchor, Stage, StageId, StageKind};

/// Decides whether a close request goes ahead; returning false vetoes it
pub type CloseReqFunc = Box<dyn FnMut(&RenderWindow) -> bool>;

/// Request rounds handled per event before the rest wait for the next one
const MAX_REQUEST_ROUNDS: usize = 8;

/// Gap between a popup and the window edge or its anchor
const POPUP_MARGIN: f32 = 8.0;

/// Offset of a tooltip from the point it was requested at
const TOOLTIP_OFFSET: Point = Point::new(12.0, 18.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u64);

pub struct RenderWindow {
    id: WindowId,
    name: String,
    window: Box<dyn Window>,
    /// Replaces the backend drawer after it failed
    fallback: Option<NoopDrawer>,
    stages: StageManager,
    compositor: Compositor,
    settings: Settings,
    clipboard: Arc<dyn Clipboard>,
    background: Color,
    snackbar_timeout: Duration,
    close_req: Option<CloseReqFunc>,
    closed: bool,
    /// Stage that received the pointer press in progress
    press_stage: Option<StageId>,
    hover_stage: Option<StageId>,
    position: (i32, i32),
    pub(crate) fullscreen: bool,
    clock: Instant,
    paint_requested: bool,
    last_paint: Option<Instant>,
    frames: u64,
    last_scenes: RenderScenes,
}

impl RenderWindow {
    pub fn new(
        id: WindowId,
        name: impl Into<String>,
        window: Box<dyn Window>,
        config: &AppConfig,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            window,
            fallback: None,
            stages: StageManager::main(config.settings.popup_order),
            compositor: Compositor::new(),
            settings: config.settings.clone(),
            clipboard,
            background: config.background(),
            snackbar_timeout: config.snackbar_timeout(),
            close_req: None,
            closed: false,
            press_stage: None,
            hover_stage: None,
            position: (0, 0),
            fullscreen: false,
            clock: Instant::now(),
            paint_requested: true,
            last_paint: None,
            frames: 0,
            last_scenes: RenderScenes::default(),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> &dyn Window {
        &*self.window
    }

    /// Size in device pixels
    pub fn size(&self) -> Size {
        let (w, h) = self.window.size();
        Size::new(w as f32, h as f32)
    }

    pub fn sender(&self) -> EventSender {
        self.window.sender()
    }

    pub fn stages(&self) -> &StageManager {
        &self.stages
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Frames composited so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render_scenes(&self) -> &RenderScenes {
        &self.last_scenes
    }

    /// Whether the backend drawer failed and was replaced
    pub fn drawer_failed(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn geometry(&self) -> WindowGeometry {
        let (width, height) = self.window.size();
        WindowGeometry {
            x: self.position.0,
            y: self.position.1,
            width,
            height,
            fullscreen: self.fullscreen,
        }
    }

    pub fn set_close_req(&mut self, f: impl FnMut(&RenderWindow) -> bool + 'static) {
        self.close_req = Some(Box::new(f));
    }

    /// An empty scene sized to the window, sharing the app clipboard
    pub fn new_scene(&self, name: &str) -> Scene {
        let mut scene = Scene::new(name, self.settings.clone())
            .with_clipboard(self.clipboard.clone())
            .with_background(self.background);
        scene.set_dpi(self.window.logical_dpi());
        scene.resize(self.size());
        scene
    }

    /// The bottom stage's scene
    pub fn main_scene(&self) -> Option<&Scene> {
        self.stages.iter().next().map(Stage::scene)
    }

    pub fn main_scene_mut(&mut self) -> Option<&mut Scene> {
        self.stages.iter_mut().next().map(Stage::scene_mut)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages
            .get(id)
            .or_else(|| self.stages.iter().find_map(|s| s.popups()?.get(id)))
    }

    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        if self.stages.contains(id) {
            return self.stages.get_mut(id);
        }
        self.stages
            .iter_mut()
            .find_map(|s| s.popups.as_mut()?.get_mut(id))
    }

    /// The main stage `id` is, or the one whose popups hold it
    fn main_of(&self, id: StageId) -> Option<StageId> {
        if self.stages.contains(id) {
            return Some(id);
        }
        self.stages
            .iter()
            .find(|s| s.popups().is_some_and(|p| p.contains(id)))
            .map(Stage::id)
    }

    fn all_stage_ids(&self) -> Vec<StageId> {
        let mut ids = Vec::new();
        for stage in self.stages.iter() {
            ids.push(stage.id());
            if let Some(popups) = stage.popups() {
                ids.extend(popups.iter().map(Stage::id));
            }
        }
        ids
    }

    // ========================================================================
    // Stage stack
    // ========================================================================

    /// Place `stage` for the current window size
    fn place(&self, stage: &mut Stage) {
        let window = self.size();
        match stage.kind() {
            _ if stage.full_window => {
                stage.pos = Point::ZERO;
                stage.scene_mut().resize(window);
            }
            StageKind::Dialog => {
                let size = fitted(stage.scene_mut(), window);
                stage.pos = Point::new(
                    ((window.width - size.width) / 2.0).floor(),
                    ((window.height - size.height) / 2.0).floor(),
                );
            }
            StageKind::Sheet => {
                let height = fitted(stage.scene_mut(), window).height;
                stage.scene_mut().resize(Size::new(window.width, height));
                stage.pos = Point::new(0.0, window.height - height);
            }
            _ => {
                let size = fitted(stage.scene_mut(), window);
                stage.pos = clamp_into(Rect::from_origin_size(stage.pos, size), window);
            }
        }
    }

    /// Push a stage: main kinds onto the window's stack, popups onto the
    /// top main stage's popups
    pub fn push(&mut self, mut stage: Stage) -> Result<StageId> {
        self.place(&mut stage);
        if stage.kind().is_popup() {
            let order = self.settings.popup_order;
            let top = self.stages.top_mut().ok_or(AppError::NoWindow)?;
            let popups = top.popups.get_or_insert_with(|| StageManager::popup(order));
            let id = popups.push(stage)?;
            self.paint_requested = true;
            return Ok(id);
        }
        let covers = stage.modal;
        if let Some(below) = self.stages.top_mut() {
            if covers {
                below.scene_mut().cancel_gestures();
            }
        }
        let id = self.stages.push(stage)?;
        self.paint_requested = true;
        Ok(id)
    }

    /// Open `scene` as a modal dialog centered over the window
    pub fn open_dialog(&mut self, scene: Scene) -> Result<StageId> {
        self.push(Stage::dialog(scene))
    }

    /// Show `text` at the bottom of the window until the snackbar times out
    pub fn snackbar(&mut self, text: &str) -> Result<StageId> {
        let scene = self.label_scene("snackbar", text, Color::rgb(0.93, 0.93, 0.93));
        let mut stage = Stage::new(StageKind::Snackbar, scene).expires_at(self.clock + self.snackbar_timeout);
        let size = fitted(stage.scene_mut(), self.size());
        let window = self.size();
        stage.pos = Point::new(
            ((window.width - size.width) / 2.0).floor(),
            window.height - size.height - POPUP_MARGIN,
        );
        self.remove_popups(|s| s.kind() == StageKind::Snackbar);
        let top = self.stages.top_mut().ok_or(AppError::NoWindow)?;
        let order = self.settings.popup_order;
        let id = top
            .popups
            .get_or_insert_with(|| StageManager::popup(order))
            .push(stage)?;
        self.paint_requested = true;
        Ok(id)
    }

    /// Remove a stage wherever it is. Closing a modal stage cancels any
    /// gesture the stage below it had in progress.
    pub fn close_stage(&mut self, id: StageId) -> Option<Stage> {
        let removed = if self.stages.contains(id) {
            let stage = self.stages.remove(id)?;
            if stage.modal {
                if let Some(top) = self.stages.top_mut() {
                    top.scene_mut().cancel_gestures();
                }
            }
            stage
        } else {
            self.stages
                .iter_mut()
                .find_map(|s| s.popups.as_mut()?.remove(id))?
        };
        if self.press_stage == Some(id) {
            self.press_stage = None;
        }
        if self.hover_stage == Some(id) {
            self.hover_stage = None;
        }
        self.paint_requested = true;
        debug!(stage = ?id, kind = ?removed.kind(), "closed stage");
        Some(removed)
    }

    /// Remove popups of the top main stage that `pred` selects
    fn remove_popups(&mut self, pred: impl FnMut(&Stage) -> bool) -> Vec<Stage> {
        let removed = self
            .stages
            .top_mut()
            .and_then(|s| s.popups.as_mut())
            .map(|p| p.remove_where(pred))
            .unwrap_or_default();
        if !removed.is_empty() {
            self.paint_requested = true;
            for stage in &removed {
                if self.hover_stage == Some(stage.id()) {
                    self.hover_stage = None;
                }
                if self.press_stage == Some(stage.id()) {
                    self.press_stage = None;
                }
            }
        }
        removed
    }

    /// An unsized scene; its content decides the popup's size
    fn popup_scene(&self, name: &str) -> Scene {
        let mut scene = Scene::new(name, self.settings.clone()).with_clipboard(self.clipboard.clone());
        scene.set_dpi(self.window.logical_dpi());
        scene
    }

    fn label_scene(&self, name: &str, text: &str, background: Color) -> Scene {
        let mut scene = self.popup_scene(name).with_background(background);
        let root = scene.root();
        if let Err(err) = scene.add(root, "label", Text::new(text)) {
            warn!(%err, "cannot build popup label");
        }
        if let Ok(mut w) = scene.edit(root) {
            w.styler(|s| {
                s.set_padding(Length::dp(6.0));
            });
        }
        scene
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// The stage that takes pointer input at `pos`: the topmost popup of the
    /// top main stage, else main stages from the top down. A modal stage
    /// swallows positions outside itself.
    pub fn stage_at(&self, pos: Point) -> Option<StageId> {
        let top = self.stages.top()?;
        if let Some(popups) = top.popups() {
            for id in popups.hit_order() {
                let hit = popups
                    .get(id)
                    .is_some_and(|s| s.kind() != StageKind::Tooltip && s.contains(pos));
                if hit {
                    return Some(id);
                }
            }
        }
        for stage in self.stages.iter().rev() {
            if stage.contains(pos) {
                return Some(stage.id());
            }
            if stage.modal {
                return None;
            }
        }
        None
    }

    fn key_stage(&self) -> Option<StageId> {
        let top = self.stages.top()?;
        let popup = top.popups().and_then(|p| {
            p.hit_order()
                .into_iter()
                .find(|&id| p.get(id).is_some_and(|s| s.kind().takes_keys()))
        });
        Some(popup.unwrap_or(top.id()))
    }

    /// Tooltips close on any press; menus and completers close on a press
    /// outside them, which the press is spent on
    fn dismiss_for_press(&mut self, pos: Point) -> bool {
        self.remove_popups(|s| s.kind() == StageKind::Tooltip);
        let inside = self
            .stages
            .top()
            .and_then(Stage::popups)
            .is_some_and(|p| p.iter().any(|s| s.kind().takes_keys() && s.contains(pos)));
        if inside {
            return false;
        }
        let closed = self.remove_popups(|s| s.kind().dismiss_on_outside_press());
        if !closed.is_empty() {
            debug!(count = closed.len(), "popups dismissed by outside press");
        }
        !closed.is_empty()
    }

    fn deliver_pointer(&mut self, id: StageId, pe: &PointerEvent) {
        if let Some(stage) = self.stage_mut(id) {
            let local = PointerEvent {
                pos: stage.to_local(pe.pos),
                ..*pe
            };
            stage.scene_mut().handle(&WireEvent::Pointer(local));
        }
    }

    fn pointer(&mut self, pe: &PointerEvent) {
        if pe.kind == PointerKind::Down && self.dismiss_for_press(pe.pos) {
            return;
        }
        if pe.kind == PointerKind::Leave {
            if let Some(id) = self.hover_stage.take() {
                self.deliver_pointer(id, pe);
            }
            return;
        }

        let captured = self.press_stage.filter(|&id| self.stage(id).is_some());
        let target = match (pe.kind, captured) {
            (PointerKind::Down, _) | (_, None) => self.stage_at(pe.pos),
            (_, Some(id)) => Some(id),
        };

        if matches!(pe.kind, PointerKind::Move | PointerKind::Down) && self.hover_stage != target {
            if let Some(prev) = self.hover_stage {
                let leave = PointerEvent::new(PointerKind::Leave, pe.pos, pe.time);
                self.deliver_pointer(prev, &leave);
            }
            self.hover_stage = target;
        }
        match pe.kind {
            PointerKind::Down => self.press_stage = target,
            PointerKind::Up => self.press_stage = None,
            _ => {}
        }

        match target {
            Some(id) => self.deliver_pointer(id, pe),
            None => trace!(pos = ?pe.pos, kind = ?pe.kind, "pointer event taken by modal backdrop"),
        }
    }

    fn key(&mut self, ke: &KeyEvent) {
        let Some(id) = self.key_stage() else {
            return;
        };
        if let Some(stage) = self.stage_mut(id) {
            stage.scene_mut().handle(&WireEvent::Key(*ke));
        }
    }

    /// Custom events go to the topmost main stage holding the target widget;
    /// untargeted ones to the bottom stage's root
    fn custom(&mut self, ce: &CustomEvent) {
        let target = ce.target.map(WidgetId::from_raw);
        let scene = match target {
            Some(widget) => self
                .stages
                .iter_mut()
                .rev()
                .map(Stage::scene_mut)
                .find(|scene| scene.tree().contains(widget)),
            None => self.stages.iter_mut().next().map(Stage::scene_mut),
        };
        match scene {
            Some(scene) => scene.custom(ce),
            None => debug!(target = ?ce.target, "custom event for no open stage"),
        }
    }

    fn window_event(&mut self, we: &WindowEvent) {
        match *we {
            WindowEvent::Resize { .. } => {
                let mut stages = std::mem::replace(
                    &mut self.stages,
                    StageManager::main(self.settings.popup_order),
                );
                for stage in stages.iter_mut() {
                    self.place(stage);
                }
                self.stages = stages;
                self.paint_requested = true;
            }
            WindowEvent::Paint => self.paint_requested = true,
            WindowEvent::Show | WindowEvent::Minimize => {
                for stage in self.stages.iter_mut() {
                    stage.scene_mut().handle(&WireEvent::Window(*we));
                }
                self.paint_requested = true;
            }
            WindowEvent::Close => {
                self.request_close();
            }
            WindowEvent::Move { x, y } => self.position = (x, y),
            WindowEvent::Focus(false) => {
                if let Some(top) = self.stages.top_mut() {
                    top.scene_mut().cancel_gestures();
                }
            }
            WindowEvent::Focus(true) => {}
            WindowEvent::ScreenUpdate => {
                let dpi = self.window.logical_dpi();
                for id in self.all_stage_ids() {
                    if let Some(stage) = self.stage_mut(id) {
                        stage.scene_mut().set_dpi(dpi);
                    }
                }
            }
        }
    }

    /// Route one wire event, then carry out what the scenes asked for
    pub fn dispatch(&mut self, event: &WireEvent) {
        if self.closed {
            return;
        }
        if let Some(t) = event.time() {
            self.clock = self.clock.max(t);
        }
        match event {
            WireEvent::Pointer(pe) => self.pointer(pe),
            WireEvent::Key(ke) => self.key(ke),
            WireEvent::Window(we) => self.window_event(we),
            WireEvent::Custom(ce) => self.custom(ce),
        }
        self.process_requests();
    }

    // ========================================================================
    // Scene requests
    // ========================================================================

    fn process_requests(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            let mut pending = Vec::new();
            for id in self.all_stage_ids() {
                if let Some(stage) = self.stage_mut(id) {
                    pending.extend(stage.scene_mut().take_requests().into_iter().map(|r| (id, r)));
                }
            }
            if pending.is_empty() || self.closed {
                return;
            }
            for (from, request) in pending {
                self.apply(from, request);
            }
        }
        warn!(rounds = MAX_REQUEST_ROUNDS, "scene requests still pending");
    }

    fn apply(&mut self, from: StageId, request: SceneRequest) {
        trace!(stage = ?from, ?request, "scene request");
        match request {
            SceneRequest::OpenMenu { owner, menu, pos } => self.open_menu(from, owner, menu, pos),
            SceneRequest::MenuChosen { index } => self.menu_chosen(from, index),
            SceneRequest::ShowTooltip { owner, text, pos } => self.show_tooltip(from, owner, &text, pos),
            SceneRequest::HideTooltip => {
                self.remove_popups(|s| s.kind() == StageKind::Tooltip);
            }
            SceneRequest::Snackbar { text } => {
                if let Err(err) = self.snackbar(&text) {
                    warn!(%err, "cannot show snackbar");
                }
            }
            SceneRequest::Dismiss => self.dismiss(from),
            SceneRequest::Close => {
                let is_base = self.stages.iter().next().map(Stage::id) == Some(from);
                if is_base {
                    self.request_close();
                } else {
                    self.close_stage(from);
                }
            }
        }
    }

    fn open_menu(&mut self, from: StageId, owner: WidgetId, menu: Menu, pos: Point) {
        if menu.is_empty() {
            return;
        }
        let Some(origin) = self.stage(from).map(|s| s.to_window(pos)) else {
            return;
        };
        let from_main = self.stages.contains(from);
        if from_main {
            self.remove_popups(|s| s.kind().takes_keys());
        }
        let mut scene = self.popup_scene("menu");
        let root = scene.root();
        if let Err(err) = populate(scene.tree_mut(), root, &menu) {
            warn!(%err, "cannot build menu");
            return;
        }
        let mut stage = Stage::new(StageKind::Menu, scene)
            .at(origin)
            .anchored(Anchor { stage: from, widget: owner });
        stage.menu = Some(menu);
        match self.push(stage) {
            Ok(id) => debug!(menu = ?id, owner = ?owner, "menu opened"),
            Err(err) => warn!(%err, "cannot open menu"),
        }
    }

    fn menu_chosen(&mut self, from: StageId, index: usize) {
        let Some(stage) = self.close_stage(from) else {
            return;
        };
        // the whole menu chain closes with the chosen item
        self.remove_popups(|s| s.kind() == StageKind::Menu);
        let (Some(anchor), Some(menu)) = (stage.anchor, stage.menu.as_ref()) else {
            return;
        };
        let Some(item) = menu.items.get(index) else {
            return;
        };
        let choice = MenuChoice {
            index,
            label: item.label.clone(),
        };
        debug!(index, label = %choice.label, "menu choice");
        let event = CustomEvent::new(Some(anchor.widget.to_raw()), choice);
        match self.stage_mut(anchor.stage) {
            Some(owner) => owner.scene_mut().custom(&event),
            None => debug!(stage = ?anchor.stage, "menu owner closed before the choice"),
        }
    }

    fn show_tooltip(&mut self, from: StageId, owner: WidgetId, text: &str, pos: Point) {
        let Some(origin) = self.stage(from).map(|s| s.to_window(pos)) else {
            return;
        };
        self.remove_popups(|s| s.kind() == StageKind::Tooltip);
        let scene = self.label_scene("tooltip", text, Color::rgb(1.0, 1.0, 0.88));
        let stage = Stage::new(StageKind::Tooltip, scene)
            .at(Point::new(origin.x + TOOLTIP_OFFSET.x, origin.y + TOOLTIP_OFFSET.y))
            .anchored(Anchor { stage: from, widget: owner });
        if let Err(err) = self.push(stage) {
            warn!(%err, "cannot show tooltip");
        }
    }

    /// An unhandled Escape: close the popup it came from, else the top
    /// dialog or sheet. The window stage itself stays.
    fn dismiss(&mut self, from: StageId) {
        if self.main_of(from) != Some(from) {
            self.close_stage(from);
            return;
        }
        let closable = self.stages.len() > 1 && self.stages.top().map(Stage::id) == Some(from);
        if closable {
            self.close_stage(from);
        }
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Show the backend window; its Show and Focus events follow in the queue
    pub fn show(&mut self) {
        self.window.show();
    }

    /// Fire timers due at `now` and close expired snackbars
    pub fn tick(&mut self, now: Instant) {
        self.clock = self.clock.max(now);
        for id in self.all_stage_ids() {
            if let Some(stage) = self.stage_mut(id) {
                stage.scene_mut().tick(now);
            }
        }
        let mut expired = 0;
        for stage in self.stages.iter_mut() {
            if let Some(popups) = stage.popups.as_mut() {
                expired += popups.expire(now).len();
            }
        }
        if expired > 0 {
            trace!(expired, "snackbars expired");
            self.paint_requested = true;
        }
        self.process_requests();
    }

    /// Bring every stage up to date and composite a frame if anything
    /// changed. Returns whether a frame was submitted.
    pub fn paint(&mut self) -> bool {
        if self.closed || !self.window.is_visible() {
            return false;
        }
        let mut changed = self.paint_requested;
        for id in self.all_stage_ids() {
            if let Some(stage) = self.stage_mut(id) {
                let scene = stage.scene_mut();
                scene.update();
                changed |= scene.render();
            }
        }
        if !changed {
            return false;
        }

        let drawer: &mut dyn Drawer = match self.fallback.as_mut() {
            Some(noop) => noop,
            None => self.window.drawer(),
        };
        match self.compositor.composite(drawer, &self.stages) {
            Ok(Some(scenes)) => {
                self.last_scenes = scenes;
                self.frames += 1;
                self.paint_requested = false;
                true
            }
            Ok(None) => false,
            Err(err) => {
                error!(window = %self.name, %err, "drawer failed; continuing without one");
                let bounds = Rect::from(self.size());
                self.fallback = Some(NoopDrawer::new(bounds));
                self.compositor.release();
                if let Err(err) = self.snackbar(&format!("Display error: {err}")) {
                    warn!(%err, "cannot report drawer failure");
                }
                false
            }
        }
    }

    /// Handle everything queued, run timers, and paint when a frame is due.
    /// Returns false once the window is closed.
    pub fn pump(&mut self, now: Instant) -> bool {
        while let Some(event) = self.window.events().poll() {
            self.dispatch(&event);
            if self.closed {
                return false;
            }
        }
        self.tick(now);
        let due = self
            .last_paint
            .map_or(true, |t| now.saturating_duration_since(t) >= self.settings.frame_interval());
        if due && self.paint() {
            self.last_paint = Some(now);
        }
        !self.closed
    }

    // ========================================================================
    // Closing
    // ========================================================================

    /// Ask to close: the close callback may veto. Returns whether the window
    /// closed.
    pub fn request_close(&mut self) -> bool {
        if self.closed {
            return true;
        }
        if let Some(mut f) = self.close_req.take() {
            let allow = f(&*self);
            self.close_req = Some(f);
            if !allow {
                info!(window = %self.name, "close vetoed");
                return false;
            }
        }
        self.close_clean();
        true
    }

    /// Tear down unconditionally: stages top first, drawer slots, then the
    /// backend window
    pub fn close_clean(&mut self) {
        if self.closed {
            return;
        }
        let stages = self.stages.close_all();
        debug!(window = %self.name, stages = stages.len(), "closing");
        drop(stages);
        self.compositor.release();
        self.press_stage = None;
        self.hover_stage = None;
        self.window.close();
        self.closed = true;
        info!(window = %self.name, "window closed");
    }
}

/// Give a popup scene its content size, limited to the window
fn fitted(scene: &mut Scene, window: Size) -> Size {
    let current = scene.size();
    let size = if current.is_empty() || current == window {
        scene.preferred_size()
    } else {
        current
    };
    let size = Size::new(size.width.min(window.width).ceil(), size.height.min(window.height).ceil());
    scene.resize(size);
    size
}

/// Move `rect` so it lies inside the window where possible
fn clamp_into(rect: Rect, window: Size) -> Point {
    let x = rect.x().min(window.width - rect.width() - POPUP_MARGIN).max(0.0);
    let y = rect.y().min(window.height - rect.height() - POPUP_MARGIN).max(0.0);
    Point::new(x, y)
}

impl std::fmt::Debug for RenderWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWindow")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("stages", &self.stages.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
