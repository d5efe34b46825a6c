//! Scene: one widget tree with its router, passes and image
//!
//! A scene is what a stage shows. It owns the tree and everything needed to
//! turn wire events into listener calls and the tree into pixels:
//!
//! ```text
//! handle(WireEvent) ──► Router ──► listeners ──► needs + restyle list
//!                                                    │
//! update() ──► style ──► layout / position ◄─────────┘
//!                              │
//! render() ──► PaintContext ──► image + direct uploads
//! ```
//!
//! Event handling holds the shared [`RenderContext`] for reading; rendering
//! takes it for writing, so a window thread resizing the scene never sees a
//! half-painted image.

use std::rc::Rc;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use lumen_core::{Color, KeyChord, Point, Rect, Size};
use lumen_paint::{GlyphRenderer, PaintContext, Pixmap};
use lumen_platform::{Clipboard, Cursor, CustomEvent, MemoryClipboard, WindowEvent, WireEvent};
use tracing::{debug, trace, warn};

use crate::error::{LayoutError, Result};
use crate::events::{Deferred, SceneEnv, SceneRequest};
use crate::flags::SceneNeeds;
use crate::layout::{layout_scene, measure_scene, position_scene, LayoutCx, LayoutStats};
use crate::render::{render_scene, RenderStats, Upload};
use crate::router::Router;
use crate::settings::Settings;
use crate::styling::{rebase_percentages, style_tree, style_with_parts, StyleCx};
use crate::text::{EstimatedTextMeasurer, TextMeasurer};
use crate::tree::{SceneTree, WidgetId};
use crate::widget::{Widget, WidgetMut};

/// Display state shared between a scene and the window showing it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    pub dpi: f32,
    /// Scene size in device pixels
    pub size: Size,
    pub visible: bool,
}

/// Lock around a scene's [`RenderState`]
#[derive(Debug)]
pub struct RenderContext {
    state: RwLock<RenderState>,
}

impl RenderContext {
    pub fn new(state: RenderState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RenderState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RenderState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> RenderState {
        *self.read()
    }
}

/// Extra layouts run while percentage sizes settle
const PERCENT_PASSES: usize = 3;

/// What the last [`Scene::update`] and [`Scene::render`] did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub styled: usize,
    pub layout: Option<LayoutStats>,
    pub render: Option<RenderStats>,
}

pub struct Scene {
    name: String,
    tree: SceneTree,
    router: Router,
    settings: Settings,
    measurer: Arc<dyn TextMeasurer>,
    glyphs: Option<Rc<dyn GlyphRenderer>>,
    clipboard: Arc<dyn Clipboard>,
    render_ctx: Arc<RenderContext>,
    needs: SceneNeeds,
    restyle: Vec<WidgetId>,
    requests: Vec<SceneRequest>,
    deferred: Vec<Deferred>,
    image: Option<Pixmap>,
    uploads: Vec<Upload>,
    background: Color,
    stats: FrameStats,
}

impl Scene {
    pub fn new(name: &str, settings: Settings) -> Self {
        let state = RenderState {
            dpi: settings.logical_dpi,
            size: Size::ZERO,
            visible: true,
        };
        Self {
            name: name.to_string(),
            tree: SceneTree::with_root(name),
            router: Router::new(),
            settings,
            measurer: Arc::new(EstimatedTextMeasurer),
            glyphs: None,
            clipboard: Arc::new(MemoryClipboard::new()),
            render_ctx: Arc::new(RenderContext::new(state)),
            needs: SceneNeeds::all(),
            restyle: Vec::new(),
            requests: Vec::new(),
            deferred: Vec::new(),
            image: None,
            uploads: Vec::new(),
            background: Color::TRANSPARENT,
            stats: FrameStats::default(),
        }
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self.needs.insert(SceneNeeds::LAYOUT | SceneNeeds::RENDER);
        self
    }

    pub fn with_glyph_renderer(mut self, glyphs: Rc<dyn GlyphRenderer>) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    /// Share a clipboard with other scenes of the application
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> WidgetId {
        self.tree.root()
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Mutable tree access; the next update restyles everything
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        self.needs.insert(SceneNeeds::all());
        &mut self.tree
    }

    pub fn add(&mut self, parent: WidgetId, name: &str, widget: impl Widget) -> Result<WidgetId> {
        let id = self.tree.add(parent, name, widget)?;
        self.needs.insert(SceneNeeds::all());
        Ok(id)
    }

    /// Builder access to a widget's stylers, listeners and abilities
    pub fn edit(&mut self, id: WidgetId) -> Result<WidgetMut<'_>> {
        if !self.tree.contains(id) {
            warn!(scene = %self.name, widget = ?id, "edit of a removed widget");
            return Err(LayoutError::InvalidNode(id));
        }
        self.needs.insert(SceneNeeds::all());
        Ok(WidgetMut::new(&mut self.tree, id))
    }

    pub fn delete(&mut self, id: WidgetId) -> Result<()> {
        self.tree.delete(id)?;
        self.router.prune(&self.tree);
        self.needs.insert(SceneNeeds::all());
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn clipboard(&self) -> &Arc<dyn Clipboard> {
        &self.clipboard
    }

    pub fn render_context(&self) -> &Arc<RenderContext> {
        &self.render_ctx
    }

    pub fn size(&self) -> Size {
        self.render_ctx.read().size
    }

    pub fn needs(&self) -> SceneNeeds {
        self.needs
    }

    pub fn mark(&mut self, needs: SceneNeeds) {
        self.needs.insert(needs);
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.router.focused()
    }

    pub fn cursor(&self) -> Cursor {
        self.router.cursor()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The last rendered image
    pub fn image(&self) -> Option<&Pixmap> {
        self.image.as_ref()
    }

    /// Images to hand to the drawer next to the scene image
    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    pub fn take_requests(&mut self) -> Vec<SceneRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn set_shortcut(&mut self, chord: KeyChord, target: WidgetId) {
        self.router.add_shortcut(chord, target);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.render_ctx.write().visible = visible;
        if visible {
            self.needs.insert(SceneNeeds::RENDER);
        }
    }

    pub fn set_dpi(&mut self, dpi: f32) {
        let mut state = self.render_ctx.write();
        if state.dpi != dpi {
            state.dpi = dpi;
            self.needs.insert(SceneNeeds::all());
        }
    }

    pub fn resize(&mut self, size: Size) {
        let mut state = self.render_ctx.write();
        if state.size != size {
            debug!(scene = %self.name, ?size, "resize");
            state.size = size;
            self.needs.insert(SceneNeeds::all());
        }
    }

    fn with_env<R>(&mut self, f: impl FnOnce(&mut Router, &mut SceneEnv<'_>) -> R) -> R {
        let mut env = SceneEnv {
            tree: &mut self.tree,
            settings: &self.settings,
            clipboard: &*self.clipboard,
            needs: &mut self.needs,
            restyle: &mut self.restyle,
            requests: &mut self.requests,
            deferred: &mut self.deferred,
        };
        f(&mut self.router, &mut env)
    }

    /// Route one wire event. Returns whether the scene needs a new frame.
    pub fn handle(&mut self, event: &WireEvent) -> bool {
        let ctx = Arc::clone(&self.render_ctx);
        match event {
            WireEvent::Window(WindowEvent::Resize { width, height }) => {
                self.resize(Size::new(*width as f32, *height as f32));
            }
            WireEvent::Window(WindowEvent::Show) => self.set_visible(true),
            WireEvent::Window(WindowEvent::Minimize) => self.set_visible(false),
            WireEvent::Window(WindowEvent::Focus(false)) => {
                let _state = ctx.read();
                self.with_env(|router, env| router.cancel_gestures(env));
            }
            WireEvent::Window(_) => {}
            WireEvent::Pointer(pe) => {
                let _state = ctx.read();
                self.with_env(|router, env| router.pointer(env, pe));
            }
            WireEvent::Key(ke) => {
                let _state = ctx.read();
                self.with_env(|router, env| router.key(env, ke));
            }
            WireEvent::Custom(ce) => self.custom(ce),
        }
        !self.needs.is_empty()
    }

    pub fn custom(&mut self, event: &CustomEvent) {
        let ctx = Arc::clone(&self.render_ctx);
        let _state = ctx.read();
        self.with_env(|router, env| router.custom(env, event));
    }

    /// Fire due long-press and long-hover timers
    pub fn tick(&mut self, now: Instant) {
        self.with_env(|router, env| router.tick(env, now));
    }

    pub fn focus(&mut self, id: Option<WidgetId>) {
        self.with_env(|router, env| router.set_focus(env, id));
    }

    pub fn focus_next(&mut self) {
        self.with_env(|router, env| router.focus_next(env));
    }

    pub fn focus_prev(&mut self) {
        self.with_env(|router, env| router.focus_prev(env));
    }

    pub fn focus_first(&mut self) {
        self.with_env(|router, env| router.focus_first(env));
    }

    pub fn focus_last(&mut self) {
        self.with_env(|router, env| router.focus_last(env));
    }

    /// Abandon any gesture in progress
    pub fn cancel_gestures(&mut self) {
        self.with_env(|router, env| router.cancel_gestures(env));
    }

    pub fn hit_test(&self, pos: Point) -> Option<WidgetId> {
        crate::router::hit_path(&self.tree, pos, self.settings.parts_receive_events)
            .first()
            .copied()
    }

    fn style_cx(&self) -> StyleCx {
        let state = self.render_ctx.read();
        StyleCx {
            dpi: state.dpi,
            viewport: state.size,
            scrollbar_width: self.settings.scroll_bar_width,
        }
    }

    /// Run the style, layout and position passes the scene owes
    pub fn update(&mut self) -> FrameStats {
        let cx = self.style_cx();
        let root = self.tree.root();
        let mut stats = FrameStats::default();
        let mut relayout = self.needs.contains(SceneNeeds::LAYOUT);

        if self.needs.contains(SceneNeeds::REBUILD) {
            style_tree(&mut self.tree, root, &cx);
            stats.styled = self.tree.len();
            self.restyle.clear();
            relayout = true;
        } else if self.needs.contains(SceneNeeds::STYLE) {
            let mut ids = std::mem::take(&mut self.restyle);
            ids.sort();
            ids.dedup();
            for id in ids {
                if self.tree.contains(id) {
                    relayout |= style_with_parts(&mut self.tree, id, &cx);
                    stats.styled += 1;
                }
            }
        }
        self.needs.remove(SceneNeeds::STYLE | SceneNeeds::REBUILD);

        let size = cx.viewport;
        if relayout {
            let lcx = LayoutCx {
                measurer: &*self.measurer,
                settings: &self.settings,
            };
            stats.layout = Some(layout_scene(&mut self.tree, root, size, &lcx));
            // nested percentages settle one level per pass
            for _ in 0..PERCENT_PASSES {
                if !rebase_percentages(&mut self.tree, root, &cx) {
                    break;
                }
                stats.layout = Some(layout_scene(&mut self.tree, root, size, &lcx));
            }
            self.needs.remove(SceneNeeds::LAYOUT | SceneNeeds::POSITION);
            self.needs.insert(SceneNeeds::RENDER);
        } else if self.needs.contains(SceneNeeds::POSITION) {
            position_scene(&mut self.tree, root, Rect::from(size));
            self.needs.remove(SceneNeeds::POSITION);
            self.needs.insert(SceneNeeds::RENDER);
        }
        trace!(scene = %self.name, styled = stats.styled, relayout, "update");
        self.stats = stats;
        stats
    }

    /// Paint into the scene image if anything changed.
    ///
    /// Returns whether a new image was produced.
    pub fn render(&mut self) -> bool {
        if !self.needs.contains(SceneNeeds::RENDER) && self.image.is_some() {
            return false;
        }
        let ctx = Arc::clone(&self.render_ctx);
        let state = ctx.write();
        if !state.visible {
            return false;
        }
        let (w, h) = (
            state.size.width.ceil().max(1.0) as u32,
            state.size.height.ceil().max(1.0) as u32,
        );
        let fits = self
            .image
            .as_ref()
            .is_some_and(|img| img.width() == w && img.height() == h);
        if !fits {
            match Pixmap::new(w, h) {
                Some(img) => self.image = Some(img),
                None => {
                    warn!(scene = %self.name, w, h, "cannot allocate scene image");
                    return false;
                }
            }
        }
        let Some(image) = self.image.as_mut() else {
            return false;
        };
        self.uploads.clear();
        let mut paint = PaintContext::new(image);
        if let Some(glyphs) = &self.glyphs {
            paint = paint.with_glyph_renderer(&**glyphs);
        }
        paint.clear(self.background);
        let stats = render_scene(
            &self.tree,
            self.tree.root(),
            &mut paint,
            &*self.measurer,
            &mut self.uploads,
        );
        drop(state);
        self.stats.render = Some(stats);
        self.needs.remove(SceneNeeds::RENDER);
        true
    }

    /// Minimum size of the scene content, styling it first if needed
    pub fn preferred_size(&mut self) -> Size {
        if self.needs.intersects(SceneNeeds::STYLE | SceneNeeds::REBUILD) {
            let cx = self.style_cx();
            let root = self.tree.root();
            style_tree(&mut self.tree, root, &cx);
            self.restyle.clear();
            self.needs.remove(SceneNeeds::STYLE | SceneNeeds::REBUILD);
            self.needs.insert(SceneNeeds::LAYOUT);
        }
        let root = self.tree.root();
        let lcx = LayoutCx {
            measurer: &*self.measurer,
            settings: &self.settings,
        };
        measure_scene(&mut self.tree, root, &lcx)
    }

    /// Update, then render
    pub fn frame(&mut self) -> bool {
        self.update();
        self.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{Button, Frame};

    #[test]
    fn frame_styles_lays_out_and_paints() {
        let mut scene = Scene::new("main", Settings::default()).with_background(Color::WHITE);
        let root = scene.root();
        let col = scene.add(root, "col", Frame::column()).unwrap();
        scene.add(col, "ok", Button::new("OK")).unwrap();
        scene.resize(Size::new(200.0, 100.0));

        assert!(scene.frame());
        let stats = scene.stats();
        assert!(stats.layout.is_some());
        assert!(stats.render.is_some_and(|r| r.painted > 0));
        assert_eq!(scene.image().map(|i| (i.width(), i.height())), Some((200, 100)));
        assert!(scene.needs().is_empty());
        assert!(!scene.render());
    }

    #[test]
    fn preferred_size_measures_content() {
        let mut scene = Scene::new("popup", Settings::default());
        let root = scene.root();
        let label = scene.add(root, "label", Frame::new()).unwrap();
        scene.edit(label).unwrap().styler(|s| {
            s.set_size(lumen_core::Length::px(60.0), lumen_core::Length::px(16.0));
        });
        let size = scene.preferred_size();
        assert!(size.width >= 60.0 && size.height >= 16.0);

        scene.delete(label).unwrap();
        assert!(scene.edit(label).is_err());
    }

    #[test]
    fn hidden_scene_skips_render() {
        let mut scene = Scene::new("main", Settings::default());
        scene.resize(Size::new(10.0, 10.0));
        scene.set_visible(false);
        scene.update();
        assert!(!scene.render());
        assert!(scene.needs().contains(SceneNeeds::RENDER));
    }

    #[test]
    fn percentage_sizes_hold_from_the_first_frame() {
        let mut scene = Scene::new("main", Settings::default());
        let root = scene.root();
        let half = scene.add(root, "half", Frame::new()).unwrap();
        scene.edit(half).unwrap().styler(|s| {
            s.set_size(lumen_core::Length::pw(50.0), lumen_core::Length::px(10.0));
        });
        let width = |scene: &Scene| scene.tree().get(half).unwrap().geom.actual.width;

        scene.resize(Size::new(300.0, 100.0));
        scene.frame();
        assert_eq!(width(&scene), 150.0);

        scene.resize(Size::new(400.0, 100.0));
        scene.frame();
        assert_eq!(width(&scene), 200.0);
    }
}
