//! The Lumen application
//!
//! [`App`] owns the platform backend and every open [`RenderWindow`]. It
//! applies remembered geometry when a window opens and records it again
//! when the window closes.
//!
//! # Example
//!
//! ```ignore
//! use lumen_app::prelude::*;
//! use lumen_platform::offscreen::OffscreenPlatform;
//!
//! let config = AppConfig::load("lumen.toml")?;
//! let mut app = App::new(OffscreenPlatform::default(), config)?;
//! app.main_window(|scene| {
//!     let root = scene.root();
//!     scene.add(root, "hello", Text::new("Hello"))?;
//!     Ok(())
//! })?;
//! app.run()
//! ```

use std::sync::Arc;
use std::time::Instant;

use lumen_layout::Scene;
use lumen_platform::{Clipboard, Platform, WindowConfig, WindowFlags};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::prefs::WindowPrefs;
use crate::stage::{Stage, StageId};
use crate::window::{RenderWindow, WindowId};

pub struct App {
    platform: Box<dyn Platform>,
    config: AppConfig,
    clipboard: Arc<dyn Clipboard>,
    prefs: WindowPrefs,
    windows: Vec<RenderWindow>,
    current: Option<WindowId>,
    next_id: u64,
}

impl App {
    /// Create an application on `platform`, reading remembered window
    /// geometry from the configured prefs file
    pub fn new(platform: impl Platform + 'static, config: AppConfig) -> Result<Self> {
        let prefs = match &config.prefs_file {
            Some(path) => WindowPrefs::load(path)?,
            None => WindowPrefs::default(),
        };
        let clipboard = platform.clipboard();
        info!(app = %config.name, platform = platform.name(), windows = prefs.len(), "starting");
        Ok(Self {
            platform: Box::new(platform),
            config,
            clipboard,
            prefs,
            windows: Vec::new(),
            current: None,
            next_id: 1,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn prefs(&self) -> &WindowPrefs {
        &self.prefs
    }

    pub fn clipboard(&self) -> Arc<dyn Clipboard> {
        self.clipboard.clone()
    }

    /// Open a window from the `[window]` configuration table
    pub fn main_window(&mut self, build: impl FnOnce(&mut Scene) -> anyhow::Result<()>) -> Result<WindowId> {
        let config = self.config.window_config();
        self.new_window(config, build)
    }

    /// Open a window whose scene is filled in by `build`. The new window
    /// becomes the current one.
    pub fn new_window(
        &mut self,
        mut config: WindowConfig,
        build: impl FnOnce(&mut Scene) -> anyhow::Result<()>,
    ) -> Result<WindowId> {
        if let Some(geometry) = self.prefs.get(&config.name) {
            if geometry.width > 0 && geometry.height > 0 {
                config.width = geometry.width;
                config.height = geometry.height;
            }
            config.flags.set(WindowFlags::FULLSCREEN, geometry.fullscreen);
            debug!(window = %config.name, ?geometry, "restoring geometry");
        }

        let backend = self.platform.new_window(&config)?;
        let id = WindowId(self.next_id);
        self.next_id += 1;
        let mut window = RenderWindow::new(id, config.name.clone(), backend, &self.config, self.clipboard.clone());
        window.fullscreen = config.flags.contains(WindowFlags::FULLSCREEN);

        let mut scene = window.new_scene(&config.name);
        build(&mut scene)?;
        window.push(Stage::window(scene))?;
        window.show();

        info!(window = %config.name, id = id.0, "window opened");
        self.windows.push(window);
        self.current = Some(id);
        Ok(id)
    }

    /// Open a modal dialog over the current window
    pub fn open_dialog(&mut self, build: impl FnOnce(&mut Scene) -> anyhow::Result<()>) -> Result<StageId> {
        let window = self.current_window_mut().ok_or(AppError::NoWindow)?;
        let mut scene = window.new_scene("dialog");
        build(&mut scene)?;
        window.open_dialog(scene)
    }

    pub fn windows(&self) -> &[RenderWindow] {
        &self.windows
    }

    pub fn window(&self, id: WindowId) -> Option<&RenderWindow> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut RenderWindow> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    /// The most recently opened window still open
    pub fn current_window(&self) -> Option<&RenderWindow> {
        self.window(self.current?)
    }

    pub fn current_window_mut(&mut self) -> Option<&mut RenderWindow> {
        let id = self.current?;
        self.window_mut(id)
    }

    /// Pump every window once. Closed windows are dropped and their
    /// geometry remembered. Returns whether any window is still open.
    pub fn step(&mut self, now: Instant) -> bool {
        let mut closed = Vec::new();
        for window in &mut self.windows {
            if !window.pump(now) {
                closed.push((window.id(), window.name().to_string(), window.geometry()));
            }
        }
        if closed.is_empty() {
            return !self.windows.is_empty();
        }

        for (id, name, geometry) in closed {
            self.windows.retain(|w| w.id() != id);
            self.prefs.set(&name, geometry);
        }
        self.current = self.windows.last().map(RenderWindow::id);
        if let Err(err) = self.save_prefs() {
            warn!(%err, "cannot save window preferences");
        }
        !self.windows.is_empty()
    }

    /// Write remembered geometry to the prefs file, when one is configured
    pub fn save_prefs(&self) -> Result<()> {
        match &self.config.prefs_file {
            Some(path) => self.prefs.save(path),
            None => Ok(()),
        }
    }

    /// Ask every window to close; windows whose close callback vetoes stay
    pub fn request_quit(&mut self) {
        for window in &mut self.windows {
            window.request_close();
        }
    }

    /// Step until the last window closes, pacing frames to the configured
    /// rate
    pub fn run(mut self) -> Result<()> {
        let interval = self.config.settings.frame_interval();
        loop {
            let started = Instant::now();
            if !self.step(started) {
                break;
            }
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        info!(app = %self.config.name, "all windows closed");
        Ok(())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("platform", &self.platform.name())
            .field("windows", &self.windows)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::Size;
    use lumen_layout::widgets::Text;
    use lumen_platform::offscreen::OffscreenPlatform;
    use lumen_platform::WindowEvent;

    use super::*;
    use crate::prefs::WindowGeometry;

    fn app() -> App {
        App::new(OffscreenPlatform::default(), AppConfig::default()).unwrap()
    }

    #[test]
    fn build_errors_reach_the_caller() {
        let mut app = app();
        let err = app
            .new_window(WindowConfig::new("broken"), |_| anyhow::bail!("no content"))
            .unwrap_err();
        assert!(matches!(err, AppError::Callback(_)));
        assert_eq!(err.to_string(), "no content");
    }

    #[test]
    fn remembered_geometry_sizes_new_windows() {
        let mut app = app();
        app.prefs.set(
            "editor",
            WindowGeometry {
                width: 640,
                height: 480,
                ..Default::default()
            },
        );
        let id = app
            .new_window(WindowConfig::new("Editor").with_name("editor"), |scene| {
                let root = scene.root();
                scene.add(root, "hello", Text::new("Hello"))?;
                Ok(())
            })
            .unwrap();
        let window = app.window(id).unwrap();
        assert_eq!(window.size(), Size::new(640.0, 480.0));
        assert_eq!(window.main_scene().unwrap().size(), Size::new(640.0, 480.0));
    }

    #[test]
    fn closing_the_last_window_ends_the_app() {
        let mut app = app();
        let first = app.main_window(|_| Ok(())).unwrap();
        let second = app.new_window(WindowConfig::new("second"), |_| Ok(())).unwrap();
        assert_eq!(app.current_window().map(RenderWindow::id), Some(second));
        assert!(app.open_dialog(|_| Ok(())).is_ok());

        let now = Instant::now();
        app.window(second).unwrap().sender().send(WindowEvent::Close).unwrap();
        assert!(app.step(now));
        assert_eq!(app.current_window().map(RenderWindow::id), Some(first));
        assert!(app.prefs().get("second").is_some());

        app.request_quit();
        assert!(!app.step(now));
        assert!(app.windows().is_empty());
        assert!(matches!(app.open_dialog(|_| Ok(())), Err(AppError::NoWindow)));
    }
}
