//! In-process backend with no display
//!
//! Windows composite into an [`ImageDrawer`] and receive events only through
//! their [`EventSender`], which makes the whole toolkit drivable from tests.

use std::sync::Arc;

use lumen_core::Size;
use tracing::debug;

use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::drawer::Drawer;
use crate::error::{PlatformError, Result};
use crate::event::{event_channel, EventQueue, EventSender, WindowEvent};
use crate::image_drawer::{FrameCapture, ImageDrawer};
use crate::platform::Platform;
use crate::window::{Cursor, Screen, Window, WindowConfig};

#[derive(Debug)]
pub struct OffscreenPlatform {
    screen: Screen,
    clipboard: Arc<MemoryClipboard>,
    /// Capture handles of every window created, in creation order
    captures: Vec<FrameCapture>,
    senders: Vec<EventSender>,
}

impl Default for OffscreenPlatform {
    fn default() -> Self {
        Self::new(Screen::default())
    }
}

impl OffscreenPlatform {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            clipboard: Arc::new(MemoryClipboard::new()),
            captures: Vec::new(),
            senders: Vec::new(),
        }
    }

    /// Frame capture of the `index`th window created
    pub fn capture(&self, index: usize) -> Option<FrameCapture> {
        self.captures.get(index).cloned()
    }

    /// Event sender of the `index`th window created
    pub fn sender(&self, index: usize) -> Option<EventSender> {
        self.senders.get(index).cloned()
    }
}

impl Platform for OffscreenPlatform {
    fn name(&self) -> &'static str {
        "offscreen"
    }

    fn new_window(&mut self, config: &WindowConfig) -> Result<Box<dyn Window>> {
        if config.width == 0 || config.height == 0 {
            return Err(PlatformError::WindowCreation(format!(
                "empty size {}x{}",
                config.width, config.height
            )));
        }
        let window = OffscreenWindow::new(config, self.screen.clone())?;
        self.captures.push(window.capture());
        self.senders.push(window.sender());
        debug!(title = %config.title, "offscreen window created");
        Ok(Box::new(window))
    }

    fn screens(&self) -> Vec<Screen> {
        vec![self.screen.clone()]
    }

    fn clipboard(&self) -> Arc<dyn Clipboard> {
        self.clipboard.clone()
    }
}

#[derive(Debug)]
pub struct OffscreenWindow {
    title: String,
    size: (u32, u32),
    visible: bool,
    closed: bool,
    minimized: bool,
    cursor: Cursor,
    screen: Screen,
    drawer: ImageDrawer,
    queue: EventQueue,
    sender: EventSender,
}

impl OffscreenWindow {
    pub fn new(config: &WindowConfig, screen: Screen) -> Result<Self> {
        let (sender, queue) = event_channel();
        Ok(Self {
            title: config.title.clone(),
            size: (config.width, config.height),
            visible: false,
            closed: false,
            minimized: false,
            cursor: Cursor::default(),
            screen,
            drawer: ImageDrawer::new(config.width, config.height)?,
            queue,
            sender,
        })
    }

    pub fn capture(&self) -> FrameCapture {
        self.drawer.capture()
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    fn notify(&self, event: WindowEvent) {
        // The queue lives inside this window, so sending cannot fail
        let _ = self.sender.send(event);
    }
}

impl Window for OffscreenWindow {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == self.size || width == 0 || height == 0 {
            return;
        }
        if let Err(err) = self.drawer.resize(width, height) {
            tracing::error!("{err}");
            return;
        }
        self.size = (width, height);
        self.notify(WindowEvent::Resize { width, height });
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn show(&mut self) {
        if !self.visible {
            self.visible = true;
            self.minimized = false;
            self.notify(WindowEvent::Show);
            self.notify(WindowEvent::Focus(true));
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.visible = false;
    }

    fn raise(&mut self) {
        self.minimized = false;
        self.notify(WindowEvent::Focus(true));
    }

    fn minimize(&mut self) {
        self.minimized = true;
        self.notify(WindowEvent::Minimize);
    }

    fn is_visible(&self) -> bool {
        self.visible && !self.minimized
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn drawer(&mut self) -> &mut dyn Drawer {
        &mut self.drawer
    }

    fn events(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    fn logical_dpi(&self) -> f32 {
        self.screen.logical_dpi
    }

    fn screen(&self) -> Screen {
        self.screen.clone()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// Screen description for tests and headless rendering
pub fn headless_screen(width: f32, height: f32, dpi: f32) -> Screen {
    Screen {
        name: "headless".to_string(),
        size: Size::new(width, height),
        logical_dpi: dpi,
        scale_factor: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WireEvent;

    #[test]
    fn window_lifecycle_events() {
        let mut platform = OffscreenPlatform::default();
        let mut win = platform
            .new_window(&WindowConfig::new("test").with_size(64, 32))
            .unwrap();
        assert_eq!(win.size(), (64, 32));
        assert!(!win.is_visible());
        win.show();
        win.resize(128, 64);
        win.resize(128, 64);

        let events = win.events().drain();
        assert!(matches!(events[0], WireEvent::Window(WindowEvent::Show)));
        assert!(matches!(events[1], WireEvent::Window(WindowEvent::Focus(true))));
        assert!(matches!(
            events[2],
            WireEvent::Window(WindowEvent::Resize { width: 128, height: 64 })
        ));
        assert_eq!(events.len(), 3);
        assert_eq!(win.drawer().dest_bounds().width(), 128.0);
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let mut platform = OffscreenPlatform::default();
        assert!(platform
            .new_window(&WindowConfig::new("x").with_size(0, 10))
            .is_err());
    }

    #[test]
    fn external_sender_reaches_window() {
        let mut platform = OffscreenPlatform::default();
        let mut win = platform.new_window(&WindowConfig::new("a")).unwrap();
        let tx = platform.sender(0).unwrap();
        tx.send_custom(None, "done").unwrap();
        assert!(matches!(win.events().poll(), Some(WireEvent::Custom(_))));
    }

    #[test]
    fn clipboard_is_shared() {
        let platform = OffscreenPlatform::default();
        platform.clipboard().write_text("x");
        assert_eq!(platform.clipboard().read_text().as_deref(), Some("x"));
    }
}
