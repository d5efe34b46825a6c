//! Platform trait

use std::sync::Arc;

use crate::clipboard::Clipboard;
use crate::error::Result;
use crate::window::{Screen, Window, WindowConfig};

/// A windowing backend
///
/// Each backend (desktop, mobile, web, offscreen) implements this trait to
/// hand the core windows, screens and a clipboard.
pub trait Platform {
    /// Backend name such as "offscreen" or "desktop"
    fn name(&self) -> &'static str;

    /// Create a window; it is not shown until [`Window::show`]
    fn new_window(&mut self, config: &WindowConfig) -> Result<Box<dyn Window>>;

    fn screens(&self) -> Vec<Screen>;

    fn primary_screen(&self) -> Screen {
        self.screens().into_iter().next().unwrap_or_default()
    }

    fn clipboard(&self) -> Arc<dyn Clipboard>;
}
