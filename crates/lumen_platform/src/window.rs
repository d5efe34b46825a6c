//! Window abstraction and configuration

use lumen_core::Size;

use crate::drawer::Drawer;
use crate::event::{EventQueue, EventSender};

bitflags::bitflags! {
    /// Window creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u8 {
        const RESIZABLE = 0b0001;
        const DECORATIONS = 0b0010;
        const FULLSCREEN = 0b0100;
        const ALWAYS_ON_TOP = 0b1000;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        WindowFlags::RESIZABLE | WindowFlags::DECORATIONS
    }
}

/// Window configuration
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    /// Name used to key persisted geometry; defaults to the title
    pub name: String,
    /// Initial width in device pixels
    pub width: u32,
    /// Initial height in device pixels
    pub height: u32,
    pub flags: WindowFlags,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            name: "main".to_string(),
            width: 800,
            height: 600,
            flags: WindowFlags::default(),
        }
    }
}

impl WindowConfig {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            name: title.clone(),
            title,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.flags.set(WindowFlags::RESIZABLE, resizable);
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.flags.set(WindowFlags::FULLSCREEN, fullscreen);
        self
    }

    pub fn always_on_top(mut self, on_top: bool) -> Self {
        self.flags.set(WindowFlags::ALWAYS_ON_TOP, on_top);
        self
    }
}

/// Physical display a window lives on
#[derive(Clone, Debug, PartialEq)]
pub struct Screen {
    pub name: String,
    /// Size in device pixels
    pub size: Size,
    pub logical_dpi: f32,
    /// Device pixels per logical pixel
    pub scale_factor: f32,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            size: Size::new(1920.0, 1080.0),
            logical_dpi: 160.0,
            scale_factor: 1.0,
        }
    }
}

/// Window abstraction trait
///
/// Implemented by platform-specific window types. All calls happen on the
/// thread running the window's event loop.
pub trait Window {
    /// Size in device pixels
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    fn title(&self) -> &str;

    fn set_title(&mut self, title: &str);

    fn show(&mut self);

    fn close(&mut self);

    fn raise(&mut self);

    fn minimize(&mut self);

    fn is_visible(&self) -> bool;

    fn is_closed(&self) -> bool;

    fn drawer(&mut self) -> &mut dyn Drawer;

    /// The window's event FIFO
    fn events(&mut self) -> &mut EventQueue;

    /// A handle other threads can use to inject events
    fn sender(&self) -> EventSender;

    fn logical_dpi(&self) -> f32;

    fn screen(&self) -> Screen;

    fn set_cursor(&mut self, cursor: Cursor);

    fn cursor(&self) -> Cursor;
}

/// Cursor shapes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    #[default]
    Arrow,
    /// Hand, for clickable elements
    Pointer,
    /// I-beam, for text input
    Text,
    ResizeEW,
    ResizeNS,
    /// Open hand
    Grab,
    /// Closed hand
    Grabbing,
    NotAllowed,
    DragCopy,
    DragMove,
    DragLink,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let c = WindowConfig::new("Editor")
            .with_size(640, 480)
            .resizable(false)
            .fullscreen(true);
        assert_eq!(c.name, "Editor");
        assert_eq!((c.width, c.height), (640, 480));
        assert!(!c.flags.contains(WindowFlags::RESIZABLE));
        assert!(c.flags.contains(WindowFlags::FULLSCREEN | WindowFlags::DECORATIONS));
    }
}
