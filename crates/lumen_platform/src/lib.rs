//! Lumen Platform Abstraction Layer
//!
//! Platform-agnostic traits and types the core consumes from a windowing
//! backend.
//!
//! # Architecture
//!
//! - [`Platform`] - creates windows and exposes screens and the clipboard
//! - [`Window`] - a native surface with its own event FIFO and [`Drawer`]
//! - [`WireEvent`] - pointer, key, window and custom events as delivered
//! - [`Drawer`] - image-slot compositor the stage manager submits scenes to
//!
//! The [`offscreen`] backend implements all of these in-process on top of
//! tiny-skia images.
//!
//! # Example
//!
//! ```rust
//! use lumen_platform::offscreen::OffscreenPlatform;
//! use lumen_platform::{Platform, WindowConfig};
//!
//! let mut platform = OffscreenPlatform::default();
//! let mut window = platform.new_window(&WindowConfig::new("demo").with_size(320, 240)).unwrap();
//! window.show();
//! assert!(window.events().poll().is_some());
//! ```

mod clipboard;
mod drawer;
mod error;
mod event;
mod image_drawer;
pub mod offscreen;
mod platform;
mod window;

pub use clipboard::{Clipboard, MemoryClipboard, TEXT_MIME};
pub use drawer::{DrawOp, Drawer, NoopDrawer};
pub use error::{PlatformError, Result};
pub use event::{
    event_channel, Buttons, CustomEvent, EventQueue, EventSender, KeyEvent, PointerEvent,
    PointerKind, WindowEvent, WireEvent,
};
pub use image_drawer::{FrameCapture, ImageDrawer};
pub use platform::Platform;
pub use window::{Cursor, Screen, Window, WindowConfig, WindowFlags};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::drawer::{DrawOp, Drawer};
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{KeyEvent, PointerEvent, PointerKind, WindowEvent, WireEvent};
    pub use crate::platform::Platform;
    pub use crate::window::{Cursor, Window, WindowConfig};
}
