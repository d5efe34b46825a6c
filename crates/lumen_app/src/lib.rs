//! Lumen Application Layer
//!
//! Ties scenes to platform windows. A [`RenderWindow`] holds a stack of
//! [`Stage`]s, each showing one [`lumen_layout::Scene`]: the window stage at
//! the bottom, dialogs and sheets over it, and popups (menus, tooltips,
//! snackbars) layered on the main stage that opened them.
//!
//! # Architecture
//!
//! ```text
//! App ─── Platform ──► Window (events, Drawer)
//!  │
//!  └── RenderWindow
//!        ├── StageManager (main)  Window ▸ Dialog ▸ Sheet
//!        │     └── StageManager (popups)  Menu ▸ Snackbar ▸ Tooltip
//!        └── Compositor ──► Drawer slots, one per scene image
//! ```
//!
//! Each frame every stage's scene runs its style, layout and render passes
//! and the compositor copies the resulting images onto the window's
//! drawer bottom to top.
//!
//! # Configuration
//!
//! [`AppConfig`] is read from TOML; window geometry is remembered in a
//! JSON file through [`WindowPrefs`]. Logging goes through `tracing`;
//! call [`init_logging`] once at startup to print it, filtered by
//! `RUST_LOG`.

mod app;
mod compose;
mod config;
mod error;
mod logging;
mod manager;
mod prefs;
mod stage;
mod window;

pub use app::App;
pub use compose::{Compositor, RenderEntry, RenderScenes, BACKDROP};
pub use config::{AppConfig, WindowDefaults};
pub use error::{AppError, Result};
pub use logging::init_logging;
pub use manager::{ManagerRole, StageManager};
pub use prefs::{WindowGeometry, WindowPrefs};
pub use stage::{Anchor, Stage, StageId, StageKind};
pub use window::{CloseReqFunc, RenderWindow, WindowId};

// Re-export the crates an application builds on
pub use lumen_core;
pub use lumen_layout;
pub use lumen_platform;
pub use lumen_svg;

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::AppConfig;
    pub use crate::error::{AppError, Result};
    pub use crate::logging::init_logging;
    pub use crate::stage::{Stage, StageKind};
    pub use crate::window::RenderWindow;

    pub use lumen_core::{Color, Length, Point, Rect, Size};
    pub use lumen_layout::prelude::*;
    pub use lumen_platform::WindowConfig;
}
