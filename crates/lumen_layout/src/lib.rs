//! Lumen Layout
//!
//! Retained widget tree with a CSS-like style cascade, a four-pass layout
//! engine, event routing and a CPU render pass.
//!
//! # Architecture
//!
//! ```text
//! Scene
//!  ├── SceneTree     widgets in a slot map; children, parts, names
//!  ├── Router        hit path, hover, press gestures, focus, shortcuts
//!  ├── styling       stylers + style sheets → resolved Style per widget
//!  ├── layout        SizeUp → SizeDown (iterated) → SizeFinal → Position
//!  └── render        background, state layer, border, content, scrollbars
//! ```
//!
//! Widgets are trait objects implementing [`Widget`]. Built-in ones live in
//! [`widgets`]; layout models (flex, grid, stacked) are frame styles rather
//! than widget types.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::Size;
//! use lumen_layout::prelude::*;
//!
//! let mut scene = Scene::new("main", Settings::default());
//! let root = scene.root();
//! let column = scene.add(root, "column", Frame::column()).unwrap();
//! scene.add(column, "title", Text::new("Hello")).unwrap();
//! scene.add(column, "ok", Button::new("OK")).unwrap();
//!
//! scene.resize(Size::new(320.0, 200.0));
//! scene.frame();
//! assert!(scene.image().is_some());
//! ```

pub mod css;
pub mod error;
pub mod events;
pub mod flags;
pub mod geom;
pub mod layout;
pub mod render;
pub mod router;
pub mod scene;
pub mod scroll;
pub mod settings;
pub mod style;
pub mod styling;
pub mod text;
pub mod tree;
pub mod widget;
pub mod widgets;

pub use css::{CssParseResult, ParseError, Severity, StyleSheet};
pub use error::{LayoutError, Result};
pub use events::{Event, EventCx, EventType, SceneRequest};
pub use flags::{Abilities, SceneNeeds, StateFlags};
pub use geom::{GeomState, ScrollBar};
pub use layout::{LayoutCx, LayoutStats};
pub use render::{RenderStats, Upload};
pub use router::Router;
pub use scene::{FrameStats, RenderContext, RenderState, Scene};
pub use settings::{PopupOrder, Settings};
pub use style::{Align, Direction, Display, Justify, Overflow, Style, XY};
pub use text::{EstimatedTextMeasurer, TextMeasurer};
pub use tree::{Node, SceneTree, WalkControl, WidgetId};
pub use widget::{RenderCx, Widget, WidgetMut};

pub mod prelude {
    pub use crate::events::{Event, EventCx, EventType, SceneRequest};
    pub use crate::flags::{Abilities, StateFlags};
    pub use crate::scene::Scene;
    pub use crate::settings::Settings;
    pub use crate::style::Style;
    pub use crate::tree::WidgetId;
    pub use crate::widget::{Widget, WidgetMut};
    pub use crate::widgets::{
        Button, Checkbox, Chooser, Frame, Menu, Slider, Splits, Tabs, Text, TextField,
    };
}
