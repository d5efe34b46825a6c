//! Reference widgets
//!
//! - [`Frame`] - container; all layout models are frame styles
//! - [`Text`] - wrapping label
//! - [`Button`] - icon and label parts, emits `Click`
//! - [`Checkbox`] - toggles `CHECKED`, emits `Change`
//! - [`Slider`] - slides to a value, emits `Input` then `Change`
//! - [`TextField`] - single-line entry with clipboard shortcuts
//! - [`Chooser`] - opens a [`Menu`] popup
//! - [`Splits`] - panes with draggable gaps
//! - [`Tabs`] - tab bar over stacked pages
//! - [`SvgView`] - SVG document rendered through a backing image
//! - [`Surface`] - image uploaded straight to the drawer

pub mod button;
pub mod checkbox;
pub mod chooser;
pub mod frame;
pub mod menu;
pub mod slider;
pub mod splits;
pub mod surface;
pub mod svg_view;
pub mod tabs;
pub mod text;
pub mod text_field;

pub use button::Button;
pub use checkbox::Checkbox;
pub use chooser::Chooser;
pub use frame::Frame;
pub use menu::{Menu, MenuBuilder, MenuChoice, MenuItem, MenuRow};
pub use slider::Slider;
pub use splits::{add_pane, Splits};
pub use surface::Surface;
pub use svg_view::SvgView;
pub use tabs::{add_tab, Tabs};
pub use text::Text;
pub use text_field::TextField;
