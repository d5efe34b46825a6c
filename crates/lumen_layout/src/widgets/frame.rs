//! Plain container

use crate::style::{Direction, Display, Style};
use crate::widget::{Widget, WidgetMut};

/// A container with no content of its own.
///
/// Frames are where layout happens: direction, wrap, grid columns and
/// stacking are all set through the frame's style. The constructors only
/// seed `first` stylers, so stylesheets and later stylers still win.
#[derive(Clone, Copy, Debug, Default)]
pub struct Frame {
    display: Option<Display>,
    direction: Option<Direction>,
    columns: Option<usize>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame laying its children out top to bottom
    pub fn column() -> Self {
        Self {
            direction: Some(Direction::Column),
            ..Self::default()
        }
    }

    pub fn row() -> Self {
        Self {
            direction: Some(Direction::Row),
            ..Self::default()
        }
    }

    pub fn grid(columns: usize) -> Self {
        Self {
            display: Some(Display::Grid),
            columns: Some(columns),
            ..Self::default()
        }
    }

    /// Children share the content box and only one is shown
    pub fn stacked() -> Self {
        Self {
            display: Some(Display::Stacked),
            ..Self::default()
        }
    }
}

impl Widget for Frame {
    fn type_name(&self) -> &'static str {
        "frame"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        let Frame {
            display,
            direction,
            columns,
        } = *self;
        if display.is_none() && direction.is_none() && columns.is_none() {
            return;
        }
        w.first_styler(move |s: &mut Style| {
            if let Some(d) = display {
                s.display = d;
            }
            if let Some(d) = direction {
                s.direction = d;
            }
            if let Some(c) = columns {
                s.columns = c;
            }
        });
    }
}
