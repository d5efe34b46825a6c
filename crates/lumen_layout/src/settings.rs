//! Tunables of the core

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stacking of popups that are open at the same time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupOrder {
    /// Most recently pushed on top
    #[default]
    LastOnTop,
    /// Menus and completers below snackbars, regardless of push order
    KindPriority,
}

/// Every timing, distance and pass limit the scene uses.
///
/// Durations are in milliseconds and distances in device pixels unless noted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum press duration before a drag may start
    pub drag_start_time: u64,
    pub drag_start_distance: f32,
    pub slide_start_distance: f32,
    /// Release farther than this from the press is not a click
    pub click_max_distance: f32,
    /// Nominal click window; later releases still click unless a gesture took over
    pub click_max_time: u64,
    pub long_press_time: u64,
    pub long_hover_time: u64,
    /// Motion that cancels a pending long press or long hover
    pub hover_max_distance: f32,
    pub double_click_time: u64,

    /// Cap on SizeDown iterations
    pub size_down_iterations: usize,
    /// Scrollbar strip width in dp
    pub scroll_bar_width: f32,
    pub scroll_wheel_factor: f32,

    /// Let parts with their own listeners join the hit path
    pub parts_receive_events: bool,

    pub fps: u32,
    pub logical_dpi: f32,
    pub popup_order: PopupOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            drag_start_time: 200,
            drag_start_distance: 6.0,
            slide_start_distance: 4.0,
            click_max_distance: 4.0,
            click_max_time: 50,
            long_press_time: 500,
            long_hover_time: 500,
            hover_max_distance: 5.0,
            double_click_time: 500,
            size_down_iterations: 3,
            scroll_bar_width: 10.0,
            scroll_wheel_factor: 1.0,
            parts_receive_events: false,
            fps: 60,
            logical_dpi: 160.0,
            popup_order: PopupOrder::LastOnTop,
        }
    }
}

impl Settings {
    pub fn drag_start(&self) -> Duration {
        Duration::from_millis(self.drag_start_time)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_time)
    }

    pub fn long_hover(&self) -> Duration {
        Duration::from_millis(self.long_hover_time)
    }

    pub fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_time)
    }

    /// Time between paint ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{ "fps": 30, "popup_order": "kind_priority" }"#).unwrap();
        assert_eq!(s.fps, 30);
        assert_eq!(s.popup_order, PopupOrder::KindPriority);
        assert_eq!(s.size_down_iterations, 3);
        assert_eq!(s.frame_interval(), Duration::from_micros(33_333));
    }
}
