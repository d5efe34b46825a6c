//! Remembered window geometry
//!
//! Stored as a JSON object keyed by window name:
//!
//! ```json
//! { "main": { "x": 40, "y": 30, "width": 1024, "height": 768, "fullscreen": false } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowPrefs {
    windows: BTreeMap<String, WindowGeometry>,
}

impl WindowPrefs {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read prefs from `path`; a missing file is an empty document
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::io(path, e)),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| AppError::io(path, e))
    }

    pub fn get(&self, window: &str) -> Option<WindowGeometry> {
        self.windows.get(window).copied()
    }

    pub fn set(&mut self, window: &str, geometry: WindowGeometry) {
        self.windows.insert(window.to_string(), geometry);
    }

    pub fn remove(&mut self, window: &str) -> Option<WindowGeometry> {
        self.windows.remove(window)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_by_window_name() {
        let mut prefs = WindowPrefs::default();
        prefs.set(
            "main",
            WindowGeometry {
                x: 10,
                y: 20,
                width: 640,
                height: 480,
                fullscreen: false,
            },
        );
        let json = prefs.to_json().unwrap();
        assert!(json.contains("\"main\""));

        let back = WindowPrefs::from_json(&json).unwrap();
        assert_eq!(back.get("main").map(|g| g.width), Some(640));
        assert!(back.get("other").is_none());
    }

    #[test]
    fn partial_entries_fill_in() {
        let prefs = WindowPrefs::from_json(r#"{ "editor": { "width": 300 } }"#).unwrap();
        let g = prefs.get("editor").unwrap();
        assert_eq!((g.width, g.height, g.fullscreen), (300, 0, false));
    }

    #[test]
    fn missing_file_is_empty_and_garbage_is_an_error() {
        assert!(WindowPrefs::load("/nonexistent/prefs.json").unwrap().is_empty());
        assert!(matches!(WindowPrefs::from_json("[1, 2"), Err(AppError::Prefs(_))));
    }
}
