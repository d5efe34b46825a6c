//! Application configuration loaded from TOML
//!
//! ```toml
//! name = "notes"
//! prefs_file = "window-prefs.json"
//! snackbar_timeout = 3000
//!
//! [window]
//! title = "Notes"
//! width = 1024
//! height = 768
//!
//! [settings]
//! fps = 30
//! popup_order = "kind_priority"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lumen_core::Color;
use lumen_layout::Settings;
use lumen_platform::WindowConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Defaults for windows opened without an explicit [`WindowConfig`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDefaults {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Scene background as `#rrggbb`
    pub background: String,
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            width: 800,
            height: 600,
            resizable: true,
            background: "#ffffff".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Where window geometry is remembered between runs; none disables it
    pub prefs_file: Option<PathBuf>,
    /// Milliseconds a snackbar stays up
    pub snackbar_timeout: u64,
    pub window: WindowDefaults,
    pub settings: Settings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "lumen".to_string(),
            prefs_file: None,
            snackbar_timeout: 4000,
            window: WindowDefaults::default(),
            settings: Settings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), name = %config.name, "loaded config");
        Ok(config)
    }

    pub fn snackbar_timeout(&self) -> Duration {
        Duration::from_millis(self.snackbar_timeout)
    }

    /// Window configuration built from the `[window]` table
    pub fn window_config(&self) -> WindowConfig {
        WindowConfig::new(self.window.title.clone())
            .with_size(self.window.width, self.window.height)
            .resizable(self.window.resizable)
    }

    pub fn background(&self) -> Color {
        match lumen_core::parse::parse_color(&self.window.background) {
            Some(color) => color,
            None => {
                tracing::warn!(value = %self.window.background, "invalid window background");
                Color::WHITE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lumen_layout::PopupOrder;

    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn nested_tables_override_defaults() {
        let config = AppConfig::from_toml_str(
            r##"
            name = "notes"
            snackbar_timeout = 1500

            [window]
            title = "Notes"
            width = 1024
            background = "#000000"

            [settings]
            fps = 30
            popup_order = "kind_priority"
            "##,
        )
        .unwrap();
        assert_eq!(config.name, "notes");
        assert_eq!(config.snackbar_timeout(), Duration::from_millis(1500));
        assert_eq!((config.window.width, config.window.height), (1024, 600));
        assert_eq!(config.settings.fps, 30);
        assert_eq!(config.settings.popup_order, PopupOrder::KindPriority);
        assert_eq!(config.settings.size_down_iterations, 3);
        assert_eq!(config.background(), Color::BLACK);

        let wc = config.window_config();
        assert_eq!(wc.title, "Notes");
        assert_eq!(wc.width, 1024);
    }

    #[test]
    fn type_errors_are_reported() {
        let err = AppConfig::from_toml_str("snackbar_timeout = \"soon\"").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::load("/nonexistent/lumen.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lumen.toml"));
    }
}
