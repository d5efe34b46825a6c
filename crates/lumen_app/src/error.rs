//! Error types for lumen_app

use std::path::PathBuf;

use thiserror::Error;

use crate::stage::StageKind;

/// Errors that can occur in a Lumen application
#[derive(Error, Debug)]
pub enum AppError {
    /// Windowing backend or Drawer failure
    #[error(transparent)]
    Platform(#[from] lumen_platform::PlatformError),

    #[error(transparent)]
    Layout(#[from] lumen_layout::LayoutError),

    #[error(transparent)]
    Svg(#[from] lumen_svg::SvgError),

    /// The configuration file is not valid TOML for [`crate::AppConfig`]
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The window preferences document could not be read or written
    #[error("window preferences: {0}")]
    Prefs(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage was pushed onto a manager that does not hold its kind
    #[error("a {kind:?} stage cannot be pushed onto a {manager} stage manager")]
    StageKind { kind: StageKind, manager: &'static str },

    /// No render window is open
    #[error("no render window")]
    NoWindow,

    /// Error returned by an application callback
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for lumen_app operations
pub type Result<T> = std::result::Result<T, AppError>;
