//! Scene graph error types

use thiserror::Error;

use crate::tree::WidgetId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The widget was removed from its scene
    #[error("invalid node {0:?}")]
    InvalidNode(WidgetId),

    /// A style declaration that could not be applied
    #[error("invalid value for '{property}': '{value}'")]
    InvalidProperty { property: String, value: String },

    /// Reparenting would make a widget its own ancestor
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// Content handed to a widget (SVG source, ...) could not be read
    #[error("format error: {0}")]
    Format(String),
}

impl From<lumen_svg::SvgError> for LayoutError {
    fn from(err: lumen_svg::SvgError) -> Self {
        LayoutError::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
