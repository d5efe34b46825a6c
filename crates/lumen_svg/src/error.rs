//! SVG error types

use std::io;
use thiserror::Error;

/// Errors that can occur when loading, resolving or rendering SVG documents
#[derive(Error, Debug)]
pub enum SvgError {
    /// IO error when reading the file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed XML or a value that could not be read
    #[error("SVG parsing error: {0}")]
    Parse(String),

    /// Unsupported SVG feature
    #[error("Unsupported SVG feature: {0}")]
    Unsupported(String),

    /// A `url(#id)` or `href` that names no suitable element
    #[error("missing reference: #{0}")]
    MissingReference(String),

    /// A reference chain that loops back on itself
    #[error("reference cycle through #{0}")]
    CycleDetected(String),

    /// The render target could not be allocated
    #[error("cannot allocate a {0}x{1} render target")]
    Target(u32, u32),
}

pub type Result<T> = std::result::Result<T, SvgError>;
