//! Backend error types

use thiserror::Error;

/// Errors reported by a windowing backend or its Drawer
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Failed to initialize platform
    #[error("Platform initialization failed: {0}")]
    InitFailed(String),

    /// Failed to create window
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// The Drawer rejected an operation
    #[error("Drawer error: {0}")]
    Drawer(String),

    /// The window or its event channel is gone
    #[error("Window closed")]
    Closed,

    /// Platform not supported on this OS
    #[error("Platform not supported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
