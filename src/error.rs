use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A click could not be delivered by the native injector. Fatal to the
/// current run, not to the process.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InjectError(pub String);

/// Application-wide error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration, rejected before any run starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested mode cannot run in this environment (no terminal raw
    /// mode, no display, ...).
    #[error("environment error: {0}")]
    Environment(String),

    /// Native click injection failed mid-run.
    #[error("click injection failed: {0}")]
    Inject(#[from] InjectError),

    /// The lifetime counter file is unreadable or malformed at startup.
    #[error("lifetime counter file {}: {message}", .path.display())]
    Counter { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }

    pub fn environment(message: impl Into<String>) -> Self {
        AppError::Environment(message.into())
    }
}
