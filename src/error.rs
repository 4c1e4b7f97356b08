// ABOUTME: Application-wide error types for fastack.
// ABOUTME: Uses thiserror for ergonomic error handling and maps failures to exit codes.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::deploy::DeployError;
use crate::remote::RemoteError;

/// Exit code for a run the user interrupted.
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Deploy(e) if e.is_cancelled() => EXIT_CANCELLED,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
