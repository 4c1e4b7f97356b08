// ABOUTME: Error types for directory traversal.
// ABOUTME: Distinguishes an unreadable root from failures deeper in the tree.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalkError {
    /// The walk root itself could not be listed.
    #[error("failed to read directory {}: {source}", path.display())]
    DirectoryRead { path: PathBuf, source: io::Error },

    /// An entry below the root could not be inspected or listed.
    #[error("failed to read {}: {source}", path.display())]
    Entry { path: PathBuf, source: io::Error },

    #[error("walk task failed: {0}")]
    Task(String),

    #[error("walk cancelled")]
    Cancelled,
}
