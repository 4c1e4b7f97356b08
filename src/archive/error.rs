// ABOUTME: Error types for archive creation.
// ABOUTME: Every variant names the file that was being written or read.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to add {} to archive: {source}", path.display())]
    Append { path: PathBuf, source: io::Error },

    #[error("failed to finalize {}: {source}", path.display())]
    Finalize { path: PathBuf, source: io::Error },

    #[error("archive task failed: {0}")]
    Task(String),

    #[error("packaging cancelled")]
    Cancelled,
}
