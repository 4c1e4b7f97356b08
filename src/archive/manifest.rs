// ABOUTME: Summary of one packaging run.
// ABOUTME: Lists archive member names in write order plus artifact sizes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Immutable record of a finalized archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveManifest {
    entries: Vec<String>,
    total_bytes: u64,
    uncompressed_bytes: u64,
    output_path: PathBuf,
    created_at: DateTime<Utc>,
}

impl ArchiveManifest {
    pub(crate) fn new(
        entries: Vec<String>,
        total_bytes: u64,
        uncompressed_bytes: u64,
        output_path: PathBuf,
    ) -> Self {
        Self {
            entries,
            total_bytes,
            uncompressed_bytes,
            output_path,
            created_at: Utc::now(),
        }
    }

    /// Archive member names, in the order they were written.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Size of the compressed artifact on disk.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Sum of the packaged file sizes before compression.
    pub fn uncompressed_bytes(&self) -> u64 {
        self.uncompressed_bytes
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }
}
