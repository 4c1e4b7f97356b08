// ABOUTME: Filesystem entries produced by the directory walker.
// ABOUTME: Each entry keeps both its full path and its path relative to the walk root.

use std::path::{Component, Path, PathBuf};

/// What kind of filesystem object an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single entry discovered under a walk root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSystemEntry {
    path: PathBuf,
    relative: PathBuf,
    kind: EntryKind,
}

impl FileSystemEntry {
    /// Create an entry for `path`, recording where it sits relative to `root`.
    ///
    /// Paths outside `root` keep their full path as the relative one.
    pub fn new(root: &Path, path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        let path = path.into();
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        Self {
            path,
            relative,
            kind,
        }
    }

    /// Full path as discovered on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the walk root.
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// File extension without the leading dot, if it is valid UTF-8.
    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|ext| ext.to_str())
    }

    /// Name used for this entry inside an archive: relative components joined with `/`.
    pub fn archive_name(&self) -> String {
        self.relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
