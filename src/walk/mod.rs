// ABOUTME: Concurrent directory traversal producing a one-shot snapshot of files.
// ABOUTME: Lists one directory per task and joins every task before returning.

mod entry;
mod error;

pub use entry::{EntryKind, FileSystemEntry};
pub use error::WalkError;

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::DirEntry;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default cap on directories listed at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// How the walker reacts to entries it cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkMode {
    /// Abort the walk on the first unreadable entry.
    #[default]
    Strict,
    /// Skip unreadable entries and report them in [`WalkOutput::skipped`].
    Lenient,
}

/// Tuning for a walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub mode: WalkMode,
    /// Maximum number of directory listings in flight.
    pub max_concurrency: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            mode: WalkMode::Strict,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl WalkOptions {
    pub fn mode(mut self, mode: WalkMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }
}

/// An entry skipped in lenient mode.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a walk produced.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Files in completion order; callers must not rely on the ordering.
    pub entries: Vec<FileSystemEntry>,
    pub skipped: Vec<SkippedEntry>,
}

/// Result of listing a single directory.
#[derive(Debug, Default)]
struct Listing {
    files: Vec<FileSystemEntry>,
    subdirs: Vec<PathBuf>,
    failures: Vec<(PathBuf, io::Error)>,
}

/// Walk `root` in strict mode and return every file beneath it.
///
/// # Errors
///
/// Returns `WalkError::DirectoryRead` if the root cannot be listed and
/// `WalkError::Entry` for the first unreadable entry below it.
pub async fn walk(root: &Path) -> Result<Vec<FileSystemEntry>, WalkError> {
    let output = walk_with(root, &WalkOptions::default(), &CancellationToken::new()).await?;
    Ok(output.entries)
}

/// Walk `root` with explicit options and a cancellation signal.
///
/// Every subdirectory is listed on its own task. Pending directories wait in a
/// queue until a slot frees up, so at most `max_concurrency` listings run at
/// once. The call resolves only after every spawned task has been joined.
///
/// # Errors
///
/// See [`walk`]. Lenient mode only fails on an unreadable root, a panicked
/// task, or cancellation.
pub async fn walk_with(
    root: &Path,
    options: &WalkOptions,
    cancel: &CancellationToken,
) -> Result<WalkOutput, WalkError> {
    let root = root.to_path_buf();
    let limit = options.max_concurrency.max(1);

    let listing = list_directory(&root, &root)
        .await
        .map_err(|source| WalkError::DirectoryRead {
            path: root.clone(),
            source,
        })?;

    let mut output = WalkOutput::default();
    let mut pending = VecDeque::new();
    absorb(listing, options.mode, &mut output, &mut pending)?;

    let mut tasks = JoinSet::new();
    loop {
        while tasks.len() < limit {
            let Some(dir) = pending.pop_front() else {
                break;
            };
            let root = root.clone();
            tasks.spawn(async move {
                let result = list_directory(&root, &dir).await;
                (dir, result)
            });
        }

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WalkError::Cancelled),
            joined = tasks.join_next() => joined,
        };

        // The queue is drained whenever the set runs empty, so this is the end.
        let Some(joined) = joined else {
            break;
        };

        let (dir, result) = joined.map_err(|e| WalkError::Task(e.to_string()))?;
        match result {
            Ok(listing) => absorb(listing, options.mode, &mut output, &mut pending)?,
            Err(source) => record_failure(dir, source, options.mode, &mut output)?,
        }
    }

    tracing::debug!(
        root = %root.display(),
        files = output.entries.len(),
        skipped = output.skipped.len(),
        "walk complete"
    );
    Ok(output)
}

/// Merge one directory listing into the walk output.
fn absorb(
    listing: Listing,
    mode: WalkMode,
    output: &mut WalkOutput,
    pending: &mut VecDeque<PathBuf>,
) -> Result<(), WalkError> {
    for (path, source) in listing.failures {
        record_failure(path, source, mode, output)?;
    }
    output.entries.extend(listing.files);
    pending.extend(listing.subdirs);
    Ok(())
}

fn record_failure(
    path: PathBuf,
    source: io::Error,
    mode: WalkMode,
    output: &mut WalkOutput,
) -> Result<(), WalkError> {
    match mode {
        WalkMode::Strict => Err(WalkError::Entry { path, source }),
        WalkMode::Lenient => {
            tracing::warn!("Skipping unreadable entry {}: {}", path.display(), source);
            output.skipped.push(SkippedEntry {
                path,
                reason: source.to_string(),
            });
            Ok(())
        }
    }
}

async fn list_directory(root: &Path, dir: &Path) -> io::Result<Listing> {
    tracing::trace!(dir = %dir.display(), "listing directory");
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut listing = Listing::default();

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        match classify(&entry).await {
            Ok(Some(EntryKind::Directory)) => listing.subdirs.push(path),
            Ok(Some(EntryKind::File)) => {
                listing
                    .files
                    .push(FileSystemEntry::new(root, path, EntryKind::File));
            }
            Ok(None) => tracing::debug!(path = %path.display(), "ignoring special file"),
            Err(e) => listing.failures.push((path, e)),
        }
    }

    Ok(listing)
}

/// Decide whether an entry is a file to record or a directory to descend into.
///
/// Symlinks to files count as files. Symlinked directories are not followed,
/// which keeps link cycles from recursing forever.
async fn classify(entry: &DirEntry) -> io::Result<Option<EntryKind>> {
    let file_type = entry.file_type().await?;
    if file_type.is_dir() {
        return Ok(Some(EntryKind::Directory));
    }
    if file_type.is_file() {
        return Ok(Some(EntryKind::File));
    }
    if file_type.is_symlink() {
        let metadata = tokio::fs::metadata(entry.path()).await?;
        if metadata.is_file() {
            return Ok(Some(EntryKind::File));
        }
    }
    Ok(None)
}
