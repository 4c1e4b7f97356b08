// ABOUTME: Builds the gzip-compressed tar package uploaded on deploy.
// ABOUTME: Filters walked files against deploy rules and finalizes the artifact atomically.

mod error;
mod manifest;
mod rules;

pub use error::ArchiveError;
pub use manifest::ArchiveManifest;
pub use rules::DeployConfig;

use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::config::CONFIG_FILENAME;
use crate::walk::FileSystemEntry;

/// File name of the package written into the deployed directory.
pub const PACKAGE_FILENAME: &str = "fastack-deploy-package.tar.gz";

const PARTIAL_SUFFIX: &str = ".partial";

/// Where the package for `directory` is written.
pub fn package_path(directory: &Path) -> PathBuf {
    directory.join(PACKAGE_FILENAME)
}

/// How file contents are fed into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStrategy {
    /// Read each file fully before appending it.
    ///
    /// Holds one file in memory at a time and never more than one descriptor,
    /// which keeps very wide trees from exhausting the open-file limit.
    #[default]
    Buffered,
    /// Copy each file straight from an open handle into the archive.
    ///
    /// Better for very large individual files.
    Streaming,
}

/// Writes filtered walker output into a single `.tar.gz` artifact.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    strategy: ReadStrategy,
    compression: Compression,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn compression(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Entries that would be packaged, in evaluation order.
    ///
    /// Drops entries rejected by `config`, the local `fastack.json` (it holds
    /// the login token), the artifact itself (or its in-progress twin) from
    /// an earlier run, and entries whose archive name was already taken.
    pub fn select<'a>(
        entries: &'a [FileSystemEntry],
        config: &DeployConfig,
        output_path: &Path,
    ) -> Vec<&'a FileSystemEntry> {
        let partial = partial_path(output_path);
        let mut seen = HashSet::new();
        entries
            .iter()
            .filter(|entry| config.accepts(entry))
            .filter(|entry| entry.relative_path() != Path::new(CONFIG_FILENAME))
            .filter(|entry| entry.path() != output_path && entry.path() != partial)
            .filter(|entry| seen.insert(entry.archive_name()))
            .collect()
    }

    /// Package the accepted entries into `output_path`.
    ///
    /// The archive is written next to the destination under a `.partial`
    /// name and renamed into place only once the gzip stream is complete.
    /// On any failure the partial file is removed, and a stale artifact from
    /// a previous run is removed before writing starts.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` for any I/O or compression failure, or
    /// `ArchiveError::Cancelled` when `cancel` fires between files.
    pub async fn build(
        &self,
        entries: &[FileSystemEntry],
        config: &DeployConfig,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ArchiveManifest, ArchiveError> {
        let selected: Vec<FileSystemEntry> = Self::select(entries, config, output_path)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!(
            accepted = selected.len(),
            walked = entries.len(),
            output = %output_path.display(),
            "building archive"
        );

        let builder = self.clone();
        let output_path = output_path.to_path_buf();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || builder.write(&selected, &output_path, &cancel))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))?
    }

    fn write(
        &self,
        selected: &[FileSystemEntry],
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ArchiveManifest, ArchiveError> {
        let partial = partial_path(output_path);
        remove_if_exists(output_path).map_err(|source| ArchiveError::Create {
            path: output_path.to_path_buf(),
            source,
        })?;

        let uncompressed_bytes = match self.write_partial(selected, &partial, cancel) {
            Ok(bytes) => bytes,
            Err(e) => {
                discard(&partial);
                return Err(e);
            }
        };

        if let Err(source) = fs::rename(&partial, output_path) {
            discard(&partial);
            return Err(ArchiveError::Finalize {
                path: output_path.to_path_buf(),
                source,
            });
        }

        let total_bytes = fs::metadata(output_path)
            .map_err(|source| ArchiveError::Finalize {
                path: output_path.to_path_buf(),
                source,
            })?
            .len();

        let names = selected.iter().map(FileSystemEntry::archive_name).collect();
        Ok(ArchiveManifest::new(
            names,
            total_bytes,
            uncompressed_bytes,
            output_path.to_path_buf(),
        ))
    }

    /// Write the tar.gz stream to `partial`, returning the uncompressed byte count.
    fn write_partial(
        &self,
        selected: &[FileSystemEntry],
        partial: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, ArchiveError> {
        let file = File::create(partial).map_err(|source| ArchiveError::Create {
            path: partial.to_path_buf(),
            source,
        })?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);
        let mut tar = tar::Builder::new(encoder);

        let mut uncompressed = 0u64;
        for entry in selected {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }

            let name = entry.archive_name();
            let appended = match self.strategy {
                ReadStrategy::Buffered => append_buffered(&mut tar, entry.path(), &name),
                ReadStrategy::Streaming => append_streaming(&mut tar, entry.path(), &name),
            };
            uncompressed += appended.map_err(|source| ArchiveError::Append {
                path: entry.path().to_path_buf(),
                source,
            })?;
            tracing::trace!(member = %name, "appended");
        }

        let finalize = |source: io::Error| ArchiveError::Finalize {
            path: partial.to_path_buf(),
            source,
        };
        let encoder = tar.into_inner().map_err(finalize)?;
        let writer = encoder.finish().map_err(finalize)?;
        let file = writer.into_inner().map_err(|e| finalize(e.into_error()))?;
        file.sync_all().map_err(finalize)?;

        Ok(uncompressed)
    }
}

fn append_buffered<W: io::Write>(
    tar: &mut tar::Builder<W>,
    path: &Path,
    name: &str,
) -> io::Result<u64> {
    let metadata = fs::metadata(path)?;
    let data = fs::read(path)?;
    let mut header = tar::Header::new_gnu();
    header.set_metadata(&metadata);
    header.set_size(data.len() as u64);
    tar.append_data(&mut header, name, data.as_slice())?;
    Ok(data.len() as u64)
}

fn append_streaming<W: io::Write>(
    tar: &mut tar::Builder<W>,
    path: &Path,
    name: &str,
) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let metadata = file.metadata()?;
    let expected = metadata.len();
    let mut header = tar::Header::new_gnu();
    header.set_metadata(&metadata);

    // The header already promises `expected` bytes; a short read would
    // leave the member misaligned.
    let mut exact = ExactLength::new((&mut file).take(expected), expected);
    tar.append_data(&mut header, name, &mut exact)?;

    let mut trailing = [0u8; 1];
    if file.read(&mut trailing)? != 0 {
        return Err(io::Error::other(format!(
            "file grew while being archived (expected {expected} bytes)"
        )));
    }
    Ok(expected)
}

/// Reader that fails instead of ending early when fewer than `expected`
/// bytes are available.
struct ExactLength<R> {
    inner: R,
    expected: u64,
    read: u64,
}

impl<R> ExactLength<R> {
    fn new(inner: R, expected: u64) -> Self {
        Self {
            inner,
            expected,
            read: 0,
        }
    }
}

impl<R: Read> Read for ExactLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() && self.read < self.expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "file shrank while being archived ({} of {} bytes)",
                    self.read, self.expected
                ),
            ));
        }
        self.read += n as u64;
        Ok(n)
    }
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn discard(partial: &Path) {
    if let Err(e) = remove_if_exists(partial) {
        tracing::warn!(
            "Failed to remove partial archive {}: {}",
            partial.display(),
            e
        );
    }
}
