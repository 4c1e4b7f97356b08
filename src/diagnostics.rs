// ABOUTME: Non-fatal problems noticed while packaging a deploy.
// ABOUTME: Each warning keeps the path it concerns so output can report it structurally.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Warnings gathered over one deploy run, in the order they were noticed.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(
            kind = ?warning.kind(),
            path = %warning.path().display(),
            "{}",
            warning
        );
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind() == kind)
    }
}

/// Something that did not stop the deploy but left the package different
/// from what the user may expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A lenient walk could not read `path` and left it out.
    SkippedEntry { path: PathBuf, reason: String },
    /// Nothing under `directory` matched the deploy rules.
    EmptyPackage { directory: PathBuf },
}

impl Warning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::SkippedEntry { .. } => WarningKind::SkippedEntry,
            Warning::EmptyPackage { .. } => WarningKind::EmptyPackage,
        }
    }

    /// The file or directory the warning is about.
    pub fn path(&self) -> &Path {
        match self {
            Warning::SkippedEntry { path, .. } => path,
            Warning::EmptyPackage { directory } => directory,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SkippedEntry { path, reason } => {
                write!(f, "skipped {}: {}", path.display(), reason)
            }
            Warning::EmptyPackage { directory } => write!(
                f,
                "no files in {} matched the deploy rules",
                directory.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    SkippedEntry,
    EmptyPackage,
}
