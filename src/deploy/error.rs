// ABOUTME: Deploy run errors with SNAFU pattern, one variant per stage.
// ABOUTME: Every variant names the stage it aborted so the run can report it.

use snafu::Snafu;
use std::path::PathBuf;

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::credentials::CredentialError;
use crate::remote::{RemoteError, RemoteErrorKind};
use crate::walk::WalkError;

use super::state::DeploymentState;

/// Why a deploy run stopped before `Complete`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeployError {
    #[snafu(display("configure failed: {source}"))]
    Configure { source: ConfigError },

    #[snafu(display("connect failed: {source}"))]
    Connect { source: RemoteError },

    #[snafu(display("fetch deploy config failed: {source}"))]
    FetchDeployConfig { source: RemoteError },

    #[snafu(display("package failed while walking {}: {source}", directory.display()))]
    Walk {
        directory: PathBuf,
        source: WalkError,
    },

    #[snafu(display("package failed: {source}"))]
    Package { source: ArchiveError },

    #[snafu(display("authenticate failed: {source}"))]
    Credentials { source: CredentialError },

    #[snafu(display("authenticate failed: {source}"))]
    Authenticate { source: RemoteError },

    #[snafu(display("version check failed: {source}"))]
    VersionCheck { source: RemoteError },

    #[snafu(display(
        "fastack {local} is out of date (latest is {remote}); upgrade with `cargo install fastack`"
    ))]
    VersionMismatch { local: String, remote: String },

    #[snafu(display("cancelled during {stage}"))]
    Cancelled { stage: DeploymentState },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// No `fastack.json` in the target directory.
    ConfigMissing,
    /// `fastack.json` unreadable or malformed.
    ConfigParse,
    /// The RPC session could not be opened.
    Connection,
    /// A remote method call failed.
    RemoteCall,
    /// The root of the walk could not be listed.
    DirectoryRead,
    /// An entry below the root could not be read.
    Walk,
    /// Writing the package failed.
    Archive,
    /// Login or credential collection failed.
    Auth,
    /// The client is older than the published release.
    VersionMismatch,
    /// The user aborted the run.
    Cancelled,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Configure { source } => match source {
                ConfigError::Missing(_) => DeployErrorKind::ConfigMissing,
                _ => DeployErrorKind::ConfigParse,
            },
            DeployError::Connect { source } | DeployError::VersionCheck { source } => {
                remote_kind(source)
            }
            DeployError::FetchDeployConfig { source } => match source.kind() {
                RemoteErrorKind::Connection => DeployErrorKind::Connection,
                _ => DeployErrorKind::RemoteCall,
            },
            DeployError::Walk { source, .. } => match source {
                WalkError::DirectoryRead { .. } => DeployErrorKind::DirectoryRead,
                _ => DeployErrorKind::Walk,
            },
            DeployError::Package { .. } => DeployErrorKind::Archive,
            DeployError::Credentials { .. } | DeployError::Authenticate { .. } => {
                DeployErrorKind::Auth
            }
            DeployError::VersionMismatch { .. } => DeployErrorKind::VersionMismatch,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
        }
    }

    /// The stage the run was entering when it failed.
    pub fn stage(&self) -> DeploymentState {
        match self {
            DeployError::Configure { .. } => DeploymentState::Configured,
            DeployError::Connect { .. } => DeploymentState::Connected,
            DeployError::FetchDeployConfig { .. } => DeploymentState::ConfigFetched,
            DeployError::Walk { .. } | DeployError::Package { .. } => DeploymentState::Packaged,
            DeployError::Credentials { .. } | DeployError::Authenticate { .. } => {
                DeploymentState::Authenticated
            }
            DeployError::VersionCheck { .. } | DeployError::VersionMismatch { .. } => {
                DeploymentState::Idle
            }
            DeployError::Cancelled { stage } => *stage,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployError::Cancelled { .. })
    }
}

fn remote_kind(source: &RemoteError) -> DeployErrorKind {
    match source.kind() {
        RemoteErrorKind::Connection => DeployErrorKind::Connection,
        RemoteErrorKind::RemoteCall => DeployErrorKind::RemoteCall,
        RemoteErrorKind::Auth => DeployErrorKind::Auth,
    }
}
