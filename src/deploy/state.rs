// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each marker carries the data its stage produced, so later stages cannot run without it.

use std::fmt;

use crate::archive::{ArchiveManifest, DeployConfig};
use crate::config::ProjectConfig;

/// Where a run is in the deploy sequence.
///
/// States advance strictly in declaration order; `Failed` is reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeploymentState {
    Idle,
    Configured,
    Connected,
    ConfigFetched,
    Packaged,
    Authenticated,
    Complete,
    Failed,
}

impl DeploymentState {
    /// True for `Complete` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentState::Complete | DeploymentState::Failed)
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentState::Idle => "idle",
            DeploymentState::Configured => "configure",
            DeploymentState::Connected => "connect",
            DeploymentState::ConfigFetched => "fetch deploy config",
            DeploymentState::Packaged => "package",
            DeploymentState::Authenticated => "authenticate",
            DeploymentState::Complete => "complete",
            DeploymentState::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Implemented by every state marker.
pub trait Stage: sealed::Sealed {
    const STATE: DeploymentState;

    /// The package built by this run, once packaging has happened.
    fn into_manifest(self) -> Option<ArchiveManifest>
    where
        Self: Sized,
    {
        None
    }
}

/// Initial state: nothing read, session unopened.
/// Available actions: `check_version()`, `configure()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Local config loaded.
/// Available actions: `connect()`
#[derive(Debug, Clone)]
pub struct Configured {
    pub(crate) project: ProjectConfig,
}

/// Session open.
/// Available actions: `fetch_deploy_config()`
#[derive(Debug, Clone)]
pub struct Connected {
    pub(crate) project: ProjectConfig,
}

/// Packaging rules received from the service.
/// Available actions: `package()`
#[derive(Debug, Clone)]
pub struct ConfigFetched {
    pub(crate) project: ProjectConfig,
    pub(crate) rules: DeployConfig,
}

/// Archive written.
/// Available actions: `authenticate()`
#[derive(Debug, Clone)]
pub struct Packaged {
    pub(crate) project: ProjectConfig,
    pub(crate) manifest: ArchiveManifest,
}

/// Logged in.
/// Available actions: `finalize()`
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub(crate) manifest: ArchiveManifest,
}

/// Session closed after a successful run.
/// Available actions: `into_report()`
#[derive(Debug, Clone)]
pub struct Complete {
    pub(crate) manifest: ArchiveManifest,
}

impl Configured {
    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }
}

impl ConfigFetched {
    pub fn rules(&self) -> &DeployConfig {
        &self.rules
    }
}

impl Packaged {
    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }
}

impl Authenticated {
    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }
}

impl Complete {
    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }
}

impl sealed::Sealed for Idle {}
impl sealed::Sealed for Configured {}
impl sealed::Sealed for Connected {}
impl sealed::Sealed for ConfigFetched {}
impl sealed::Sealed for Packaged {}
impl sealed::Sealed for Authenticated {}
impl sealed::Sealed for Complete {}

impl Stage for Idle {
    const STATE: DeploymentState = DeploymentState::Idle;
}

impl Stage for Configured {
    const STATE: DeploymentState = DeploymentState::Configured;
}

impl Stage for Connected {
    const STATE: DeploymentState = DeploymentState::Connected;
}

impl Stage for ConfigFetched {
    const STATE: DeploymentState = DeploymentState::ConfigFetched;
}

impl Stage for Packaged {
    const STATE: DeploymentState = DeploymentState::Packaged;

    fn into_manifest(self) -> Option<ArchiveManifest> {
        Some(self.manifest)
    }
}

impl Stage for Authenticated {
    const STATE: DeploymentState = DeploymentState::Authenticated;

    fn into_manifest(self) -> Option<ArchiveManifest> {
        Some(self.manifest)
    }
}

impl Stage for Complete {
    const STATE: DeploymentState = DeploymentState::Complete;

    fn into_manifest(self) -> Option<ArchiveManifest> {
        Some(self.manifest)
    }
}
