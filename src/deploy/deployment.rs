// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Owns the run's session, options, diagnostics, and the trace of states visited.

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::archive::ReadStrategy;
use crate::diagnostics::Diagnostics;
use crate::remote::{RemoteService, Session};
use crate::types::AppName;
use crate::walk::WalkOptions;

use super::state::{DeploymentState, Idle, Stage};

/// Knobs for a single deploy run.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub walk: WalkOptions,
    pub read_strategy: ReadStrategy,
    /// Query the service for the latest client version before starting.
    pub version_check: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            read_strategy: ReadStrategy::default(),
            version_check: true,
        }
    }
}

/// A deploy run in progress, parameterized by its current state.
///
/// The state type parameter `S` carries whatever the previous stage produced
/// (the parsed config, the fetched rules, the manifest), so a stage cannot be
/// invoked before the one it depends on has resolved. The session is owned by
/// the run and threaded through every transition.
#[derive(Debug)]
pub struct Deployment<S, R> {
    pub(crate) directory: PathBuf,
    pub(crate) app: Option<AppName>,
    pub(crate) options: DeployOptions,
    pub(crate) session: Session<R>,
    pub(crate) trace: Vec<DeploymentState>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) cancel: CancellationToken,
    pub(crate) state: S,
}

impl<R: RemoteService> Deployment<Idle, R> {
    /// Start a run that deploys `directory` over `session`.
    pub fn new(
        directory: impl Into<PathBuf>,
        session: Session<R>,
        options: DeployOptions,
        cancel: CancellationToken,
    ) -> Self {
        Deployment {
            directory: directory.into(),
            app: None,
            options,
            session,
            trace: vec![DeploymentState::Idle],
            diagnostics: Diagnostics::default(),
            cancel,
            state: Idle,
        }
    }

    /// Use `app` instead of the name stored in `fastack.json`.
    pub fn with_app(mut self, app: AppName) -> Self {
        self.app = Some(app);
        self
    }
}

impl<S: Stage, R> Deployment<S, R> {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn app(&self) -> Option<&AppName> {
        self.app.as_ref()
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// The state this deployment is in.
    pub fn state(&self) -> DeploymentState {
        S::STATE
    }

    /// Every state visited so far, oldest first.
    pub fn trace(&self) -> &[DeploymentState] {
        &self.trace
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// State-specific data.
    pub fn stage(&self) -> &S {
        &self.state
    }
}
