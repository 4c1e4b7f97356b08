// ABOUTME: Drives a deployment through every stage in order and reports the outcome.
// ABOUTME: Closes the session exactly once on every exit path.

use crate::archive::ArchiveManifest;
use crate::credentials::CredentialProvider;
use crate::diagnostics::Diagnostics;
use crate::output::Output;
use crate::remote::RemoteService;
use crate::types::AppName;

use super::Deployment;
use super::error::DeployError;
use super::state::{Complete, DeploymentState, Idle, Stage};
use super::version::CLI_VERSION;

/// What one run did.
#[derive(Debug)]
pub struct RunReport {
    /// States visited, oldest first. Ends in `Complete` or `Failed`.
    pub trace: Vec<DeploymentState>,
    /// The package, when packaging finished.
    pub manifest: Option<ArchiveManifest>,
    pub diagnostics: Diagnostics,
    pub app: Option<AppName>,
    pub outcome: Result<(), DeployError>,
}

impl RunReport {
    pub fn final_state(&self) -> DeploymentState {
        self.trace
            .last()
            .copied()
            .unwrap_or(DeploymentState::Idle)
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_ok() && self.final_state() == DeploymentState::Complete
    }

    pub fn error(&self) -> Option<&DeployError> {
        self.outcome.as_ref().err()
    }
}

impl<S: Stage, R: RemoteService> Deployment<S, R> {
    /// Close the session and record the failure.
    pub async fn abort(mut self, error: DeployError) -> RunReport {
        tracing::debug!(stage = %error.stage(), "aborting deployment: {}", error);
        self.session.close().await;
        self.trace.push(DeploymentState::Failed);

        let Deployment {
            trace,
            diagnostics,
            app,
            state,
            ..
        } = self;

        RunReport {
            trace,
            manifest: state.into_manifest(),
            diagnostics,
            app,
            outcome: Err(error),
        }
    }
}

impl<R: RemoteService> Deployment<Complete, R> {
    pub fn into_report(self) -> RunReport {
        let Deployment {
            trace,
            diagnostics,
            app,
            state,
            ..
        } = self;

        RunReport {
            trace,
            manifest: Some(state.manifest),
            diagnostics,
            app,
            outcome: Ok(()),
        }
    }
}

/// Run every stage of `deployment` in sequence.
///
/// The first failing stage stops the run; the session is closed before the
/// report is returned whether or not it was ever opened.
pub async fn run<R: RemoteService>(
    deployment: Deployment<Idle, R>,
    credentials: &dyn CredentialProvider,
    output: &Output,
) -> RunReport {
    macro_rules! advance {
        ($step:expr) => {
            match $step.await {
                Ok(next) => next,
                Err((failed, error)) => return failed.abort(error).await,
            }
        };
    }

    let deployment = if deployment.options.version_check {
        output.progress("  → Checking client version...");
        advance!(deployment.check_version(CLI_VERSION))
    } else {
        deployment
    };

    output.progress("  → Reading fastack.json...");
    let deployment = advance!(deployment.configure());

    output.progress("  → Connecting...");
    let deployment = advance!(deployment.connect());

    output.progress("  → Fetching deploy config...");
    let deployment = advance!(deployment.fetch_deploy_config());

    output.progress("  → Packaging...");
    let deployment = advance!(deployment.package());
    output.progress(&format!(
        "  → Packaged {} file(s), {} bytes",
        deployment.stage().manifest().len(),
        deployment.stage().manifest().total_bytes()
    ));

    output.progress("  → Authenticating...");
    let deployment = advance!(deployment.authenticate(credentials));

    deployment.finalize().await.into_report()
}
