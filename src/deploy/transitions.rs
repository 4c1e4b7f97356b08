// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state, or itself with the error on failure.

use snafu::ResultExt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::archive::{ArchiveBuilder, ArchiveError, package_path};
use crate::config::ProjectConfig;
use crate::credentials::CredentialProvider;
use crate::diagnostics::Warning;
use crate::remote::RemoteService;
use crate::walk::{WalkError, walk_with};

use super::Deployment;
use super::error::{
    AuthenticateSnafu, CancelledSnafu, ConfigureSnafu, ConnectSnafu, CredentialsSnafu,
    DeployError, FetchDeployConfigSnafu,
};
use super::state::{
    Authenticated, Complete, ConfigFetched, Configured, Connected, DeploymentState, Idle,
    Packaged, Stage,
};

/// Result type for transitions; a failed transition hands the deployment back
/// so the caller can still close its session.
pub type TransitionResult<T, S, R> = Result<Deployment<T, R>, (Deployment<S, R>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S: Stage, R> Deployment<S, R> {
    /// Move to the next state, recording it in the trace.
    pub(crate) fn transition<T: Stage>(self, next: impl FnOnce(S) -> T) -> Deployment<T, R> {
        let Deployment {
            directory,
            app,
            options,
            session,
            mut trace,
            diagnostics,
            cancel,
            state,
        } = self;

        trace.push(T::STATE);
        tracing::debug!(state = %T::STATE, "deployment advanced");

        Deployment {
            directory,
            app,
            options,
            session,
            trace,
            diagnostics,
            cancel,
            state: next(state),
        }
    }

    /// Fail fast when the run was cancelled before `next` started.
    fn ensure_active(&self, next: DeploymentState) -> Result<(), DeployError> {
        if self.cancel.is_cancelled() {
            return CancelledSnafu { stage: next }.fail();
        }
        Ok(())
    }
}

/// Run `operation`, giving up as soon as `cancel` fires.
pub(crate) async fn until_cancelled<T>(
    cancel: &CancellationToken,
    stage: DeploymentState,
    operation: impl Future<Output = Result<T, DeployError>>,
) -> Result<T, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => CancelledSnafu { stage }.fail(),
        result = operation => result,
    }
}

// =============================================================================
// Idle -> Configured
// =============================================================================

impl<R: RemoteService> Deployment<Idle, R> {
    /// Read and parse `fastack.json` from the target directory.
    ///
    /// Timeouts and retry settings from the file are applied to the session.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Configure` when the file is missing, unreadable,
    /// malformed, or names an invalid app.
    pub async fn configure(mut self) -> TransitionResult<Configured, Idle, R> {
        if let Err(e) = self.ensure_active(DeploymentState::Configured) {
            return Err((self, e));
        }

        let project = match ProjectConfig::discover(&self.directory)
            .await
            .context(ConfigureSnafu)
        {
            Ok(project) => project,
            Err(e) => return Err((self, e)),
        };

        match project.app_name().context(ConfigureSnafu) {
            Ok(app) => {
                if self.app.is_none() {
                    self.app = app;
                }
            }
            Err(e) => return Err((self, e)),
        }

        self.session.set_settings(project.session_settings());
        tracing::info!(
            directory = %self.directory.display(),
            app = ?self.app.as_ref().map(|app| app.as_str()),
            "configuration loaded"
        );
        Ok(self.transition(|_| Configured { project }))
    }
}

// =============================================================================
// Configured -> Connected
// =============================================================================

impl<R: RemoteService> Deployment<Configured, R> {
    /// Open the RPC session.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Connect` once connect retries are exhausted.
    pub async fn connect(mut self) -> TransitionResult<Connected, Configured, R> {
        if let Err(e) = self.ensure_active(DeploymentState::Connected) {
            return Err((self, e));
        }

        let session = &mut self.session;
        let connected = until_cancelled(&self.cancel, DeploymentState::Connected, async move {
            session.connect().await.context(ConnectSnafu)
        })
        .await;

        match connected {
            Ok(()) => Ok(self.transition(|configured| Connected {
                project: configured.project,
            })),
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Connected -> ConfigFetched
// =============================================================================

impl<R: RemoteService> Deployment<Connected, R> {
    /// Ask the service for its packaging rules.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::FetchDeployConfig` when the call fails or the
    /// response is not a valid rule set.
    pub async fn fetch_deploy_config(mut self) -> TransitionResult<ConfigFetched, Connected, R> {
        if let Err(e) = self.ensure_active(DeploymentState::ConfigFetched) {
            return Err((self, e));
        }

        let session = &mut self.session;
        let fetched = until_cancelled(&self.cancel, DeploymentState::ConfigFetched, async move {
            session
                .get_deploy_config()
                .await
                .context(FetchDeployConfigSnafu)
        })
        .await;

        match fetched {
            Ok(rules) => {
                tracing::debug!(
                    extensions = rules.acceptable_extensions.len(),
                    ignored = rules.ignore_directories.len(),
                    "deploy config received"
                );
                Ok(self.transition(|connected| ConfigFetched {
                    project: connected.project,
                    rules,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// ConfigFetched -> Packaged
// =============================================================================

impl<R: RemoteService> Deployment<ConfigFetched, R> {
    /// Walk the target directory and write the filtered package.
    ///
    /// In lenient walk mode unreadable entries are recorded as warnings.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Walk` or `DeployError::Package` on I/O failure,
    /// or `DeployError::Cancelled` when the walk or archive loop was aborted.
    pub async fn package(mut self) -> TransitionResult<Packaged, ConfigFetched, R> {
        if let Err(e) = self.ensure_active(DeploymentState::Packaged) {
            return Err((self, e));
        }

        let walked = walk_with(&self.directory, &self.options.walk, &self.cancel)
            .await
            .map_err(|source| match source {
                WalkError::Cancelled => DeployError::Cancelled {
                    stage: DeploymentState::Packaged,
                },
                source => DeployError::Walk {
                    directory: self.directory.clone(),
                    source,
                },
            });
        let walked = match walked {
            Ok(walked) => walked,
            Err(e) => return Err((self, e)),
        };

        for skipped in &walked.skipped {
            self.diagnostics.warn(Warning::SkippedEntry {
                path: skipped.path.clone(),
                reason: skipped.reason.clone(),
            });
        }

        let output_path = package_path(&self.directory);
        let built = ArchiveBuilder::new()
            .read_strategy(self.options.read_strategy)
            .build(
                &walked.entries,
                &self.state.rules,
                &output_path,
                &self.cancel,
            )
            .await
            .map_err(|source| match source {
                ArchiveError::Cancelled => DeployError::Cancelled {
                    stage: DeploymentState::Packaged,
                },
                source => DeployError::Package { source },
            });
        let manifest = match built {
            Ok(manifest) => manifest,
            Err(e) => return Err((self, e)),
        };

        if manifest.is_empty() {
            self.diagnostics.warn(Warning::EmptyPackage {
                directory: self.directory.clone(),
            });
        }

        tracing::info!(
            files = manifest.len(),
            bytes = manifest.total_bytes(),
            output = %manifest.output_path().display(),
            "package written"
        );
        Ok(self.transition(|fetched| Packaged {
            project: fetched.project,
            manifest,
        }))
    }
}

// =============================================================================
// Packaged -> Authenticated
// =============================================================================

impl<R: RemoteService> Deployment<Packaged, R> {
    /// Log in with the stored token, or with credentials from `credentials`
    /// when the config has none.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Credentials` when no credentials could be
    /// collected, or `DeployError::Authenticate` when the service rejects them.
    pub async fn authenticate(
        mut self,
        credentials: &dyn CredentialProvider,
    ) -> TransitionResult<Authenticated, Packaged, R> {
        if let Err(e) = self.ensure_active(DeploymentState::Authenticated) {
            return Err((self, e));
        }

        let token = self.state.project.token().map(str::to_owned);
        let session = &mut self.session;
        let login = async move {
            match token {
                Some(token) => {
                    tracing::debug!("logging in with stored token");
                    session
                        .login_with_token(&token)
                        .await
                        .context(AuthenticateSnafu)
                }
                None => {
                    let credentials = credentials.credentials().await.context(CredentialsSnafu)?;
                    tracing::debug!(username = credentials.username(), "logging in with password");
                    session
                        .login_with_username(credentials.username(), credentials.password())
                        .await
                        .context(AuthenticateSnafu)
                }
            }
        };

        match until_cancelled(&self.cancel, DeploymentState::Authenticated, login).await {
            Ok(()) => Ok(self.transition(|packaged| Authenticated {
                manifest: packaged.manifest,
            })),
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Authenticated -> Complete
// =============================================================================

impl<R: RemoteService> Deployment<Authenticated, R> {
    /// Close the session. Cannot fail.
    pub async fn finalize(mut self) -> Deployment<Complete, R> {
        self.session.close().await;
        self.transition(|authenticated| Complete {
            manifest: authenticated.manifest,
        })
    }
}
