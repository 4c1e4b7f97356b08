// ABOUTME: Pre-flight client version gate run before the deploy sequence starts.
// ABOUTME: Aborts the run with an upgrade instruction when the service publishes a different version.

use snafu::ResultExt;

use crate::remote::RemoteService;

use super::Deployment;
use super::error::{ConnectSnafu, DeployError, VersionCheckSnafu, VersionMismatchSnafu};
use super::state::{DeploymentState, Idle};
use super::transitions::{TransitionResult, until_cancelled};

/// Version of this client.
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compare the local version against the published one.
///
/// Any difference counts as a mismatch; the service publishes exactly one
/// supported version.
pub fn check_versions(local: &str, remote: &str) -> Result<(), DeployError> {
    let (local, remote) = (local.trim(), remote.trim());
    if local == remote {
        return Ok(());
    }
    VersionMismatchSnafu { local, remote }.fail()
}

impl<R: RemoteService> Deployment<Idle, R> {
    /// Ask the service for the latest client version and compare it to `local`.
    ///
    /// This is a short-circuit rather than a stage: the trace is unchanged.
    /// It opens the session early, so the following `connect()` finds it
    /// already open.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::VersionMismatch` when the versions differ, or
    /// `DeployError::Connect` / `DeployError::VersionCheck` when the service
    /// could not be asked.
    pub async fn check_version(mut self, local: &str) -> TransitionResult<Idle, Idle, R> {
        if self.cancel.is_cancelled() {
            return Err((
                self,
                DeployError::Cancelled {
                    stage: DeploymentState::Idle,
                },
            ));
        }

        let session = &mut self.session;
        let remote = until_cancelled(&self.cancel, DeploymentState::Idle, async move {
            session.connect().await.context(ConnectSnafu)?;
            session.get_cli_version().await.context(VersionCheckSnafu)
        })
        .await;

        let checked = remote.and_then(|remote| {
            tracing::debug!(local, remote = %remote, "client version checked");
            check_versions(local, &remote)
        });

        match checked {
            Ok(()) => Ok(self),
            Err(e) => Err((self, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_versions_pass() {
        assert!(check_versions("1.2.3", " 1.2.3\n").is_ok());
    }

    #[test]
    fn any_difference_is_a_mismatch() {
        let err = check_versions("0.0.1", "0.0.2").unwrap_err();
        assert!(matches!(
            err,
            DeployError::VersionMismatch { ref local, ref remote } if local == "0.0.1" && remote == "0.0.2"
        ));

        // An older published version still blocks the run.
        assert!(check_versions("0.0.2", "0.0.1").is_err());
    }
}
