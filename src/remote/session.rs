// ABOUTME: Per-run RPC session wrapping a remote service with timeouts and retries.
// ABOUTME: Tracks open/closed status so closing is idempotent and safe before connecting.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use super::error::RemoteError;
use super::retry::RetryPolicy;
use super::service::{GET_CLI_VERSION, GET_DEPLOY_CONFIG, LoginResult, RemoteService};
use crate::archive::DeployConfig;

/// Timeouts and retry behavior applied to every remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unopened,
    Open,
    Closed,
}

/// One deploy run's connection to the remote service.
///
/// A session is created fresh for every run and owned by that run alone.
pub struct Session<S> {
    service: S,
    settings: SessionSettings,
    status: SessionStatus,
    token: Option<String>,
    user_id: Option<String>,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("status", &self.status)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl<S: RemoteService> Session<S> {
    pub fn new(service: S, settings: SessionSettings) -> Self {
        Self {
            service,
            settings,
            status: SessionStatus::Unopened,
            token: None,
            user_id: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Replace timeouts and retry behavior for subsequent operations.
    pub fn set_settings(&mut self, settings: SessionSettings) {
        self.settings = settings;
    }

    /// Token from the last successful login.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Open the connection, retrying transient failures.
    ///
    /// Connecting an already open session does nothing.
    ///
    /// # Errors
    ///
    /// Returns the last `RemoteError` once retries are exhausted, or
    /// `NotConnected` if the session was already closed.
    pub async fn connect(&mut self) -> Result<(), RemoteError> {
        match self.status {
            SessionStatus::Open => return Ok(()),
            SessionStatus::Closed => return Err(RemoteError::NotConnected),
            SessionStatus::Unopened => {}
        }

        let timeout = self.settings.connect_timeout;
        let mut attempt = 1;
        loop {
            let result = with_timeout(timeout, self.service.connect(), || {
                RemoteError::ConnectTimeout(timeout)
            })
            .await;

            match result {
                Ok(()) => break,
                Err(e) => match self.settings.retry.next_delay(attempt, &e) {
                    Some(delay) => {
                        tracing::warn!(
                            "Connect attempt {} failed: {}; retrying in {:?}",
                            attempt,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }

        self.status = SessionStatus::Open;
        tracing::debug!("session opened");
        Ok(())
    }

    /// Invoke a remote method, retrying transient failures.
    ///
    /// A retry after a connection-level failure or a timeout runs on a
    /// freshly opened connection.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` unless the session is open, otherwise the last
    /// `RemoteError` once retries are exhausted.
    pub async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, RemoteError> {
        if !self.is_open() {
            return Err(RemoteError::NotConnected);
        }

        let timeout = self.settings.call_timeout;
        let mut attempt = 1;
        let mut reconnect = false;
        loop {
            let result = if reconnect {
                self.reopen().await
            } else {
                Ok(())
            };
            let result = match result {
                Ok(()) => {
                    with_timeout(timeout, self.service.call(method, params.clone()), || {
                        RemoteError::CallTimeout {
                            method: method.to_string(),
                            timeout,
                        }
                    })
                    .await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) => match self.settings.retry.next_delay(attempt, &e) {
                    Some(delay) => {
                        tracing::warn!(
                            "Call {} attempt {} failed: {}; retrying in {:?}",
                            method,
                            attempt,
                            e,
                            delay
                        );
                        reconnect = e.needs_reconnect();
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    /// Drop the current connection and dial a fresh one.
    async fn reopen(&mut self) -> Result<(), RemoteError> {
        tracing::debug!("reopening connection");
        self.service.close().await;
        let timeout = self.settings.connect_timeout;
        with_timeout(timeout, self.service.connect(), || {
            RemoteError::ConnectTimeout(timeout)
        })
        .await
    }

    /// Fetch the server's packaging rules.
    pub async fn get_deploy_config(&mut self) -> Result<DeployConfig, RemoteError> {
        let value = self.call(GET_DEPLOY_CONFIG, Vec::new()).await?;
        serde_json::from_value(value)
            .map_err(|e| RemoteError::invalid_response(GET_DEPLOY_CONFIG, e.to_string()))
    }

    /// Fetch the latest published client version.
    pub async fn get_cli_version(&mut self) -> Result<String, RemoteError> {
        let value = self.call(GET_CLI_VERSION, Vec::new()).await?;
        match value {
            Value::String(version) => Ok(version.trim().to_string()),
            other => Err(RemoteError::invalid_response(
                GET_CLI_VERSION,
                format!("expected a version string, got {other}"),
            )),
        }
    }

    /// Authenticate with a stored token. Never retried.
    pub async fn login_with_token(&mut self, token: &str) -> Result<(), RemoteError> {
        if !self.is_open() {
            return Err(RemoteError::NotConnected);
        }
        let timeout = self.settings.call_timeout;
        let login = with_timeout(timeout, self.service.login_with_token(token), || {
            RemoteError::CallTimeout {
                method: "login".to_string(),
                timeout,
            }
        })
        .await?;
        self.record_login(login);
        Ok(())
    }

    /// Authenticate with a username and password. Never retried.
    pub async fn login_with_username(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), RemoteError> {
        if !self.is_open() {
            return Err(RemoteError::NotConnected);
        }
        let timeout = self.settings.call_timeout;
        let login = with_timeout(
            timeout,
            self.service.login_with_username(username, password),
            || RemoteError::CallTimeout {
                method: "login".to_string(),
                timeout,
            },
        )
        .await?;
        self.record_login(login);
        Ok(())
    }

    fn record_login(&mut self, login: LoginResult) {
        tracing::debug!(user = ?login.id, "logged in");
        self.token = Some(login.token);
        self.user_id = login.id;
    }

    /// Close the session.
    ///
    /// Only an open session reaches the service; closing an unopened or
    /// already closed session just marks it closed.
    pub async fn close(&mut self) {
        match self.status {
            SessionStatus::Open => {
                self.service.close().await;
                tracing::debug!("session closed");
            }
            SessionStatus::Unopened => tracing::debug!("closing unopened session"),
            SessionStatus::Closed => {}
        }
        self.status = SessionStatus::Closed;
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        if self.status == SessionStatus::Open {
            tracing::warn!("Session dropped while still open");
        }
    }
}

async fn with_timeout<T, F>(
    timeout: Duration,
    future: F,
    on_elapsed: impl FnOnce() -> RemoteError,
) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed()),
    }
}
