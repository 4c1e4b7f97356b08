// ABOUTME: Sources of username/password credentials for interactive login.
// ABOUTME: Supports a masked terminal prompt, environment variables, and fixed values.

mod prompt;

pub use prompt::{TerminalPrompt, restore_terminal};

use async_trait::async_trait;
use thiserror::Error;

/// Environment variable holding the login username.
pub const USERNAME_ENV: &str = "FASTACK_USERNAME";
/// Environment variable holding the login password.
pub const PASSWORD_ENV: &str = "FASTACK_PASSWORD";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credentials: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("credential prompt failed: {0}")]
    Prompt(String),
}

/// A username and password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting an empty username or password.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() {
            return Err(CredentialError::Empty("username"));
        }
        if password.is_empty() {
            return Err(CredentialError::Empty("password"));
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Supplies credentials when no stored token is available.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, CredentialError>;
}

/// Reads credentials from `FASTACK_USERNAME` and `FASTACK_PASSWORD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Whether both variables are set.
    pub fn available() -> bool {
        std::env::var_os(USERNAME_ENV).is_some() && std::env::var_os(PASSWORD_ENV).is_some()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn credentials(&self) -> Result<Credentials, CredentialError> {
        let username = std::env::var(USERNAME_ENV).unwrap_or_default();
        let password = std::env::var(PASSWORD_ENV).unwrap_or_default();
        Credentials::new(username, password)
    }
}

/// Always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Environment credentials when both variables are set, otherwise a terminal prompt.
pub fn default_provider() -> Box<dyn CredentialProvider> {
    if EnvCredentials::available() {
        tracing::debug!("using credentials from environment");
        Box::new(EnvCredentials)
    } else {
        Box::new(TerminalPrompt::new())
    }
}
