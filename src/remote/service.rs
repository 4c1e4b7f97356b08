// ABOUTME: The RPC operations the deploy client consumes from the hosting service.
// ABOUTME: Transports implement this trait; the session layers timeouts and retries on top.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::error::RemoteError;

/// Method returning the server's packaging rules.
pub const GET_DEPLOY_CONFIG: &str = "getDeployConfig";

/// Method returning the latest published client version.
pub const GET_CLI_VERSION: &str = "getCliVersion";

/// Successful login returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResult {
    /// Token to resume this login later.
    pub token: String,
    /// Identifier of the logged-in user.
    #[serde(default)]
    pub id: Option<String>,
}

/// Request/response channel to the remote application-hosting service.
///
/// Implementations do not need to be idempotent on `connect`; the session
/// only calls it while unopened. `close` must tolerate being called on a
/// connection that already dropped.
#[async_trait]
pub trait RemoteService: Send {
    /// Open the underlying connection.
    async fn connect(&mut self) -> Result<(), RemoteError>;

    /// Invoke a named remote method.
    async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, RemoteError>;

    /// Log in with a previously stored token.
    async fn login_with_token(&mut self, token: &str) -> Result<LoginResult, RemoteError>;

    /// Log in with a username and password.
    async fn login_with_username(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginResult, RemoteError>;

    /// Tear down the connection.
    async fn close(&mut self);
}
