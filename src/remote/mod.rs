// ABOUTME: Remote service client: RPC trait, per-run session, and HTTP transport.
// ABOUTME: Timeouts and bounded retries live in the session, not the transport.

mod error;
mod http;
mod retry;
mod service;
mod session;

pub use error::{RemoteError, RemoteErrorKind};
pub use http::{Endpoint, HttpTransport};
pub use retry::RetryPolicy;
pub use service::{GET_CLI_VERSION, GET_DEPLOY_CONFIG, LoginResult, RemoteService};
pub use session::{Session, SessionSettings, SessionStatus};
