// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted in-memory RemoteService, a socket RPC server, project fixtures, and tracing init.

pub mod rpc_server;

use async_trait::async_trait;
use fastack::deploy::{CLI_VERSION, DeployOptions, Deployment, Idle};
use fastack::remote::{
    GET_CLI_VERSION, GET_DEPLOY_CONFIG, LoginResult, RemoteError, RemoteService, RetryPolicy,
    Session, SessionSettings,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("fastack=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Something the mock service was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    Call(String),
    LoginWithToken(String),
    LoginWithUsername(String),
    Close,
}

/// Operation the mock should fail permanently.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Connect,
    CliVersion,
    FetchDeployConfig,
    Login,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<Event>,
    transient_connect_failures: u32,
    transient_call_failures: u32,
    dropped: bool,
}

/// In-memory `RemoteService` that records every request.
///
/// Clones share the same event log, so a test keeps one clone and hands the
/// other to the session.
#[derive(Debug, Clone)]
pub struct MockService {
    state: Arc<Mutex<MockState>>,
    version: String,
    rules: Value,
    failure: Option<Failure>,
    call_delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockService {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            version: CLI_VERSION.to_string(),
            rules: json!({ "acceptableExtensions": [], "ignoreDirectories": [] }),
            failure: None,
            call_delay: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_rules(mut self, rules: Value) -> Self {
        self.rules = rules;
        self
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Fail the first `count` connects with a retryable error.
    pub fn with_transient_connect_failures(self, count: u32) -> Self {
        self.state.lock().transient_connect_failures = count;
        self
    }

    /// Fail the first `count` calls with a retryable error.
    pub fn with_transient_call_failures(self, count: u32) -> Self {
        self.state.lock().transient_call_failures = count;
        self
    }

    /// Start with a connection that fails every call until reconnected.
    pub fn with_dropped_connection(self) -> Self {
        self.state.lock().dropped = true;
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.state.lock().events.iter().filter(|e| *e == event).count()
    }

    pub fn close_count(&self) -> usize {
        self.count(&Event::Close)
    }

    fn record(&self, event: Event) {
        self.state.lock().events.push(event);
    }

    fn login(&self) -> Result<LoginResult, RemoteError> {
        if self.failure == Some(Failure::Login) {
            return Err(RemoteError::Auth("User not found".to_string()));
        }
        Ok(LoginResult {
            token: "session-token".to_string(),
            id: Some("user-1".to_string()),
        })
    }
}

#[async_trait]
impl RemoteService for MockService {
    async fn connect(&mut self) -> Result<(), RemoteError> {
        self.record(Event::Connect);
        if self.failure == Some(Failure::Connect) {
            return Err(RemoteError::Connection("connection refused".to_string()));
        }
        let mut state = self.state.lock();
        if state.transient_connect_failures > 0 {
            state.transient_connect_failures -= 1;
            return Err(RemoteError::Connection("connection reset".to_string()));
        }
        state.dropped = false;
        Ok(())
    }

    async fn call(&mut self, method: &str, _params: Vec<Value>) -> Result<Value, RemoteError> {
        self.record(Event::Call(method.to_string()));
        if let Some(delay) = self.call_delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut state = self.state.lock();
            if state.dropped {
                return Err(RemoteError::Connection("channel closed".to_string()));
            }
            if state.transient_call_failures > 0 {
                state.transient_call_failures -= 1;
                return Err(RemoteError::call(method, "temporarily unavailable"));
            }
        }

        match method {
            GET_CLI_VERSION if self.failure == Some(Failure::CliVersion) => {
                Err(RemoteError::call(method, "internal server error"))
            }
            GET_CLI_VERSION => Ok(Value::String(self.version.clone())),
            GET_DEPLOY_CONFIG if self.failure == Some(Failure::FetchDeployConfig) => {
                Err(RemoteError::call(method, "internal server error"))
            }
            GET_DEPLOY_CONFIG => Ok(self.rules.clone()),
            other => Err(RemoteError::call(other, "method not found")),
        }
    }

    async fn login_with_token(&mut self, token: &str) -> Result<LoginResult, RemoteError> {
        self.record(Event::LoginWithToken(token.to_string()));
        self.login()
    }

    async fn login_with_username(
        &mut self,
        username: &str,
        _password: &str,
    ) -> Result<LoginResult, RemoteError> {
        self.record(Event::LoginWithUsername(username.to_string()));
        self.login()
    }

    async fn close(&mut self) {
        self.record(Event::Close);
    }
}

/// Session settings that fail fast.
#[allow(dead_code)]
pub fn fast_settings() -> SessionSettings {
    SessionSettings {
        connect_timeout: Duration::from_secs(2),
        call_timeout: Duration::from_secs(2),
        retry: RetryPolicy::none(),
    }
}

/// Write a `fastack.json` that disables retries, plus `config` merged in.
#[allow(dead_code)]
pub fn write_project_config(dir: &Path, config: Value) {
    let mut base = json!({ "retry": { "attempts": 1 } });
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), config) {
        base.extend(extra);
    }
    fs::write(dir.join("fastack.json"), base.to_string()).unwrap();
}

/// Write `contents` to `relative` under `root`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A deployment of `dir` over `service` with fast-failing settings.
#[allow(dead_code)]
pub fn deployment(
    dir: &Path,
    service: MockService,
    options: DeployOptions,
    cancel: CancellationToken,
) -> Deployment<Idle, MockService> {
    Deployment::new(dir, Session::new(service, fast_settings()), options, cancel)
}
