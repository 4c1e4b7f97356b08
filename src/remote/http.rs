// ABOUTME: HTTP/1.1 JSON transport for the remote RPC surface.
// ABOUTME: Posts {"method", "params"} to a single endpoint over a hyper client connection.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::SendRequest;
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::error::RemoteError;
use super::service::{LoginResult, RemoteService};

const DEFAULT_RPC_PATH: &str = "/rpc";
const LOGIN_METHOD: &str = "login";

/// Where RPC requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Parse an `http://host[:port][/path]` URL.
    ///
    /// An empty path defaults to `/rpc`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Connection` for unparsable URLs, missing hosts,
    /// or schemes other than plain `http`.
    pub fn parse(url: &str) -> Result<Self, RemoteError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| RemoteError::Connection(format!("invalid server URL {url}: {e}")))?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(RemoteError::Connection(format!(
                    "unsupported scheme {other} in {url} (only http is supported)"
                )));
            }
            None => {
                return Err(RemoteError::Connection(format!(
                    "server URL {url} is missing a scheme"
                )));
            }
        }

        let host = uri
            .host()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| RemoteError::Connection(format!("server URL {url} has no host")))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);
        let path = match uri.path() {
            "" | "/" => DEFAULT_RPC_PATH.to_string(),
            path => path.to_string(),
        };

        Ok(Self { host, port, path })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFailure>,
}

#[derive(Debug, Deserialize)]
struct RpcFailure {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RpcFailure {
    fn describe(&self) -> String {
        self.reason
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.error.as_ref().map(Value::to_string))
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// RPC transport speaking JSON over a single HTTP/1.1 connection.
pub struct HttpTransport {
    endpoint: Endpoint,
    sender: Option<SendRequest<Full<Bytes>>>,
    connection: Option<JoinHandle<()>>,
    next_id: u64,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.sender.is_some())
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `url` without connecting.
    pub fn new(url: &str) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: Endpoint::parse(url)?,
            sender: None,
            connection: None,
            next_id: 1,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send(&mut self, method: &str, params: Vec<Value>) -> Result<Value, RemoteError> {
        let id = self.next_id;
        self.next_id += 1;

        let body = serde_json::to_vec(&RpcRequest { id, method, params })
            .map_err(|e| RemoteError::call(method, format!("failed to encode request: {e}")))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.path())
            .header(HOST, self.endpoint.authority())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RemoteError::call(method, format!("failed to build request: {e}")))?;

        let sender = self.sender.as_mut().ok_or(RemoteError::NotConnected)?;
        sender
            .ready()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        let response = sender.send_request(request).await.map_err(|e| {
            if e.is_parse() || e.is_user() {
                RemoteError::call(method, format!("request failed: {e}"))
            } else {
                RemoteError::Connection(format!("{method}: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| RemoteError::call(method, format!("failed to read response: {e}")))?
            .to_bytes();

        if !status.is_success() {
            return Err(RemoteError::call(
                method,
                format!("HTTP {}: {}", status, String::from_utf8_lossy(&body)),
            ));
        }

        let response: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| RemoteError::invalid_response(method, e.to_string()))?;

        if let Some(failure) = response.error {
            return Err(RemoteError::call(method, failure.describe()));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn login(&mut self, params: Value) -> Result<LoginResult, RemoteError> {
        let value = self
            .send(LOGIN_METHOD, vec![params])
            .await
            .map_err(|e| match e {
                RemoteError::Call { reason, .. } => RemoteError::Auth(reason),
                other => other,
            })?;
        serde_json::from_value(value)
            .map_err(|e| RemoteError::invalid_response(LOGIN_METHOD, e.to_string()))
    }
}

#[async_trait]
impl RemoteService for HttpTransport {
    async fn connect(&mut self) -> Result<(), RemoteError> {
        let stream = TcpStream::connect((self.endpoint.host(), self.endpoint.port()))
            .await
            .map_err(|e| {
                RemoteError::Connection(format!("{}: {}", self.endpoint.authority(), e))
            })?;

        let (sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| RemoteError::Connection(format!("HTTP handshake failed: {e}")))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!("RPC connection error: {}", e);
            }
        });

        self.sender = Some(sender);
        self.connection = Some(handle);
        Ok(())
    }

    async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, RemoteError> {
        self.send(method, params).await
    }

    async fn login_with_token(&mut self, token: &str) -> Result<LoginResult, RemoteError> {
        self.login(json!({ "resume": token })).await
    }

    async fn login_with_username(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<LoginResult, RemoteError> {
        self.login(json!({ "user": { "username": username }, "password": password }))
            .await
    }

    async fn close(&mut self) {
        self.sender = None;
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let endpoint = Endpoint::parse("http://deploy.example.com:8080/api/rpc").unwrap();
        assert_eq!(endpoint.host(), "deploy.example.com");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.path(), "/api/rpc");
    }

    #[test]
    fn defaults_port_and_path() {
        let endpoint = Endpoint::parse("http://localhost").unwrap();
        assert_eq!(endpoint.port(), 80);
        assert_eq!(endpoint.path(), "/rpc");
    }

    #[test]
    fn rejects_https() {
        let err = Endpoint::parse("https://example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(Endpoint::parse("example.com:3000").is_err());
    }

    #[test]
    fn failure_description_prefers_reason() {
        let failure: RpcFailure =
            serde_json::from_str(r#"{"error": 403, "reason": "User not found"}"#).unwrap();
        assert_eq!(failure.describe(), "User not found");

        let bare: RpcFailure = serde_json::from_str(r#"{"error": 500}"#).unwrap();
        assert_eq!(bare.describe(), "500");
    }

    #[tokio::test]
    async fn call_before_connect_is_not_connected() {
        let mut transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = transport.call("getCliVersion", Vec::new()).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotConnected));
    }
}
