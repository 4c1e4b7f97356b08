// ABOUTME: Error types for the remote RPC surface.
// ABOUTME: Separates transient network failures from call and authentication failures.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("remote call {method} failed: {reason}")]
    Call { method: String, reason: String },

    #[error("remote call {method} timed out after {timeout:?}")]
    CallTimeout { method: String, timeout: Duration },

    #[error("unexpected response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("session is not connected")]
    NotConnected,
}

/// Coarse classification of remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Connection,
    RemoteCall,
    Auth,
}

impl RemoteError {
    pub fn call(method: &str, reason: impl Into<String>) -> Self {
        RemoteError::Call {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_response(method: &str, reason: impl Into<String>) -> Self {
        RemoteError::InvalidResponse {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::Connection(_) | RemoteError::ConnectTimeout(_) => {
                RemoteErrorKind::Connection
            }
            RemoteError::Call { .. }
            | RemoteError::CallTimeout { .. }
            | RemoteError::InvalidResponse { .. }
            | RemoteError::NotConnected => RemoteErrorKind::RemoteCall,
            RemoteError::Auth(_) => RemoteErrorKind::Auth,
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Malformed responses and authentication failures are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Connection(_)
                | RemoteError::ConnectTimeout(_)
                | RemoteError::Call { .. }
                | RemoteError::CallTimeout { .. }
        )
    }

    /// Whether the connection is suspect and must be reopened before a retry.
    ///
    /// A timed-out call may still own the in-flight request, so its
    /// connection is discarded too.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            RemoteError::Connection(_)
                | RemoteError::ConnectTimeout(_)
                | RemoteError::CallTimeout { .. }
        )
    }
}
