//! SCP-specific error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorised SCP error.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[SCP {kind:?}] {message}")]
pub struct ScpError {
    pub kind: ScpErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScpErrorKind {
    /// Port argument is not an integer in 1..=65535.
    InvalidPort,
    /// A transfer was attempted with no open connection.
    NotConnected,
    /// TCP / DNS / SSH handshake failure.
    Transport,
    /// The server host key was refused by the trust policy.
    HostKeyRejected,
    /// Every authentication method was refused.
    Authentication,
    /// The copy protocol reported a failure for a put / get.
    Transfer,
    /// Local file-system failure.
    Io,
    /// Keyword / configuration argument could not be interpreted.
    InvalidArgument,
}

pub type ScpResult<T> = Result<T, ScpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl ScpError {
    pub fn new(kind: ScpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn invalid_port(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidPort, msg)
    }

    pub fn not_connected() -> Self {
        Self::new(
            ScpErrorKind::NotConnected,
            "An SCP connection must be created first using the 'Open Connection' keyword.",
        )
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::Transport, msg)
    }

    pub fn host_key_rejected(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::HostKeyRejected, msg)
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::Authentication, msg)
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::Transfer, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::Io, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidArgument, msg)
    }

    pub fn is(&self, kind: ScpErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for ScpError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<ssh2::Error> for ScpError {
    fn from(e: ssh2::Error) -> Self {
        Self::transfer(e.to_string())
    }
}

impl From<ScpError> for String {
    fn from(e: ScpError) -> String {
        e.message
    }
}
