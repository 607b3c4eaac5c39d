//! Error taxonomy shared by every PlexiGlass service.
//!
//! The variants map one-to-one onto the failure classes the dashboard needs
//! to tell apart: bad configuration, unknown server names, connection
//! failures and generic remote-call failures.

use serde::{Deserialize, Serialize};

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Why a connection attempt to a media server failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionFailure {
    /// The server rejected the credential token
    Unauthorized,
    /// The server did not answer within the configured timeout
    Timeout,
    /// Any other transport-level failure
    Transport,
}

impl ConnectionFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionFailure::Unauthorized => "unauthorized",
            ConnectionFailure::Timeout => "timeout",
            ConnectionFailure::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the connection, cache and retry services
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Bad or missing settings; needs user correction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested server name is not in the registry
    #[error("Server '{0}' not found in configuration")]
    ServerNotFound(String),

    /// Connecting to a configured server failed
    #[error("Failed to connect to server '{server}' ({failure}): {message}")]
    Connection {
        server: String,
        failure: ConnectionFailure,
        message: String,
    },

    /// Catch-all for remote-call failures
    #[error("Service error: {0}")]
    Service(String),

    /// A retry loop was abandoned by its caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        Error::Service(message.into())
    }

    pub fn connection(
        server: impl Into<String>,
        failure: ConnectionFailure,
        message: impl Into<String>,
    ) -> Self {
        Error::Connection {
            server: server.into(),
            failure,
            message: message.into(),
        }
    }

    /// Discriminant used for classification and error records
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::ServerNotFound(_) => ErrorKind::ServerNotFound,
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Service(_) => ErrorKind::Service,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Connection failure reason, if this is a connection error
    pub fn connection_failure(&self) -> Option<ConnectionFailure> {
        match self {
            Error::Connection { failure, .. } => Some(*failure),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.connection_failure() == Some(ConnectionFailure::Unauthorized)
    }
}

/// Error discriminant without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    ServerNotFound,
    Connection,
    Service,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::ServerNotFound => "ServerNotFoundError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Service => "ServiceError",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a failure must be surfaced in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks functionality until the user fixes something
    Critical,
    /// Degraded but recoverable
    Warning,
    /// Informational, usually a navigation mistake
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}
