//! Media-server client abstraction
//!
//! The wire protocol lives in an external client library. The pool only
//! needs a factory that opens a handle and a handle that answers three
//! cheap queries, so both are expressed as traits and the real client is
//! plugged in by the binary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure raised by the client library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the token (HTTP 401)
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The request did not complete in time
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

/// Version and platform identity of a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub friendly_name: String,
    pub version: String,
    pub platform: String,
}

/// An active playback session as reported by the server.
///
/// Every field is optional because servers omit whatever does not apply to
/// the media type being played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub title: Option<String>,
    /// Show or album title for episodes and tracks
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub usernames: Vec<String>,
    pub user: Option<String>,
    pub player: Option<String>,
    /// `playing`, `paused`, `buffering`
    pub state: Option<String>,
    /// Playback position in milliseconds
    pub view_offset: Option<u64>,
    /// Media duration in milliseconds
    pub duration: Option<u64>,
}

/// A library section (Movies, TV Shows, Music, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    /// `movie`, `show`, `artist`, `photo`
    pub section_type: String,
}

/// Handle to one connected media server
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Version/platform identity; cheap enough to use as a health probe
    async fn identity(&self) -> Result<ServerIdentity, ClientError>;

    /// Active playback sessions
    async fn sessions(&self) -> Result<Vec<Session>, ClientError>;

    /// Library sections
    async fn library_sections(&self) -> Result<Vec<LibrarySection>, ClientError>;
}

/// Opens connections to media servers
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Connect to the server at `url` and return a ready handle
    async fn create_client(
        &self,
        url: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Arc<dyn MediaServer>, ClientError>;
}
