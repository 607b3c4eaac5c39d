//! Server status view rendered by the dashboard

use serde::Serialize;
use tracing::warn;

use plexiglass_core::Result;

use super::client::Session;
use super::connection_pool::ConnectionPool;

/// One "now playing" row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub title: String,
    pub user: String,
    pub state: String,
    /// 0-100, absent when position or duration is unknown
    pub progress_percent: Option<u8>,
}

impl NowPlaying {
    pub fn from_session(session: &Session) -> Self {
        let title = non_empty(&session.title)
            .or_else(|| non_empty(&session.grandparent_title))
            .unwrap_or("Unknown")
            .to_string();

        let user = session
            .usernames
            .first()
            .map(String::as_str)
            .or_else(|| non_empty(&session.user))
            .or_else(|| non_empty(&session.player))
            .unwrap_or("Unknown")
            .to_string();

        let state = non_empty(&session.state).unwrap_or("unknown").to_string();

        Self {
            title,
            user,
            state,
            progress_percent: progress_percent(session),
        }
    }
}

/// Connection and playback status for one configured server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub url: String,
    pub connected: bool,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub friendly_name: Option<String>,
    pub session_count: usize,
    pub now_playing: Vec<NowPlaying>,
}

impl ConnectionPool {
    /// Build the status view for `name`.
    ///
    /// Only reads from an existing pooled connection; never connects. Each
    /// query is bounded by the server's timeout, and a failed or timed-out
    /// query leaves its fields empty rather than failing the whole view.
    pub async fn server_status(&self, name: &str) -> Result<ServerStatus> {
        let descriptor = self.descriptor(name)?;

        let mut status = ServerStatus {
            name: descriptor.name.clone(),
            url: descriptor.url.clone(),
            connected: false,
            version: None,
            platform: None,
            friendly_name: None,
            session_count: 0,
            now_playing: Vec::new(),
        };

        let Some(connection) = self.get(&descriptor.name) else {
            return Ok(status);
        };
        status.connected = true;
        let timeout = connection.timeout;

        match tokio::time::timeout(timeout, connection.handle.identity()).await {
            Ok(Ok(identity)) => {
                status.version = Some(identity.version);
                status.platform = Some(identity.platform);
                status.friendly_name = Some(identity.friendly_name);
            }
            Ok(Err(e)) => warn!("[ConnectionPool] Identity query failed for {}: {}", status.name, e),
            Err(_) => warn!(
                "[ConnectionPool] Identity query for {} timed out after {:?}",
                status.name, timeout
            ),
        }

        let sessions = match tokio::time::timeout(timeout, connection.handle.sessions()).await {
            Ok(Ok(sessions)) => sessions,
            Ok(Err(e)) => {
                warn!("[ConnectionPool] Session query failed for {}: {}", status.name, e);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "[ConnectionPool] Session query for {} timed out after {:?}",
                    status.name, timeout
                );
                Vec::new()
            }
        };
        status.session_count = sessions.len();
        status.now_playing = sessions.iter().map(NowPlaying::from_session).collect();

        Ok(status)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// `view_offset / duration` as a truncated, clamped percentage
fn progress_percent(session: &Session) -> Option<u8> {
    let offset = session.view_offset?;
    let duration = session.duration.filter(|d| *d > 0)?;
    let percent = (offset as f64 / duration as f64) * 100.0;
    Some(percent.clamp(0.0, 100.0) as u8)
}
