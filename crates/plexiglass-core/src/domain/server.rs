//! Server descriptors and the read-only registry the pool connects from

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A named media server as defined in configuration.
///
/// Immutable once loaded. The pool reads `url`, `token` and `timeout` from
/// here when it has to establish a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Unique display name, used as the pool key
    pub name: String,

    /// Base URL, e.g. `http://10.0.0.5:32400`
    pub url: String,

    /// Credential token sent with every request
    pub token: String,

    /// Connect and probe timeout
    pub timeout: Duration,

    /// Whether this server is picked by `connect_default`
    pub default: bool,

    /// Write demos must not run against read-only servers
    pub read_only: bool,
}

impl ServerDescriptor {
    /// Default connection timeout when neither the entry nor settings set one
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(name: impl Into<String>, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            token: token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            default: false,
            read_only: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark as the default server
    pub fn set_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn set_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Read-only view over the configured servers, in registration order
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: Vec<ServerDescriptor>,
}

impl ServerRegistry {
    pub fn new(servers: Vec<ServerDescriptor>) -> Self {
        Self { servers }
    }

    /// Look a server up by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// First server flagged `default`, else the first registered one
    pub fn default_server(&self) -> Option<&ServerDescriptor> {
        self.servers
            .iter()
            .find(|s| s.default)
            .or_else(|| self.servers.first())
    }

    pub fn servers(&self) -> &[ServerDescriptor] {
        &self.servers
    }

    pub fn names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
