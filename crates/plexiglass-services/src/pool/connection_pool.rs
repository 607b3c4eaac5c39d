//! Connection Pool - one lazily established connection per configured server
//!
//! ConnectionPool is responsible for:
//! - Creating a connection on first use through the ClientFactory
//! - Reusing that connection for every later call
//! - Health-checking, disconnecting and clearing pooled connections
//!
//! Connection establishment is serialised per server: concurrent callers for
//! the same uninitialised name wait on that server's connect lock and pick up
//! the connection the first caller stored. Different servers never wait on
//! each other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plexiglass_core::{
    ConnectionFailure, Error, PerformanceSettings, Result, ServerDescriptor, ServerRegistry,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::{ClientError, ClientFactory, MediaServer};

/// Reported pool capacity when settings do not override it
pub const DEFAULT_MAX_POOL_SIZE: usize = 10;

/// A live connection owned by the pool
#[derive(Clone)]
pub struct PooledConnection {
    /// Canonical server name from the registry
    pub server_name: String,
    pub handle: Arc<dyn MediaServer>,
    pub established_at: DateTime<Utc>,
    /// Correlates log lines for this connection
    pub connection_id: Uuid,
    /// Probe timeout, copied from the descriptor
    pub timeout: Duration,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("server_name", &self.server_name)
            .field("established_at", &self.established_at)
            .field("connection_id", &self.connection_id)
            .finish_non_exhaustive()
    }
}

/// Pool statistics, computed at call time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatistics {
    pub pool_size: usize,
    /// Sorted
    pub connected_names: Vec<String>,
    pub max_pool_size: usize,
}

/// Pool of media-server connections keyed by server name
pub struct ConnectionPool {
    registry: Arc<ServerRegistry>,
    factory: Arc<dyn ClientFactory>,
    /// Live connections by canonical server name
    connections: DashMap<String, PooledConnection>,
    /// Per-server connect locks
    connect_locks: DashMap<String, Arc<Mutex<()>>>,
    max_pool_size: usize,
}

impl ConnectionPool {
    pub fn new(registry: Arc<ServerRegistry>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            registry,
            factory,
            connections: DashMap::new(),
            connect_locks: DashMap::new(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
        }
    }

    /// Create a pool using `performance.pool_max_size`
    pub fn from_settings(
        registry: Arc<ServerRegistry>,
        factory: Arc<dyn ClientFactory>,
        settings: &PerformanceSettings,
    ) -> Self {
        Self::new(registry, factory).with_max_pool_size(settings.pool_max_size)
    }

    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }

    pub fn registry(&self) -> Arc<ServerRegistry> {
        self.registry.clone()
    }

    /// Get the connection for `name`, establishing it on first use.
    ///
    /// Returns the pooled handle unchanged when one exists. Otherwise makes
    /// exactly one factory call, even under concurrent callers.
    pub async fn connect(&self, name: &str) -> Result<Arc<dyn MediaServer>> {
        if let Some(existing) = self.connections.get(name) {
            debug!("[ConnectionPool] Reusing pooled connection for {}", name);
            return Ok(existing.handle.clone());
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| Error::ServerNotFound(name.to_string()))?;
        let key = descriptor.name.clone();

        let lock = self
            .connect_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have connected while we waited for the lock
        if let Some(existing) = self.connections.get(&key) {
            debug!("[ConnectionPool] Connection for {} established by concurrent caller", key);
            return Ok(existing.handle.clone());
        }

        let handle = self.establish(descriptor).await?;
        let connection = PooledConnection {
            server_name: key.clone(),
            handle: handle.clone(),
            established_at: Utc::now(),
            connection_id: Uuid::new_v4(),
            timeout: descriptor.timeout,
        };

        info!(
            server = %key,
            connection_id = %connection.connection_id,
            "[ConnectionPool] Connected to {} at {}",
            key,
            descriptor.url
        );
        self.connections.insert(key, connection);

        Ok(handle)
    }

    /// Connect to the server flagged `default`, else the first configured one
    pub async fn connect_default(&self) -> Result<Arc<dyn MediaServer>> {
        let name = self
            .registry
            .default_server()
            .map(|s| s.name.clone())
            .ok_or_else(|| Error::ServerNotFound("default".to_string()))?;
        self.connect(&name).await
    }

    /// Remove the pooled connection for `name`, if any
    pub fn disconnect(&self, name: &str) {
        let key = self.canonical_name(name);
        if self.connections.remove(&key).is_some() {
            info!("[ConnectionPool] Disconnected {}", key);
        }
    }

    /// Remove every pooled connection
    pub fn disconnect_all(&self) {
        let count = self.connections.len();
        self.connections.clear();
        if count > 0 {
            info!("[ConnectionPool] Disconnected {} servers", count);
        }
    }

    /// Alias of [`disconnect_all`](Self::disconnect_all)
    pub fn clear(&self) {
        self.disconnect_all();
    }

    /// Probe a pooled connection.
    ///
    /// False when nothing is pooled for `name`, when the identity query
    /// fails, or when it does not answer within the server's timeout.
    pub async fn health_check(&self, name: &str) -> bool {
        let key = self.canonical_name(name);
        let Some((handle, timeout)) = self
            .connections
            .get(&key)
            .map(|c| (c.handle.clone(), c.timeout))
        else {
            return false;
        };

        match tokio::time::timeout(timeout, handle.identity()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("[ConnectionPool] Health check failed for {}: {}", key, e);
                false
            }
            Err(_) => {
                warn!(
                    "[ConnectionPool] Health check for {} timed out after {:?}",
                    key, timeout
                );
                false
            }
        }
    }

    pub fn statistics(&self) -> PoolStatistics {
        let connected_names = self.connected_servers();
        PoolStatistics {
            pool_size: connected_names.len(),
            connected_names,
            max_pool_size: self.max_pool_size,
        }
    }

    /// Sorted names of currently pooled servers
    pub fn connected_servers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.connections.contains_key(&self.canonical_name(name))
    }

    /// Snapshot of the pooled connection for `name`
    pub fn get(&self, name: &str) -> Option<PooledConnection> {
        self.connections
            .get(&self.canonical_name(name))
            .map(|c| c.value().clone())
    }

    /// All configured server names, connected or not
    pub fn server_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn server_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_read_only(&self, name: &str) -> Result<bool> {
        self.registry
            .get(name)
            .map(|s| s.read_only)
            .ok_or_else(|| Error::ServerNotFound(name.to_string()))
    }

    pub(crate) fn descriptor(&self, name: &str) -> Result<&ServerDescriptor> {
        self.registry
            .get(name)
            .ok_or_else(|| Error::ServerNotFound(name.to_string()))
    }

    fn canonical_name(&self, name: &str) -> String {
        self.registry
            .get(name)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Single factory call, bounded by the descriptor's timeout
    async fn establish(&self, descriptor: &ServerDescriptor) -> Result<Arc<dyn MediaServer>> {
        debug!(
            "[ConnectionPool] Connecting to {} at {} (timeout {:?})",
            descriptor.name, descriptor.url, descriptor.timeout
        );

        let attempt = self
            .factory
            .create_client(&descriptor.url, &descriptor.token, descriptor.timeout);

        match tokio::time::timeout(descriptor.timeout, attempt).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => {
                let err = translate_client_error(descriptor, e);
                warn!("[ConnectionPool] {}", err);
                Err(err)
            }
            Err(_) => {
                warn!(
                    "[ConnectionPool] Connection to {} timed out after {:?}",
                    descriptor.name, descriptor.timeout
                );
                Err(Error::connection(
                    &descriptor.name,
                    ConnectionFailure::Timeout,
                    format!(
                        "Connection timeout: no response from {} within {:?}",
                        descriptor.url, descriptor.timeout
                    ),
                ))
            }
        }
    }
}

/// Map a client-library failure onto the connection error taxonomy
fn translate_client_error(descriptor: &ServerDescriptor, error: ClientError) -> Error {
    match error {
        ClientError::Unauthorized(msg) => Error::connection(
            &descriptor.name,
            ConnectionFailure::Unauthorized,
            format!("Unauthorized: check your token. Error: {}", msg),
        ),
        ClientError::Timeout(msg) => Error::connection(
            &descriptor.name,
            ConnectionFailure::Timeout,
            format!("Connection timeout at {}. Error: {}", descriptor.url, msg),
        ),
        ClientError::Other(msg) => {
            Error::connection(&descriptor.name, ConnectionFailure::Transport, msg)
        }
    }
}
