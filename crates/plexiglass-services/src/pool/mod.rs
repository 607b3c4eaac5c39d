//! Server Pool - media-server connection management
//!
//! - **client**: MediaServer / ClientFactory traits over the external client library
//! - **ConnectionPool**: lazy, per-server connection reuse with health checks
//! - **status**: dashboard status view built from a pooled connection

mod client;
mod connection_pool;
mod status;

pub use client::{
    ClientError, ClientFactory, LibrarySection, MediaServer, ServerIdentity, Session,
};
pub use connection_pool::{
    ConnectionPool, PoolStatistics, PooledConnection, DEFAULT_MAX_POOL_SIZE,
};
pub use status::{NowPlaying, ServerStatus};
