//! PlexiGlass Services
//!
//! Runtime services behind the dashboard:
//! - Lazy, reusable connections to configured media servers
//! - TTL cache for expensive remote queries
//! - Error classification with retry and cancellation
//! - Tracing setup for console and rotating file logs

pub mod logging;
pub mod pool;
pub mod services;

pub use pool::{
    ClientError, ClientFactory, ConnectionPool, LibrarySection, MediaServer, NowPlaying,
    PoolStatistics, PooledConnection, ServerIdentity, ServerStatus, Session,
    DEFAULT_MAX_POOL_SIZE,
};
pub use services::{
    make_key, CacheKey, CacheService, CacheStats, ErrorClassifier, ErrorRecord, RetryAttempt,
    RetryExecutor, RetryPolicy, Sleeper, TokioSleeper,
};
