//! PlexiGlass services
//!
//! Cross-cutting services used by every dashboard panel:
//! - TTL cache for expensive remote queries
//! - Error classification and history
//! - Retry with backoff and cancellation

mod cache;
mod error_handler;
mod retry;

pub use cache::{make_key, CacheKey, CacheService, CacheStats, DEFAULT_TTL};
pub use error_handler::{ErrorClassifier, ErrorRecord, DEFAULT_MAX_HISTORY};
pub use retry::{
    RetryAttempt, RetryExecutor, RetryPolicy, Sleeper, TokioSleeper, DEFAULT_BASE_DELAY,
    DEFAULT_RETRY_COUNT,
};
