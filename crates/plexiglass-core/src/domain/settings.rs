//! Application settings tree
//!
//! Every field carries a default so a configuration file only needs to
//! mention the values it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub ui: UiSettings,
    pub gallery: GallerySettings,
    pub performance: PerformanceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub theme: String,
    /// Dashboard refresh interval in seconds
    pub refresh_interval: u64,
    pub animations: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            refresh_interval: 5,
            animations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GallerySettings {
    pub show_code_examples: bool,
    pub enable_write_operations: bool,
    pub confirm_before_write: bool,
    pub max_results: usize,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            show_code_examples: true,
            enable_write_operations: true,
            confirm_before_write: true,
            max_results: 50,
        }
    }
}

/// Per-query cache TTLs in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    /// Server identity changes rarely
    pub server_info: u64,
    pub library_list: u64,
    /// Sessions change constantly
    pub sessions: u64,
    pub demo_code: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            server_info: 120,
            library_list: 300,
            sessions: 10,
            demo_code: 3600,
        }
    }
}

/// Tunables for the connection pool, cache and retry services.
///
/// All durations are stored as whole seconds, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub worker_threads: u32,
    pub cache_ttl: u64,
    pub cache_size: usize,
    pub connection_timeout: u64,
    pub refresh_interval: u64,
    pub pool_max_size: usize,
    pub max_retries: u32,
    pub max_concurrent_requests: usize,
    pub memory_cleanup_interval: u64,
    pub cache_ttls: CacheTtls,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            cache_ttl: 60,
            cache_size: 1000,
            connection_timeout: 30,
            refresh_interval: 5,
            pool_max_size: 10,
            max_retries: 3,
            max_concurrent_requests: 5,
            memory_cleanup_interval: 300,
            cache_ttls: CacheTtls::default(),
        }
    }
}

impl PerformanceSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Range-check the tunables.
    ///
    /// Returns one message per violated bound; an empty list means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.worker_threads < 1 {
            errors.push("worker_threads must be at least 1".to_string());
        }
        if self.worker_threads > 16 {
            errors.push("worker_threads should not exceed 16".to_string());
        }

        if self.cache_ttl < 1 {
            errors.push("cache_ttl must be at least 1 second".to_string());
        }
        if self.cache_ttl > 3600 {
            errors.push("cache_ttl should not exceed 3600 seconds (1 hour)".to_string());
        }

        if self.cache_size < 10 {
            errors.push("cache_size must be at least 10 entries".to_string());
        }
        if self.cache_size > 10_000 {
            errors.push("cache_size should not exceed 10000 entries".to_string());
        }

        if self.connection_timeout < 5 {
            errors.push("connection_timeout must be at least 5 seconds".to_string());
        }
        if self.connection_timeout > 120 {
            errors.push("connection_timeout should not exceed 120 seconds".to_string());
        }

        if self.refresh_interval < 1 {
            errors.push("refresh_interval must be at least 1 second".to_string());
        }
        if self.refresh_interval > 60 {
            errors.push("refresh_interval should not exceed 60 seconds".to_string());
        }

        errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level name, e.g. `INFO` or `debug`
    pub level: String,
    /// Log file name prefix inside the logs directory
    pub file: String,
    pub max_size_mb: u64,
    pub backup_count: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "plexiglass.log".to_string(),
            max_size_mb: 10,
            backup_count: 3,
        }
    }
}
