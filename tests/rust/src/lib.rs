//! Shared test utilities and fixtures for PlexiGlass integration tests.

pub use plexiglass_core::{Error, ServerDescriptor, ServerRegistry};

pub use mocks::{MockClientFactory, MockMediaServer, RecordingSleeper};

/// Test fixture utilities
pub mod fixtures {
    use super::*;
    use plexiglass_services::{ConnectionPool, Session};
    use std::sync::Arc;

    /// Create a test server descriptor
    pub fn descriptor(name: &str) -> ServerDescriptor {
        ServerDescriptor::new(
            name,
            format!("http://{}.local:32400", name.to_lowercase()),
            format!("token-{}", name.to_lowercase()),
        )
    }

    /// Registry with one descriptor per name, in order
    pub fn registry_with(names: &[&str]) -> Arc<ServerRegistry> {
        Arc::new(ServerRegistry::new(
            names.iter().map(|name| descriptor(name)).collect(),
        ))
    }

    /// Pool over `names` backed by `factory`
    pub fn pool_with(names: &[&str], factory: Arc<MockClientFactory>) -> ConnectionPool {
        ConnectionPool::new(registry_with(names), factory)
    }

    /// A playing session at `offset` of `duration` milliseconds
    pub fn playing_session(title: &str, user: &str, offset: u64, duration: u64) -> Session {
        Session {
            title: Some(title.to_string()),
            usernames: vec![user.to_string()],
            state: Some("playing".to_string()),
            view_offset: Some(offset),
            duration: Some(duration),
            ..Default::default()
        }
    }
}

/// Configuration file helpers
pub mod config {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary `.json` file that lives as long as the handle
    pub fn write_config(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("Failed to create temp config file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp config file");
        file
    }
}

/// Install a test subscriber once; honours RUST_LOG
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
