//! Tests for AppConfig::load and the services built from it

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use plexiglass_core::{AppConfig, Error};
use plexiglass_services::{CacheService, ConnectionPool};
use tests::config::write_config;
use tests::mocks::*;

const CONFIG: &str = r#"{
    "servers": [
        {"name": "Home", "url": "http://10.0.0.5:32400", "token": "${PLEXIGLASS_IT_TOKEN}"},
        {"name": "Cabin", "url": "http://cabin:32400", "token": "cabin-token", "default": true, "timeout": 8},
        {"name": "Archive", "url": "http://archive:32400", "token": "archive-token", "read_only": true}
    ],
    "settings": {
        "performance": {"connection_timeout": 12, "cache_ttl": 45, "pool_max_size": 3},
        "logging": {"level": "DEBUG"}
    }
}"#;

#[tokio::test]
async fn test_loaded_config_drives_pool_and_cache() {
    std::env::set_var("PLEXIGLASS_IT_TOKEN", "secret-from-env");
    let file = write_config(CONFIG);

    let config = AppConfig::load(file.path()).unwrap();
    let settings = &config.settings;
    assert!(settings.performance.validate().is_empty());
    assert_eq!(settings.logging.level, "DEBUG");
    assert_eq!(settings.logging.backup_count, 3);

    let factory = Arc::new(MockClientFactory::new());
    let pool = ConnectionPool::from_settings(
        Arc::new(config.registry()),
        factory.clone(),
        &settings.performance,
    );

    pool.connect_default().await.unwrap();
    pool.connect("home").await.unwrap();

    let requests = factory.requests();
    assert_eq!(requests[0].url, "http://cabin:32400");
    assert_eq!(requests[0].timeout, Duration::from_secs(8));
    assert_eq!(requests[1].token, "secret-from-env");
    assert_eq!(requests[1].timeout, Duration::from_secs(12));

    assert_eq!(pool.statistics().max_pool_size, 3);
    assert!(pool.is_read_only("Archive").unwrap());

    let cache: CacheService<String> = CacheService::from_settings(&settings.performance);
    assert_eq!(cache.default_ttl(), Duration::from_secs(45));
}

#[test]
fn test_missing_environment_variable() {
    let file = write_config(
        r#"{"servers": [{"name": "Home", "url": "http://home", "token": "${PLEXIGLASS_IT_UNSET_VAR}"}]}"#,
    );

    let err = AppConfig::load(file.path()).unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.to_string().contains("PLEXIGLASS_IT_UNSET_VAR"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_invalid_documents() {
    let cases = [
        ("not json", "Invalid JSON"),
        (r#"{"settings": {}}"#, "'servers' section"),
        (r#"{"servers": []}"#, "at least one server"),
        (
            r#"{"servers": [{"name": "Home", "url": "http://home"}]}"#,
            "missing required fields: token",
        ),
    ];

    for (content, expected) in cases {
        let file = write_config(content);
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{}' in '{}'",
            expected,
            err
        );
    }
}

#[test]
fn test_defaults_when_settings_absent() {
    let file = write_config(r#"{"servers": [{"name": "Home", "url": "http://home", "token": "t"}]}"#);
    let config = AppConfig::load(file.path()).unwrap();

    let performance = &config.settings.performance;
    assert_eq!(performance.cache_ttl, 60);
    assert_eq!(performance.connection_timeout, 30);
    assert_eq!(performance.max_retries, 3);
    assert_eq!(performance.pool_max_size, 10);
    assert_eq!(config.settings.logging.file, "plexiglass.log");

    let registry = config.registry();
    assert_eq!(registry.get("Home").unwrap().timeout, Duration::from_secs(30));
}
