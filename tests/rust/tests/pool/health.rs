//! Tests for ConnectionPool::health_check

use std::sync::Arc;
use std::time::Duration;

use plexiglass_core::ServerRegistry;
use plexiglass_services::{ClientError, ConnectionPool};
use tests::fixtures::{descriptor, pool_with};
use tests::mocks::*;

#[tokio::test]
async fn test_healthy_connection() {
    let pool = pool_with(&["Home"], Arc::new(MockClientFactory::new()));
    pool.connect("Home").await.unwrap();
    assert!(pool.health_check("Home").await);
    assert!(pool.health_check("HOME").await);
}

#[tokio::test]
async fn test_not_connected_is_unhealthy() {
    let factory = Arc::new(MockClientFactory::new());
    let pool = pool_with(&["Home"], factory.clone());

    assert!(!pool.health_check("Home").await);
    assert!(!pool.health_check("Nowhere").await);
    // Probing never connects
    assert_eq!(factory.call_count(), 0);
}

#[tokio::test]
async fn test_failed_identity_is_unhealthy() {
    let server =
        MockMediaServer::default().with_identity_error(ClientError::Other("reset".to_string()));
    let pool = pool_with(&["Home"], Arc::new(MockClientFactory::with_server(server)));

    pool.connect("Home").await.unwrap();
    assert!(!pool.health_check("Home").await);
    // A failed probe does not evict the connection
    assert!(pool.is_connected("Home"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_identity_is_unhealthy() {
    let server = MockMediaServer::default().with_identity_delay(Duration::from_secs(120));
    let registry = Arc::new(ServerRegistry::new(vec![
        descriptor("Home").with_timeout(Duration::from_secs(3))
    ]));
    let pool = ConnectionPool::new(registry, Arc::new(MockClientFactory::with_server(server)));

    pool.connect("Home").await.unwrap();
    assert!(!pool.health_check("Home").await);
}
