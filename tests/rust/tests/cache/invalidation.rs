//! Tests for cache invalidation across key families

use pretty_assertions::assert_eq;
use std::time::Duration;

use plexiglass_services::{make_key, CacheService};
use serde_json::json;

fn populated() -> CacheService<u32> {
    let cache = CacheService::new(Duration::from_secs(60));
    cache.set("server_info:home", 1, None);
    cache.set("server_info:cabin", 2, None);
    cache.set("sessions:home", 3, None);
    cache.set("sessions:cabin", 4, None);
    cache.set("library_list:home", 5, None);
    cache
}

#[test]
fn test_invalidate_one_server_across_families() {
    let cache = populated();

    let removed = cache.invalidate_pattern("*:home").unwrap();

    assert_eq!(removed, 3);
    assert_eq!(cache.size(), 2);
    assert!(cache.has("server_info:cabin"));
    assert!(cache.has("sessions:cabin"));
}

#[test]
fn test_invalidate_one_family() {
    let cache = populated();
    assert_eq!(cache.invalidate_prefix("sessions:"), 2);
    assert_eq!(cache.invalidate_prefix("sessions:"), 0);
    assert_eq!(cache.size(), 3);
}

#[test]
fn test_invalid_pattern_is_reported() {
    let cache = populated();
    assert!(cache.invalidate_pattern("[unclosed").is_err());
    assert_eq!(cache.size(), 5);
}

#[test]
fn test_hashed_keys_are_stable_across_argument_order() {
    let cache: CacheService<u32> = CacheService::default();
    let stored = make_key(
        &[json!("sessions")],
        &[("server", json!("home")), ("limit", json!(10))],
    );
    cache.set(stored, 9, None);

    let lookup = make_key(
        &[json!("sessions")],
        &[("limit", json!(10)), ("server", json!("home"))],
    );
    assert_eq!(cache.get(&lookup), Some(9));
}
