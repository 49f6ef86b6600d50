//! Registry behavior: explicit named-pool ownership, no process-wide state.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockBackend;
use corral_pool::{Pool, PoolError, PoolRegistry};
use tokio_test::assert_ok;

async fn named_pool(backend: &Arc<MockBackend>, min: usize) -> Pool<Arc<MockBackend>> {
    Pool::builder(Arc::clone(backend))
        .capacity(4)
        .min_connections(min)
        .acquire_timeout(Duration::from_millis(100))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn register_get_remove_roundtrip() {
    let backend = MockBackend::new();
    let registry = PoolRegistry::new();
    assert!(registry.is_empty());

    assert_ok!(registry.register("primary", named_pool(&backend, 0).await));
    assert_ok!(registry.register("replica", named_pool(&backend, 0).await));
    assert_eq!(registry.len(), 2);

    let mut names = registry.names();
    names.sort();
    assert_eq!(names, vec!["primary".to_string(), "replica".to_string()]);

    let primary = registry.get("primary").unwrap();
    let conn = primary.acquire().await.unwrap();
    primary.release(conn).await;

    assert!(registry.get("unknown").is_none());

    let removed = registry.remove("replica").unwrap();
    assert!(!removed.is_closed(), "remove must not close the pool");
    assert_eq!(registry.len(), 1);
    assert!(registry.remove("replica").is_none());
}

#[tokio::test]
async fn duplicate_name_is_rejected_and_loser_keeps_its_pool() {
    let backend = MockBackend::new();
    let registry = PoolRegistry::new();

    assert_ok!(registry.register("primary", named_pool(&backend, 0).await));

    let loser = named_pool(&backend, 0).await;
    let err = registry.register("primary", loser.clone()).unwrap_err();
    assert_eq!(err, PoolError::DuplicateName("primary".to_string()));

    // The loser is untouched; its owner disposes of it.
    assert!(!loser.is_closed());
    loser.close_all().await;
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn close_all_closes_every_registered_pool() {
    let backend = MockBackend::new();
    let registry = PoolRegistry::new();

    let primary = named_pool(&backend, 2).await;
    let replica = named_pool(&backend, 3).await;
    assert_eq!(backend.opened(), 5);

    assert_ok!(registry.register("primary", primary.clone()));
    assert_ok!(registry.register("replica", replica.clone()));

    registry.close_all().await;

    assert!(registry.is_empty());
    assert!(primary.is_closed());
    assert!(replica.is_closed());
    assert_eq!(backend.closed(), 5);
}
