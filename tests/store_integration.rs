//! Integration tests for `PostgresStore` against a real Postgres instance.
//!
//! These tests run against a real Postgres container in Docker. They verify
//! that the store implementations work correctly against the actual
//! migrated schema, including the natural-key dedup constraint on
//! `fee_events`.

mod common;

use chrono::{Duration, Utc};

use common::fixtures::{TestDb, chain_fixtures};
use fee_indexer::ports::{ChainRegistry, EventFilter, EventStore};
use fee_indexer::types::primitives::{ChainId, EthAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN REGISTRY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn chain_save_and_get_roundtrips() {
    let db = TestDb::new().await;

    let chain = chain_fixtures::create_test_chain(1);
    db.store.upsert_chain(&chain).await.unwrap();

    let retrieved = db
        .store
        .get_chain(chain.chain_id)
        .await
        .unwrap()
        .expect("chain should exist");

    assert_eq!(retrieved.chain_id, chain.chain_id);
    assert_eq!(retrieved.name, chain.name);
    assert_eq!(retrieved.rpc_url, chain.rpc_url);
    assert!(!retrieved.is_enabled);
}

#[tokio::test]
async fn chain_upsert_replaces_existing_row() {
    let db = TestDb::new().await;

    let mut chain = chain_fixtures::create_test_chain(2);
    db.store.upsert_chain(&chain).await.unwrap();

    chain.rpc_url = "https://rpc.example.com/updated".to_string();
    chain.is_enabled = true;
    db.store.upsert_chain(&chain).await.unwrap();

    let retrieved = db.store.get_chain(chain.chain_id).await.unwrap().unwrap();
    assert_eq!(retrieved.rpc_url, "https://rpc.example.com/updated");
    assert!(retrieved.is_enabled);
}

#[tokio::test]
async fn list_chains_returns_every_configured_chain() {
    let db = TestDb::new().await;

    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(10))
        .await
        .unwrap();
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(11))
        .await
        .unwrap();

    let chains = db.store.list_chains().await.unwrap();
    assert_eq!(chains.len(), 2);
}

#[tokio::test]
async fn delete_chain_removes_the_row() {
    let db = TestDb::new().await;

    let chain = chain_fixtures::create_test_chain(20);
    db.store.upsert_chain(&chain).await.unwrap();
    db.store.delete_chain(chain.chain_id).await.unwrap();

    assert!(db.store.get_chain(chain.chain_id).await.unwrap().is_none());
}

#[tokio::test]
async fn cursor_save_and_get_roundtrips() {
    let db = TestDb::new().await;

    let chain = chain_fixtures::create_test_chain(30);
    db.store.upsert_chain(&chain).await.unwrap();

    let cursor = chain_fixtures::create_initial_cursor(30, 100);
    db.store.upsert_cursor(&cursor).await.unwrap();

    let retrieved = db
        .store
        .get_cursor(chain.chain_id)
        .await
        .unwrap()
        .expect("cursor should exist");

    assert_eq!(retrieved.last_processed_block.get(), 99);
    assert!(!retrieved.is_active);
}

#[tokio::test]
async fn cursor_delete_is_independent_of_chain() {
    let db = TestDb::new().await;

    let chain = chain_fixtures::create_test_chain(31);
    db.store.upsert_chain(&chain).await.unwrap();
    let cursor = chain_fixtures::create_initial_cursor(31, 100);
    db.store.upsert_cursor(&cursor).await.unwrap();

    db.store.delete_cursor(chain.chain_id).await.unwrap();

    assert!(
        db.store
            .get_cursor(chain.chain_id)
            .await
            .unwrap()
            .is_none()
    );
    // The chain config itself is untouched.
    assert!(db.store.get_chain(chain.chain_id).await.unwrap().is_some());
}

#[tokio::test]
async fn cursor_is_deleted_when_its_chain_is_deleted() {
    let db = TestDb::new().await;

    let chain = chain_fixtures::create_test_chain(32);
    db.store.upsert_chain(&chain).await.unwrap();
    let cursor = chain_fixtures::create_initial_cursor(32, 100);
    db.store.upsert_cursor(&cursor).await.unwrap();

    db.store.delete_chain(chain.chain_id).await.unwrap();

    assert!(
        db.store
            .get_cursor(chain.chain_id)
            .await
            .unwrap()
            .is_none(),
        "cursor should cascade-delete with its chain"
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT STORE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn insert_many_persists_new_events() {
    let db = TestDb::new().await;
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(40))
        .await
        .unwrap();

    let events = vec![
        chain_fixtures::create_test_event(40, "0xaaa", 0),
        chain_fixtures::create_test_event(40, "0xaaa", 1),
    ];

    let inserted = db.store.insert_many(&events).await.unwrap();
    assert_eq!(inserted, 2);

    let count = db
        .store
        .count_by_filter(&EventFilter {
            chain_id: Some(ChainId::new(40).unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn insert_many_is_idempotent_on_natural_key() {
    let db = TestDb::new().await;
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(41))
        .await
        .unwrap();

    let event = chain_fixtures::create_test_event(41, "0xbbb", 0);
    let first = db.store.insert_many(&[event.clone()]).await.unwrap();
    let second = db.store.insert_many(&[event]).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0, "re-inserting the same natural key inserts nothing");
}

#[tokio::test]
async fn find_existing_keys_reports_only_persisted_keys() {
    let db = TestDb::new().await;
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(42))
        .await
        .unwrap();

    let event = chain_fixtures::create_test_event(42, "0xccc", 0);
    db.store.insert_many(&[event.clone()]).await.unwrap();

    let chain_id = ChainId::new(42).unwrap();
    let keys = vec![
        (chain_id, "0xccc".to_string(), 0),
        (chain_id, "0xddd".to_string(), 0),
    ];
    let existing = db.store.find_existing_keys(&keys).await.unwrap();

    assert_eq!(existing.len(), 1);
    assert!(existing.contains(&(chain_id, "0xccc".to_string(), 0)));
}

#[tokio::test]
async fn count_and_find_by_filter_scope_to_integrator() {
    let db = TestDb::new().await;
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(43))
        .await
        .unwrap();

    let mut event_a = chain_fixtures::create_test_event(43, "0xeee", 0);
    event_a.integrator = EthAddress::new([0x11; 20]);
    let mut event_b = chain_fixtures::create_test_event(43, "0xfff", 0);
    event_b.integrator = EthAddress::new([0x22; 20]);

    db.store
        .insert_many(&[event_a.clone(), event_b])
        .await
        .unwrap();

    let filter = EventFilter {
        integrator: Some(event_a.integrator),
        ..Default::default()
    };
    let count = db.store.count_by_filter(&filter).await.unwrap();
    assert_eq!(count, 1);

    let found = db.store.find_by_filter(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].transaction_hash, "0xeee");
}

#[tokio::test]
async fn find_by_filter_respects_time_range_and_limit() {
    let db = TestDb::new().await;
    db.store
        .upsert_chain(&chain_fixtures::create_test_chain(44))
        .await
        .unwrap();

    let now = Utc::now();
    let mut old_event = chain_fixtures::create_test_event(44, "0x111", 0);
    old_event.timestamp = now - Duration::days(2);
    let mut recent_event = chain_fixtures::create_test_event(44, "0x222", 0);
    recent_event.timestamp = now;

    db.store
        .insert_many(&[old_event, recent_event])
        .await
        .unwrap();

    let filter = EventFilter {
        from: Some(now - Duration::hours(1)),
        limit: Some(10),
        ..Default::default()
    };
    let found = db.store.find_by_filter(&filter).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].transaction_hash, "0x222");
}
