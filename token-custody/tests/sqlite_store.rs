use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tempfile::TempDir;
use token_custody::{Error, SqliteStoreConfig, SqliteTokenStore, TokenRecord, UserTokenStore};

fn store_config(dir: &TempDir) -> SqliteStoreConfig {
    let path = dir.path().join("tokenstore.db");
    SqliteStoreConfig::new(format!("sqlite:{}?mode=rwc", path.display()))
}

fn record(subject: &str, access_token: &str) -> TokenRecord {
    TokenRecord::new(subject, access_token, Utc::now() + Duration::seconds(3600))
}

#[tokio::test]
async fn test_store_then_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = SqliteTokenStore::new(store_config(&dir));

    let token = record("u1", "tok-A").with_refresh_token("ref-A");
    store.store(token.clone()).await.unwrap();

    assert_eq!(store.get("u1").await.unwrap(), Some(token));
    assert_eq!(store.get("u2").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_repopulates_memory_after_restart() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);

    let token = record("u2", "tok-B").with_refresh_token("ref-B");
    {
        let store = SqliteTokenStore::new(config.clone());
        store.store(token.clone()).await.unwrap();
        store.close().await;
    }

    // a fresh store over the same file starts with an empty memory cache
    let store = SqliteTokenStore::new(config);
    assert_eq!(store.get("u2").await.unwrap(), Some(token.clone()));

    // second read is a memory hit and still agrees
    assert_eq!(store.get("u2").await.unwrap(), Some(token));
}

#[tokio::test]
async fn test_store_supersedes_prior_record() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);
    let store = SqliteTokenStore::new(config.clone());

    store
        .store(record("u1", "tok-A").with_refresh_token("ref-A"))
        .await
        .unwrap();
    let replacement = record("u1", "tok-B");
    store.store(replacement.clone()).await.unwrap();

    let current = store.get("u1").await.unwrap().unwrap();
    assert_eq!(current, replacement);
    assert!(current.refresh_token.is_none());

    // the replacement is what survived, not a merge of the two
    store.close().await;
    let store = SqliteTokenStore::new(config);
    assert_eq!(store.get("u1").await.unwrap(), Some(replacement));
}

#[tokio::test]
async fn test_clear_removes_token_durably() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);
    let store = SqliteTokenStore::new(config.clone());

    store.store(record("u1", "tok-A")).await.unwrap();
    store.clear("u1").await.unwrap();
    assert_eq!(store.get("u1").await.unwrap(), None);

    store.close().await;
    let store = SqliteTokenStore::new(config);
    assert_eq!(store.get("u1").await.unwrap(), None);
}

#[tokio::test]
async fn test_clear_unknown_subject_is_noop() {
    let dir = TempDir::new().unwrap();
    let store = SqliteTokenStore::new(store_config(&dir));
    store.clear("never-stored").await.unwrap();
}

#[tokio::test]
async fn test_empty_subject_rejected_without_partial_writes() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);
    let store = SqliteTokenStore::new(config.clone());

    assert!(matches!(store.get("").await, Err(Error::InvalidSubject)));
    assert!(matches!(
        store.store(record("", "tok-A")).await,
        Err(Error::InvalidSubject)
    ));
    assert!(matches!(store.clear("").await, Err(Error::InvalidSubject)));

    // force schema creation so the table is queryable, then verify it is empty
    store.get("probe").await.unwrap();
    let pool = SqlitePool::connect(&config.database_url).await.unwrap();
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM tokenstore")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_stores_leave_memory_and_table_agreeing() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);
    let store = Arc::new(SqliteTokenStore::new(config.clone()));

    let token_a = record("u1", "tok-A").with_refresh_token("ref-A");
    let token_b = record("u1", "tok-B").with_refresh_token("ref-B");

    let store_a = store.clone();
    let store_b = store.clone();
    let write_a = {
        let token_a = token_a.clone();
        tokio::spawn(async move { store_a.store(token_a).await })
    };
    let write_b = {
        let token_b = token_b.clone();
        tokio::spawn(async move { store_b.store(token_b).await })
    };
    write_a.await.unwrap().unwrap();
    write_b.await.unwrap().unwrap();

    let cached = store.get("u1").await.unwrap().unwrap();
    assert!(cached == token_a || cached == token_b);

    let pool = SqlitePool::connect(&config.database_url).await.unwrap();
    let row = sqlx::query("SELECT access_token, refresh_token FROM tokenstore WHERE sub = ?")
        .bind("u1")
        .fetch_one(&pool)
        .await
        .unwrap();
    let durable_access: String = row.get("access_token");
    let durable_refresh: Option<String> = row.get("refresh_token");

    // whichever write finished last won both views
    assert_eq!(durable_access, cached.access_token);
    assert_eq!(durable_refresh, cached.refresh_token);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_first_use_initializes_once() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteTokenStore::new(store_config(&dir)));

    let mut reads = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        reads.push(tokio::spawn(
            async move { store.get(&format!("u{}", i)).await },
        ));
    }
    for read in reads {
        assert_eq!(read.await.unwrap().unwrap(), None);
    }
}

#[tokio::test]
async fn test_schema_creation_is_idempotent_across_stores() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);

    let first = SqliteTokenStore::new(config.clone());
    first.store(record("u1", "tok-A")).await.unwrap();

    // second store against the same file re-runs the create statement
    let second = SqliteTokenStore::new(config);
    assert!(second.get("u1").await.unwrap().is_some());
    second.store(record("u2", "tok-B")).await.unwrap();
}

#[tokio::test]
async fn test_close_is_idempotent_and_reads_degrade() {
    let dir = TempDir::new().unwrap();
    let store = SqliteTokenStore::new(store_config(&dir));

    let token = record("u1", "tok-A");
    store.store(token.clone()).await.unwrap();

    store.close().await;
    store.close().await;

    // cached subject still served from memory, uncached reads degrade to absent
    assert_eq!(store.get("u1").await.unwrap(), Some(token));
    assert_eq!(store.get("u2").await.unwrap(), None);
}

#[tokio::test]
async fn test_login_get_clear_scenario() {
    let dir = TempDir::new().unwrap();
    let store = SqliteTokenStore::new(store_config(&dir));

    let expiration = Utc::now() + Duration::seconds(3600);
    store
        .store(TokenRecord::new("u1", "tok-A", expiration).with_refresh_token("ref-A"))
        .await
        .unwrap();

    let token = store.get("u1").await.unwrap().unwrap();
    assert_eq!(token.access_token, "tok-A");
    assert_eq!(token.expiration, expiration);
    assert_eq!(token.refresh_token.as_deref(), Some("ref-A"));

    store.clear("u1").await.unwrap();
    assert_eq!(store.get("u1").await.unwrap(), None);
}
