use super::*;

#[tokio::test]
async fn memory_store_round_trips_and_clears() {
    let store = MemoryStore::new();
    assert_eq!(store.get(keys::GOAL).await.expect("get"), None);

    store.set(keys::GOAL, "Plan a trip").await.expect("set");
    assert_eq!(
        store.get(keys::GOAL).await.expect("get").as_deref(),
        Some("Plan a trip")
    );

    store.clear(keys::GOAL).await.expect("clear");
    store.clear(keys::GOAL).await.expect("clear twice");
    assert!(store.dump().is_empty());
}

#[tokio::test]
async fn sqlite_store_upserts_values() {
    let store = SqliteStore::new("sqlite::memory:").await.expect("db");
    store
        .set(keys::PERSONALIZATION, "I like hiking")
        .await
        .expect("first write");
    store
        .set(keys::PERSONALIZATION, "I like hiking. I like trains")
        .await
        .expect("overwrite");

    let value = store.get(keys::PERSONALIZATION).await.expect("read");
    assert_eq!(value.as_deref(), Some("I like hiking. I like trains"));
}

#[tokio::test]
async fn sqlite_store_clear_is_idempotent() {
    let store = SqliteStore::new("sqlite::memory:").await.expect("db");
    store.set(keys::SUMMARY, "Go to Lisbon").await.expect("write");

    store.clear(keys::SUMMARY).await.expect("clear");
    store.clear(keys::SUMMARY).await.expect("clear missing key");
    assert_eq!(store.get(keys::SUMMARY).await.expect("read"), None);
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = SqliteStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("explore.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = SqliteStore::new(&database_url).await.expect("db");
    store.set(keys::TASKS, "[]").await.expect("write");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_file_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/explore.db?mode=rwc"),
        Some(PathBuf::from("./data/explore.db"))
    );
}
