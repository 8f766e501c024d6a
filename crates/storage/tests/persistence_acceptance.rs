use storage::{keys, PersistenceStore, SqliteStore};

#[tokio::test]
async fn values_survive_reopening_the_store() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("explore.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let store = SqliteStore::new(&database_url).await.expect("open");
        store
            .set(keys::TASKS, r#"["Book flights","Find hotel"]"#)
            .await
            .expect("write tasks");
        store
            .set(keys::PERSONALIZATION, "I like hiking")
            .await
            .expect("write personalization");
    }

    let reopened = SqliteStore::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get(keys::TASKS).await.expect("read").as_deref(),
        Some(r#"["Book flights","Find hotel"]"#)
    );

    let as_trait: &dyn PersistenceStore = &reopened;
    for key in keys::ALL {
        as_trait.clear(key).await.expect("clear");
    }
    for key in keys::ALL {
        assert_eq!(as_trait.get(key).await.expect("read"), None, "key {key}");
    }
}
