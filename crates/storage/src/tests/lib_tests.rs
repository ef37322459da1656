use super::*;
use serde_json::json;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("sessions.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn set_then_get_returns_latest_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = SessionId::from("s-1");

    assert!(storage.get(&session, "wizard:a").await.expect("get").is_none());

    storage
        .set(&session, "wizard:a", json!({ "current_step": "info" }))
        .await
        .expect("set");
    storage
        .set(&session, "wizard:a", json!({ "current_step": "address" }))
        .await
        .expect("overwrite");

    let value = storage
        .get(&session, "wizard:a")
        .await
        .expect("get")
        .expect("present");
    assert_eq!(value["current_step"], "address");
}

#[tokio::test]
async fn keys_and_sessions_do_not_collide() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let alice = SessionId::from("alice");
    let bob = SessionId::from("bob");

    storage.set(&alice, "wizard:a", json!(1)).await.expect("set");
    storage.set(&alice, "wizard:b", json!(2)).await.expect("set");
    storage.set(&bob, "wizard:a", json!(3)).await.expect("set");

    assert_eq!(storage.get(&alice, "wizard:a").await.expect("get"), Some(json!(1)));
    assert_eq!(storage.get(&alice, "wizard:b").await.expect("get"), Some(json!(2)));
    assert_eq!(storage.get(&bob, "wizard:a").await.expect("get"), Some(json!(3)));
    assert_eq!(storage.get(&bob, "wizard:b").await.expect("get"), None);
}

#[tokio::test]
async fn remove_and_clear_session() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = SessionId::from("s-2");
    storage.set(&session, "wizard:a", json!({})).await.expect("set");
    storage.set(&session, "wizard:b", json!({})).await.expect("set");

    storage.remove(&session, "wizard:a").await.expect("remove");
    assert!(storage.get(&session, "wizard:a").await.expect("get").is_none());

    let removed = storage.clear_session(&session).await.expect("clear");
    assert_eq!(removed, 1);
    assert!(storage.list_sessions(10).await.expect("list").is_empty());
}

#[tokio::test]
async fn list_and_purge_sessions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .set(&SessionId::from("s-3"), "wizard:a", json!({ "k": "v" }))
        .await
        .expect("set");

    let listed = storage.list_sessions(10).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].session_id, SessionId::from("s-3"));
    assert_eq!(listed[0].state_key, "wizard:a");
    assert!(listed[0].size_bytes > 0);

    let kept = storage
        .purge_older_than(Utc::now() - chrono::Duration::hours(1))
        .await
        .expect("purge");
    assert_eq!(kept, 0);

    let purged = storage
        .purge_older_than(Utc::now() + chrono::Duration::seconds(5))
        .await
        .expect("purge");
    assert_eq!(purged, 1);
}

#[tokio::test]
async fn memory_store_drops_empty_sessions() {
    let store = MemoryStore::new();
    let session = SessionId::from("m-1");
    store.set(&session, "wizard:a", json!(true)).await.expect("set");
    assert_eq!(store.session_count().await, 1);
    assert_eq!(store.keys(&session).await, vec!["wizard:a".to_string()]);

    store.remove(&session, "wizard:a").await.expect("remove");
    assert_eq!(store.session_count().await, 0);
    assert!(store.get(&session, "wizard:a").await.expect("get").is_none());
}

#[test]
fn sqlite_path_ignores_memory_urls() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/sessions.db?mode=rwc"),
        Some(PathBuf::from("./data/sessions.db"))
    );
}
