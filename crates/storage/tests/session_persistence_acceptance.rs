use serde_json::json;
use shared::domain::SessionId;
use storage::{SessionStore, Storage};

#[tokio::test]
async fn session_values_survive_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("sessions.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let session = SessionId::from("persisted-session");

    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage
            .set(
                &session,
                "wizard:signup",
                json!({ "current_step": "address", "form_data": { "info": { "name": "Ada" } } }),
            )
            .await
            .expect("set");
        storage.pool().close().await;
    }

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let value = reopened
        .get(&session, "wizard:signup")
        .await
        .expect("get")
        .expect("value persisted");
    assert_eq!(value["current_step"], "address");
    assert_eq!(value["form_data"]["info"]["name"], "Ada");
}

#[tokio::test]
async fn storage_is_usable_as_a_trait_object() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let store: &dyn SessionStore = &storage;
    let session = SessionId::from("dyn-session");

    store.set(&session, "k", json!([1, 2, 3])).await.expect("set");
    assert_eq!(store.get(&session, "k").await.expect("get"), Some(json!([1, 2, 3])));
    store.remove(&session, "k").await.expect("remove");
    assert_eq!(store.get(&session, "k").await.expect("get"), None);
}
