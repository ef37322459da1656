use super::{load_settings_from, normalize_database_url, normalize_mount_path, prepare_database_url};

use std::{collections::HashMap, fs, path::Path};

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings =
        load_settings_from(Path::new("does-not-exist.toml"), HashMap::new()).expect("settings");
    assert_eq!(settings.bind_addr, "127.0.0.1:8080");
    assert_eq!(settings.mount_path, "/wizard");
    assert_eq!(settings.session_cookie, "wizard_session");
    assert!(settings.manifest_path.is_none());
    assert!(!settings.uses_memory_store());
}

#[test]
fn file_then_legacy_then_app_variables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("server.toml");
    fs::write(
        &file,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "memory"
mount_path = "signup/"
isolation_key = "wizard:signup"
"#,
    )
    .expect("write");

    let from_file = load_settings_from(&file, HashMap::new()).expect("settings");
    assert_eq!(from_file.bind_addr, "0.0.0.0:9000");
    assert!(from_file.uses_memory_store());
    assert_eq!(from_file.mount_path, "/signup");
    assert_eq!(from_file.isolation_key.as_deref(), Some("wizard:signup"));

    let legacy = load_settings_from(&file, env(&[("SERVER_BIND", "127.0.0.1:7000")]))
        .expect("settings");
    assert_eq!(legacy.bind_addr, "127.0.0.1:7000");

    let app = load_settings_from(
        &file,
        env(&[
            ("SERVER_BIND", "127.0.0.1:7000"),
            ("APP__BIND_ADDR", "127.0.0.1:7001"),
            ("APP__MAX_BODY_BYTES", "1024"),
            ("WIZARD_MANIFEST", "steps.toml"),
        ]),
    )
    .expect("settings");
    assert_eq!(app.bind_addr, "127.0.0.1:7001");
    assert_eq!(app.max_body_bytes, 1024);
    assert_eq!(
        app.manifest_path.as_deref(),
        Some(Path::new("steps.toml"))
    );
}

#[test]
fn mount_path_is_rooted_without_trailing_separator() {
    assert_eq!(normalize_mount_path("wizard"), "/wizard");
    assert_eq!(normalize_mount_path("/signup/"), "/signup");
    assert_eq!(normalize_mount_path("  "), "/wizard");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\test.db"),
        "sqlite://data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("sessions.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
