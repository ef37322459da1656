use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    /// SQLite URL or path; `memory` keeps sessions in process memory.
    pub database_url: String,
    pub manifest_path: Option<PathBuf>,
    /// Fixed wizard isolation key; needed when several processes share one session database.
    pub isolation_key: Option<String>,
    pub session_cookie: String,
    pub mount_path: String,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/sessions.db".into(),
            manifest_path: None,
            isolation_key: None,
            session_cookie: "wizard_session".into(),
            mount_path: "/wizard".into(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Settings {
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.trim().eq_ignore_ascii_case("memory")
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new("server.toml"), std::env::vars().collect())
}

/// Defaults, then `config_file` (if present), then legacy plain variables, then `APP__*`.
pub fn load_settings_from(
    config_file: &Path,
    env: HashMap<String, String>,
) -> anyhow::Result<Settings> {
    let legacy = [
        ("SERVER_BIND", "bind_addr"),
        ("DATABASE_URL", "database_url"),
        ("WIZARD_MANIFEST", "manifest_path"),
    ];

    let mut builder = config::Config::builder().add_source(
        config::File::from(config_file)
            .format(config::FileFormat::Toml)
            .required(false),
    );
    for (variable, key) in legacy {
        builder = builder.set_override_option(key, env.get(variable).cloned())?;
    }
    for (key, value) in app_overrides(&env) {
        builder = builder.set_override(key, value)?;
    }

    let mut settings: Settings = builder
        .build()
        .context("failed to assemble server settings")?
        .try_deserialize()
        .context("invalid server settings")?;

    settings.mount_path = normalize_mount_path(&settings.mount_path);
    Ok(settings)
}

// `APP__BIND_ADDR=...` -> `bind_addr`; later sources win, so these go last.
fn app_overrides(env: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut overrides: Vec<(String, String)> = env
        .iter()
        .filter_map(|(name, value)| {
            let key = name.strip_prefix("APP__")?;
            Some((key.to_ascii_lowercase(), value.clone()))
        })
        .collect();
    overrides.sort();
    overrides
}

fn normalize_mount_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Settings::default().mount_path;
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
