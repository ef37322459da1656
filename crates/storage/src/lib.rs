use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::SessionId;

mod memory;

pub use memory::MemoryStore;

/// Per-session key/value scope shared by every request of one user.
///
/// Implementations must give read-your-writes consistency for a single
/// `(session, key)` pair; ordering of concurrent writes to the same pair is
/// whatever the backend provides.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &SessionId, key: &str) -> Result<Option<Value>>;
    async fn set(&self, session_id: &SessionId, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, session_id: &SessionId, key: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredSessionEntry {
    pub session_id: SessionId,
    pub state_key: String,
    pub size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_sessions(&self, limit: u32) -> Result<Vec<StoredSessionEntry>> {
        let rows = sqlx::query(
            "SELECT session_id, state_key, length(value_json) AS size_bytes, updated_at
             FROM wizard_sessions
             ORDER BY updated_at DESC, session_id, state_key
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(StoredSessionEntry {
                    session_id: SessionId(row.try_get("session_id")?),
                    state_key: row.try_get("state_key")?,
                    size_bytes: u64::try_from(row.try_get::<i64, _>("size_bytes")?)
                        .unwrap_or_default(),
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    pub async fn clear_session(&self, session_id: &SessionId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM wizard_sessions WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drops every entry not written since `cutoff`, mirroring session expiry.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM wizard_sessions WHERE updated_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for Storage {
    async fn get(&self, session_id: &SessionId, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT value_json FROM wizard_sessions WHERE session_id = ? AND state_key = ?",
        )
        .bind(session_id.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get(0)?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt session value for key '{key}'"))?;
        Ok(Some(value))
    }

    async fn set(&self, session_id: &SessionId, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;
        sqlx::query(
            "INSERT INTO wizard_sessions (session_id, state_key, value_json, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(session_id, state_key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        )
        .bind(session_id.as_str())
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, session_id: &SessionId, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM wizard_sessions WHERE session_id = ? AND state_key = ?")
            .bind(session_id.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
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
#[path = "tests/lib_tests.rs"]
mod tests;
