use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::domain::SessionId;
use tokio::sync::RwLock;

use crate::SessionStore;

/// Process-local store; every clone shares the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<SessionId, HashMap<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn keys(&self, session_id: &SessionId) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .get(session_id)
            .map(|scope| scope.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &SessionId, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(session_id)
            .and_then(|scope| scope.get(key))
            .cloned())
    }

    async fn set(&self, session_id: &SessionId, key: &str, value: Value) -> Result<()> {
        self.entries
            .write()
            .await
            .entry(session_id.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session_id: &SessionId, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(scope) = entries.get_mut(session_id) {
            scope.remove(key);
            if scope.is_empty() {
                entries.remove(session_id);
            }
        }
        Ok(())
    }
}
