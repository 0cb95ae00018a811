use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::{append_bounded, touch, SessionData, SessionStore};

/// In-memory session store, mostly for tests and single-process setups.
#[derive(Default)]
pub struct MemorySessionStore {
    records: DashMap<String, SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, conversation: &str) -> Result<SessionData> {
        Ok(self
            .records
            .entry(conversation.to_string())
            .or_default()
            .clone())
    }

    async fn set(&self, conversation: &str, key: &str, value: Value) -> Result<()> {
        let mut record = self.records.entry(conversation.to_string()).or_default();
        record.insert(key.to_string(), value);
        touch(&mut record);
        Ok(())
    }

    async fn append(&self, conversation: &str, key: &str, value: Value, cap: usize) -> Result<()> {
        let mut record = self.records.entry(conversation.to_string()).or_default();
        append_bounded(&mut record, key, value, cap);
        touch(&mut record);
        Ok(())
    }

    async fn clear(&self, conversation: &str) -> Result<()> {
        self.records
            .insert(conversation.to_string(), SessionData::new());
        Ok(())
    }

    async fn remove(&self, conversation: &str) -> Result<()> {
        self.records.remove(conversation);
        Ok(())
    }
}
