//! Per-conversation session storage.
//!
//! One JSON record per conversation id. Every mutating operation stamps the
//! reserved [`LAST_UPDATE_KEY`] field with epoch seconds. `append` keeps a
//! bounded ordered sequence under one key, evicting the oldest entries.

mod bounded;
mod file;
mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use bounded::BoundedLog;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Reserved key stamped on every mutation.
pub const LAST_UPDATE_KEY: &str = "last_update";

/// Default bound for [`SessionStore::append`] sequences.
pub const DEFAULT_APPEND_CAP: usize = 7;

/// A session record: string keys to arbitrary JSON values.
pub type SessionData = serde_json::Map<String, Value>;

/// Shared session store handle used across services.
pub type SharedSessionStore = Arc<dyn SessionStore>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads the record, creating an empty one if absent.
    async fn get(&self, conversation: &str) -> Result<SessionData>;
    /// Sets one key.
    async fn set(&self, conversation: &str, key: &str, value: Value) -> Result<()>;
    /// Appends to the bounded sequence under `key`, evicting from the front
    /// when it would exceed `cap`. A non-array existing value is replaced.
    async fn append(&self, conversation: &str, key: &str, value: Value, cap: usize) -> Result<()>;
    /// Resets the record to empty.
    async fn clear(&self, conversation: &str) -> Result<()>;
    /// Deletes the record entirely.
    async fn remove(&self, conversation: &str) -> Result<()>;
}

/// Returns a file-backed store wrapped in an [`Arc`].
pub fn shared_file_store(dir: impl Into<std::path::PathBuf>) -> SharedSessionStore {
    Arc::new(FileSessionStore::new(dir))
}

pub(crate) fn touch(data: &mut SessionData) {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    data.insert(LAST_UPDATE_KEY.to_string(), Value::from(now));
}

pub(crate) fn append_bounded(data: &mut SessionData, key: &str, value: Value, cap: usize) {
    let mut log = BoundedLog::new(cap);
    if let Some(Value::Array(existing)) = data.remove(key) {
        for item in existing {
            log.push(item);
        }
    }
    log.push(value);
    data.insert(key.to_string(), Value::Array(log.into_vec()));
}
