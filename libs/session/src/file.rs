use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::{append_bounded, touch, SessionData, SessionStore};

/// File-backed session store: one JSON file per conversation id under a
/// configured directory.
///
/// Mutations hold a per-conversation mutex and land through an atomic
/// rename, so concurrent requests for the same conversation cannot lose
/// updates or observe partial writes.
pub struct FileSessionStore {
    dir: PathBuf,
    extension: String,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, "txt")
    }

    pub fn with_extension(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, conversation: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation.to_string())
            .or_default()
            .clone()
    }

    fn path_for(&self, conversation: &str) -> Result<PathBuf> {
        // Conversation ids become file names; refuse anything that could
        // escape the session directory.
        if conversation.is_empty()
            || conversation.contains(['/', '\\'])
            || conversation.contains("..")
        {
            bail!("invalid conversation id {conversation:?}");
        }
        Ok(self.dir.join(format!("{conversation}.{}", self.extension)))
    }

    fn load(path: &Path) -> Result<SessionData> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(SessionData::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read session {}", path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(SessionData::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("parse session {}", path.display()))
    }

    fn persist(&self, path: &Path, data: &SessionData) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create session dir {}", self.dir.display()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).context("create session temp file")?;
        serde_json::to_writer(&mut tmp, data).context("encode session record")?;
        tmp.flush().context("flush session record")?;
        tmp.persist(path)
            .with_context(|| format!("persist session {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, conversation: &str) -> Result<SessionData> {
        let path = self.path_for(conversation)?;
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;
        let data = Self::load(&path)?;
        if !path.exists() {
            // First touch creates the record so later readers see it.
            self.persist(&path, &data)?;
        }
        Ok(data)
    }

    async fn set(&self, conversation: &str, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(conversation)?;
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;
        let mut data = Self::load(&path)?;
        data.insert(key.to_string(), value);
        touch(&mut data);
        self.persist(&path, &data)
    }

    async fn append(&self, conversation: &str, key: &str, value: Value, cap: usize) -> Result<()> {
        let path = self.path_for(conversation)?;
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;
        let mut data = Self::load(&path)?;
        append_bounded(&mut data, key, value, cap);
        touch(&mut data);
        self.persist(&path, &data)
    }

    async fn clear(&self, conversation: &str) -> Result<()> {
        let path = self.path_for(conversation)?;
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;
        // A cleared record is the literal empty object, with no timestamp.
        self.persist(&path, &SessionData::new())
    }

    async fn remove(&self, conversation: &str) -> Result<()> {
        let path = self.path_for(conversation)?;
        let lock = self.lock_for(conversation);
        let _guard = lock.lock().await;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("remove session {}", path.display()))
            }
        }
        drop(_guard);
        self.locks.remove(conversation);
        Ok(())
    }
}
