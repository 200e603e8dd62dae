//! Single-file [`KvStore`].
//!
//! The whole store is one JSON object (`key → string value`) in `kv.json`.
//! Every mutation is read-modify-write under a mutex, then written atomically
//! (temp file + rename). Record counts stay small for a personal tool, so
//! rewriting the file per update is fine.

use super::{KvItem, KvStore};
use crate::error::ResumindError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

const KV_FILE: &str = "kv.json";

/// Key-value store persisted to `<root>/kv.json`.
#[derive(Debug)]
pub struct FsKvStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FsKvStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(KV_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, ResumindError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ResumindError::CorruptRecord {
                key: self.path.display().to_string(),
                detail: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.err("read", e)),
        }
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<(), ResumindError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.err("create_dir", e))?;
        }
        let json = serde_json::to_vec_pretty(map)
            .map_err(|e| ResumindError::Internal(format!("kv encode: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.err("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.err("rename", e))
    }

    fn err(&self, op: &'static str, source: std::io::Error) -> ResumindError {
        ResumindError::Storage {
            op,
            target: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl KvStore for FsKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), ResumindError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await?;
        debug!("kv set {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ResumindError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn list(&self, pattern: &str) -> Result<Vec<KvItem>, ResumindError> {
        let _guard = self.lock.lock().await;
        let map = self.load().await?;
        Ok(map
            .into_iter()
            .filter(|(k, _)| glob_match(pattern, k))
            .map(|(key, value)| KvItem { key, value })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, ResumindError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        let existed = map.remove(key).is_some();
        if existed {
            self.save(&map).await?;
        }
        Ok(existed)
    }
}

/// Match `text` against a glob where `*` matches any run of characters
/// (including none). No other metacharacters.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume_at = 0;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            resume_at = ti;
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            resume_at += 1;
            ti = resume_at;
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}
