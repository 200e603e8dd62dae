//! Directory-backed [`BlobStore`].
//!
//! Each upload lands at `files/<8 hex chars>-<sanitised name>` so two uploads
//! of `resume.pdf` never collide. Writes go to a temp file in the same
//! directory and are renamed into place, so readers never see half a file.

use super::{BlobStore, StoredFile};
use crate::error::ResumindError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const FILES_DIR: &str = "files";

/// Stores blobs as plain files under `<root>/files/`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store-relative path to disk, refusing anything outside `files/`.
    fn resolve(&self, path: &str) -> Result<PathBuf, ResumindError> {
        let rel = Path::new(path);
        let mut components = rel.components();
        let first_ok = matches!(components.next(), Some(Component::Normal(c)) if c == FILES_DIR);
        let rest_ok = components.all(|c| matches!(c, Component::Normal(_)));
        if !first_ok || !rest_ok || rel.components().count() != 2 {
            return Err(ResumindError::InvalidStoragePath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; replace everything else.
fn sanitise_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn storage_err(op: &'static str, target: &Path, source: std::io::Error) -> ResumindError {
    ResumindError::Storage {
        op,
        target: target.display().to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<StoredFile, ResumindError> {
        let dir = self.root.join(FILES_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_err("create_dir", &dir, e))?;

        let id = Uuid::new_v4().simple().to_string();
        let file_name = format!("{}-{}", &id[..8], sanitise_name(name));
        let rel = format!("{FILES_DIR}/{file_name}");
        let dest = dir.join(&file_name);
        let tmp = dir.join(format!(".{file_name}.tmp"));

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| storage_err("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| storage_err("rename", &dest, e))?;

        debug!("Stored {} ({} bytes)", rel, bytes.len());
        Ok(StoredFile {
            path: rel,
            name: name.to_string(),
            size: bytes.len() as u64,
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, ResumindError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| storage_err("read", &full, e))
    }

    async fn delete(&self, path: &str) -> Result<(), ResumindError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err("delete", &full, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitise() {
        assert_eq!(sanitise_name("Jane Doe (2024).pdf"), "Jane_Doe__2024_.pdf");
        assert_eq!(sanitise_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitise_name(".hidden"), "hidden");
        assert_eq!(sanitise_name(""), "file");
    }

    #[tokio::test]
    async fn upload_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let a = store.upload("cv.pdf", b"%PDF-a").await.unwrap();
        let b = store.upload("cv.pdf", b"%PDF-b").await.unwrap();
        assert_ne!(a.path, b.path);
        assert!(a.path.starts_with("files/") && a.path.ends_with("-cv.pdf"));
        assert_eq!(a.size, 6);

        assert_eq!(store.read(&a.path).await.unwrap(), b"%PDF-a");
        store.delete(&a.path).await.unwrap();
        assert!(store.read(&a.path).await.is_err());
        // second delete is a no-op
        store.delete(&a.path).await.unwrap();
        assert_eq!(store.read(&b.path).await.unwrap(), b"%PDF-b");
    }

    #[tokio::test]
    async fn rejects_paths_outside_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        for bad in ["../secret", "files/../../x", "/etc/passwd", "kv.json", "files/a/b"] {
            let err = store.read(bad).await.unwrap_err();
            assert!(
                matches!(err, ResumindError::InvalidStoragePath(_)),
                "{bad} accepted"
            );
        }
    }
}
