//! Stored resumes: listing, loading with their files, deleting.

use crate::error::ResumindError;
use crate::record::{record_key, ResumeRecord, KEY_PATTERN};
use crate::storage::{BlobStore, FsBlobStore, FsKvStore, KvStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A record together with its PDF and preview bytes.
#[derive(Debug, Clone)]
pub struct LoadedResume {
    pub record: ResumeRecord,
    pub pdf: Vec<u8>,
    pub image: Vec<u8>,
}

/// Read/write access to the stored resumes.
pub struct ResumeLibrary {
    blobs: Arc<dyn BlobStore>,
    kv: Arc<dyn KvStore>,
}

impl ResumeLibrary {
    pub fn new(blobs: Arc<dyn BlobStore>, kv: Arc<dyn KvStore>) -> Self {
        Self { blobs, kv }
    }

    /// Library over the filesystem stores in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            Arc::new(FsBlobStore::new(dir)),
            Arc::new(FsKvStore::new(dir)),
        )
    }

    /// All records, newest first. Entries that no longer parse are skipped
    /// with a warning so one bad record doesn't hide the rest.
    pub async fn list(&self) -> Result<Vec<ResumeRecord>, ResumindError> {
        let items = self.kv.list(KEY_PATTERN).await?;
        let mut records: Vec<ResumeRecord> = items
            .iter()
            .filter_map(|item| match ResumeRecord::from_json(&item.key, &item.value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping {}: {}", item.key, e);
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!("Listed {} resumes", records.len());
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<ResumeRecord, ResumindError> {
        let key = record_key(id);
        let json = self
            .kv
            .get(&key)
            .await?
            .ok_or_else(|| ResumindError::RecordNotFound { id: id.to_string() })?;
        ResumeRecord::from_json(&key, &json)
    }

    /// Record plus the stored PDF and preview.
    pub async fn load(&self, id: &str) -> Result<LoadedResume, ResumindError> {
        let record = self.get(id).await?;
        let pdf = self.blobs.read(&record.resume_path).await?;
        let image = self.blobs.read(&record.image_path).await?;
        Ok(LoadedResume { record, pdf, image })
    }

    pub async fn save(&self, record: &ResumeRecord) -> Result<(), ResumindError> {
        self.kv.set(&record.key(), &record.to_json()?).await
    }

    /// Remove the record, then both of its files.
    ///
    /// The key goes first so a record never points at deleted files. An entry
    /// that no longer parses is still removed; `None` is returned for it and
    /// whichever file paths can still be read out of it are cleaned up too.
    /// File removal is best effort.
    pub async fn delete(&self, id: &str) -> Result<Option<ResumeRecord>, ResumindError> {
        let key = record_key(id);
        let json = self
            .kv
            .get(&key)
            .await?
            .ok_or_else(|| ResumindError::RecordNotFound { id: id.to_string() })?;
        self.kv.delete(&key).await?;

        let (record, paths) = match ResumeRecord::from_json(&key, &json) {
            Ok(record) => {
                let paths = vec![record.resume_path.clone(), record.image_path.clone()];
                (Some(record), paths)
            }
            Err(e) => {
                warn!("Deleting unreadable {}: {}", key, e);
                (None, salvage_paths(&json))
            }
        };

        for path in &paths {
            if let Err(e) = self.blobs.delete(path).await {
                warn!("Could not remove {} of resume {}: {}", path, id, e);
            }
        }
        info!("Deleted resume {}", id);
        Ok(record)
    }
}

/// File paths still readable from a record that fails to parse as a whole.
fn salvage_paths(json: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(json) else {
        return Vec::new();
    };
    ["resumePath", "imagePath"]
        .into_iter()
        .filter_map(|field| value.get(field).and_then(|v| v.as_str()))
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JobDetails;
    use chrono::{Duration, Utc};

    fn job(title: &str) -> JobDetails {
        JobDetails {
            company_name: "Acme".into(),
            job_title: title.into(),
            job_description: String::new(),
        }
    }

    #[tokio::test]
    async fn list_newest_first_skipping_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());

        let mut old = ResumeRecord::new("files/a.pdf", "files/a.png", &job("Old"));
        old.created_at = Utc::now() - Duration::days(1);
        let new = ResumeRecord::new("files/b.pdf", "files/b.png", &job("New"));
        lib.save(&old).await.unwrap();
        lib.save(&new).await.unwrap();
        lib.kv.set("resume:broken", "not json").await.unwrap();

        let titles: Vec<_> = lib
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.job_title)
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn load_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());

        let pdf = lib.blobs.upload("cv.pdf", b"%PDF-1.7").await.unwrap();
        let png = lib.blobs.upload("cv.png", b"\x89PNG").await.unwrap();
        let record = ResumeRecord::new(pdf.path.clone(), png.path.clone(), &job("Dev"));
        lib.save(&record).await.unwrap();

        let loaded = lib.load(&record.id).await.unwrap();
        assert_eq!(loaded.pdf, b"%PDF-1.7");
        assert_eq!(loaded.image, b"\x89PNG");
        assert!(!loaded.record.is_analyzed());

        lib.delete(&record.id).await.unwrap();
        assert!(matches!(
            lib.get(&record.id).await.unwrap_err(),
            ResumindError::RecordNotFound { .. }
        ));
        assert!(lib.blobs.read(&pdf.path).await.is_err());
        assert!(lib.blobs.read(&png.path).await.is_err());
    }

    #[tokio::test]
    async fn delete_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());
        lib.kv.set("resume:broken", "not json").await.unwrap();

        assert!(lib.delete("broken").await.unwrap().is_none());
        assert!(lib.kv.get("resume:broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_partial_record_removes_readable_files() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());
        let pdf = lib.blobs.upload("cv.pdf", b"%PDF-1.7").await.unwrap();
        let partial = serde_json::json!({ "id": "half", "resumePath": pdf.path }).to_string();
        lib.kv.set("resume:half", &partial).await.unwrap();

        assert!(lib.delete("half").await.unwrap().is_none());
        assert!(lib.kv.get("resume:half").await.unwrap().is_none());
        assert!(lib.blobs.read(&pdf.path).await.is_err());
    }

    #[tokio::test]
    async fn delete_survives_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());
        let record = ResumeRecord::new("files/gone.pdf", "files/gone.png", &job("Dev"));
        lib.save(&record).await.unwrap();

        let deleted = lib.delete(&record.id).await.unwrap().unwrap();
        assert_eq!(deleted.job_title, "Dev");
        assert!(lib.kv.get(&record.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ResumeLibrary::open(dir.path());
        assert!(matches!(
            lib.delete("nope").await.unwrap_err(),
            ResumindError::RecordNotFound { .. }
        ));
    }
}
