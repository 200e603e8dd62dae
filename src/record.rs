//! The persisted resume record.
//!
//! One record per upload, stored as JSON text under `resume:<id>`. It is
//! written once before analysis (no feedback yet) and once after.

use crate::error::ResumindError;
use crate::feedback::Feedback;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Key-value namespace shared by every record.
pub const KEY_PREFIX: &str = "resume:";

/// Glob matching every record key.
pub const KEY_PATTERN: &str = "resume:*";

/// Key under which the record `id` is stored.
pub fn record_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// A stored resume and, once analysed, its feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    /// `None` until the model has replied. Older records store `""` here.
    #[serde(default, deserialize_with = "feedback_or_empty")]
    pub feedback: Option<Feedback>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Job details entered alongside the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

impl ResumeRecord {
    /// New record with a fresh UUID and no feedback.
    pub fn new(resume_path: impl Into<String>, image_path: impl Into<String>, job: &JobDetails) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            resume_path: resume_path.into(),
            image_path: image_path.into(),
            company_name: job.company_name.clone(),
            job_title: job.job_title.clone(),
            job_description: job.job_description.clone(),
            feedback: None,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> String {
        record_key(&self.id)
    }

    pub fn is_analyzed(&self) -> bool {
        self.feedback.is_some()
    }

    pub fn to_json(&self) -> Result<String, ResumindError> {
        serde_json::to_string(self).map_err(|e| ResumindError::Internal(format!("record encode: {e}")))
    }

    pub fn from_json(key: &str, json: &str) -> Result<Self, ResumindError> {
        serde_json::from_str(json).map_err(|e| ResumindError::CorruptRecord {
            key: key.to_string(),
            detail: e.to_string(),
        })
    }
}

fn feedback_or_empty<'de, D>(deserializer: D) -> Result<Option<Feedback>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobDetails {
        JobDetails {
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_description: "Rust, Postgres".into(),
        }
    }

    #[test]
    fn new_record_has_uuid_and_no_feedback() {
        let r = ResumeRecord::new("files/a.pdf", "files/a.png", &job());
        assert!(Uuid::parse_str(&r.id).is_ok());
        assert_eq!(r.key(), format!("resume:{}", r.id));
        assert!(!r.is_analyzed());
    }

    #[test]
    fn json_uses_camel_case() {
        let r = ResumeRecord::new("files/a.pdf", "files/a.png", &job());
        let v: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(v["resumePath"], "files/a.pdf");
        assert_eq!(v["companyName"], "Acme");
        assert!(v["feedback"].is_null());
    }

    #[test]
    fn accepts_empty_string_feedback() {
        let json = r#"{"id":"1","resumePath":"a.pdf","imagePath":"a.png",
            "companyName":"","jobTitle":"","jobDescription":"","feedback":""}"#;
        let r = ResumeRecord::from_json("resume:1", json).unwrap();
        assert!(r.feedback.is_none());
    }

    #[test]
    fn corrupt_record_reports_key() {
        let err = ResumeRecord::from_json("resume:9", "{not json").unwrap_err();
        match err {
            ResumindError::CorruptRecord { key, .. } => assert_eq!(key, "resume:9"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
