//! # resumind
//!
//! Upload a resume PDF, have a vision model review it against a job
//! description, and keep the scored feedback.
//!
//! ## Workflow
//!
//! ```text
//! PDF (path / URL / bytes)
//!  │
//!  ├─ 1. Upload    validate (.pdf, %PDF, ≤ 20 MiB) and store the file
//!  ├─ 2. Convert   render the first page(s) via pdfium (spawn_blocking)
//!  ├─ 3. Upload    store the first-page PNG preview
//!  ├─ 4. Prepare   save the record, feedback still empty
//!  ├─ 5. Analyze   one multimodal call: instructions + page images
//!  ├─ 6. Parse     JSON feedback, scores checked to be 0–100
//!  └─ 7. Save      record updated with the feedback
//! ```
//!
//! Each step reports a status line through [`AnalysisProgressCallback`]. The
//! first failing step ends the run with an [`AnalysisFailure`] naming the
//! stage; earlier steps are not undone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumind::{analyze_resume, AnalysisConfig, JobDetails};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / RESUMIND_PROVIDER + RESUMIND_MODEL
//!     let config = AnalysisConfig::default();
//!     let job = JobDetails {
//!         company_name: "Acme".into(),
//!         job_title: "Backend Engineer".into(),
//!         job_description: "Rust, PostgreSQL, Kubernetes".into(),
//!     };
//!     let outcome = analyze_resume("cv.pdf", job, &config).await?;
//!     println!("{}", resumind::report::render_report(&outcome.record, Default::default()));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resumind` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod feedback;
pub mod library;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod report;
pub mod storage;
pub mod theme;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{AnalysisOutcome, AnalysisStats, Analyzer, Stage, COMPLETE_STATUS};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{AnalysisFailure, ResumindError};
pub use feedback::{parse_feedback, Category, Feedback, Tip, TipKind};
pub use library::{LoadedResume, ResumeLibrary};
pub use model::{FeedbackModel, LlmFeedbackModel, ModelReply};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderedResume};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{JobDetails, ResumeRecord};
pub use upload::{format_size, resolve_upload, ResumeFile};

/// Resolve `input` (path or URL) and run the full workflow with the
/// filesystem stores, pdfium and the configured provider.
///
/// The provider is resolved first. If that fails, the run stops with a
/// [`Stage::Configure`] failure before any status is announced. Input errors
/// follow the "Uploading the file..." status as [`Stage::UploadFile`] failures.
pub async fn analyze_resume(
    input: &str,
    job: JobDetails,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalysisFailure> {
    let analyzer = Analyzer::from_config(config.clone())
        .map_err(|e| configuration_failure(config, e))?;
    analyzer.analyze_input(input, job).await
}

fn configuration_failure(config: &AnalysisConfig, source: ResumindError) -> AnalysisFailure {
    let stage = Stage::Configure;
    tracing::warn!("{}: {}", stage.failure_text(), source);
    if let Some(ref cb) = config.progress_callback {
        cb.on_failure(stage, stage.failure_text());
    }
    AnalysisFailure::new(stage, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl AnalysisProgressCallback for Events {
        fn on_status(&self, _stage: Stage, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }

        fn on_failure(&self, _stage: Stage, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    fn job() -> JobDetails {
        JobDetails {
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_description: "Rust".into(),
        }
    }

    #[tokio::test]
    async fn missing_input_fails_after_upload_status() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(Events::default());
        let config = AnalysisConfig::builder()
            .storage_dir(dir.path())
            .provider_name("mock")
            .progress_callback(events.clone())
            .build()
            .unwrap();

        let missing = dir.path().join("nowhere.pdf");
        let failure = analyze_resume(&missing.to_string_lossy(), job(), &config)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::UploadFile);
        assert!(matches!(failure.source, ResumindError::FileNotFound { .. }));
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["Uploading the file...", "Error: Failed to upload file"]
        );
    }

    #[tokio::test]
    async fn unknown_provider_fails_before_any_status() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(Events::default());
        let config = AnalysisConfig::builder()
            .storage_dir(dir.path())
            .provider_name("no-such-provider")
            .progress_callback(events.clone())
            .build()
            .unwrap();

        let failure = analyze_resume("cv.pdf", job(), &config).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Configure);
        assert!(matches!(
            failure.source,
            ResumindError::ProviderNotConfigured { .. }
        ));
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["Error: Model provider is not configured"]
        );
    }
}
