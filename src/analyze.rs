//! The upload-and-analyze workflow.
//!
//! ```text
//! upload PDF ─▶ render ─▶ upload preview ─▶ save record ─▶ model ─▶ parse ─▶ save feedback
//! ```
//!
//! Steps run strictly in order. The first failure stops the run and is
//! returned as an [`AnalysisFailure`] carrying the stage it happened in.
//! Nothing is rolled back: blobs and the pre-analysis record written before
//! the failure stay in the store and are logged as orphans.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisFailure, ResumindError};
use crate::feedback::parse_feedback;
use crate::model::{FeedbackModel, LlmFeedbackModel};
use crate::pipeline::encode::{encode_png, png_to_image_data};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::prompts::prepare_instructions;
use crate::record::{JobDetails, ResumeRecord};
use crate::storage::{BlobStore, FsBlobStore, FsKvStore, KvStore};
use crate::upload::{resolve_upload, ResumeFile};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Status shown once the feedback has been saved.
pub const COMPLETE_STATUS: &str = "Analysis complete, redirecting...";

/// A step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving the model provider. Runs before any status is announced, so
    /// a failure here is the only event a callback sees.
    Configure,
    UploadFile,
    ConvertImage,
    UploadImage,
    PrepareData,
    Analyze,
    ParseFeedback,
    SaveFeedback,
}

impl Stage {
    /// Status line while this stage runs. Parsing and saving the feedback
    /// happen under the "Analyzing..." status.
    pub fn status_text(self) -> &'static str {
        match self {
            Stage::Configure => "Preparing the analysis...",
            Stage::UploadFile => "Uploading the file...",
            Stage::ConvertImage => "Converting to image...",
            Stage::UploadImage => "Uploading the image...",
            Stage::PrepareData => "Preparing data...",
            Stage::Analyze | Stage::ParseFeedback | Stage::SaveFeedback => "Analyzing...",
        }
    }

    /// Status line when this stage fails.
    pub fn failure_text(self) -> &'static str {
        match self {
            Stage::Configure => "Error: Model provider is not configured",
            Stage::UploadFile => "Error: Failed to upload file",
            Stage::ConvertImage => "Error: Failed to convert PDF to image",
            Stage::UploadImage => "Error: Failed to upload image",
            Stage::PrepareData => "Error: Failed to save resume data",
            Stage::Analyze => "Error: Failed to analyze resume",
            Stage::ParseFeedback => "Error: Failed to parse feedback",
            Stage::SaveFeedback => "Error: Failed to save feedback",
        }
    }

    /// Whether entering this stage changes the visible status.
    fn announces(self) -> bool {
        !matches!(
            self,
            Stage::Configure | Stage::ParseFeedback | Stage::SaveFeedback
        )
    }
}

/// Numbers gathered during one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    /// Pages in the uploaded PDF.
    pub page_count: usize,
    /// Pages sent to the model.
    pub pages_analyzed: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
    pub render_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The saved record, feedback included.
    pub record: ResumeRecord,
    pub stats: AnalysisStats,
}

/// Runs the workflow against a set of stores, a renderer and a model.
pub struct Analyzer {
    blobs: Arc<dyn BlobStore>,
    kv: Arc<dyn KvStore>,
    renderer: Arc<dyn PageRenderer>,
    model: Arc<dyn FeedbackModel>,
    config: AnalysisConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        kv: Arc<dyn KvStore>,
        renderer: Arc<dyn PageRenderer>,
        model: Arc<dyn FeedbackModel>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            blobs,
            kv,
            renderer,
            model,
            config,
        }
    }

    /// Filesystem stores under `config.storage_dir`, pdfium rendering and the
    /// provider resolved from `config`.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, ResumindError> {
        let model = LlmFeedbackModel::from_config(&config)?;
        let renderer = PdfiumRenderer::new(
            config.pdfium_lib_path.clone(),
            config.max_rendered_pixels,
            config.password.clone(),
        );
        Ok(Self::new(
            Arc::new(FsBlobStore::new(&config.storage_dir)),
            Arc::new(FsKvStore::new(&config.storage_dir)),
            Arc::new(renderer),
            Arc::new(model),
            config,
        ))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Store `file`, analyse it against `job` and save the feedback.
    pub async fn analyze(
        &self,
        file: ResumeFile,
        job: JobDetails,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        let total_start = Instant::now();
        self.enter(Stage::UploadFile);
        self.run(file, job, total_start).await
    }

    /// Like [`Analyzer::analyze`], reading the resume from a path or URL
    /// first. Reading happens under the "Uploading the file..." status and
    /// its errors are [`Stage::UploadFile`] failures.
    pub async fn analyze_input(
        &self,
        input: &str,
        job: JobDetails,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        let total_start = Instant::now();
        self.enter(Stage::UploadFile);
        let file = resolve_upload(
            input,
            self.config.max_upload_bytes,
            self.config.download_timeout_secs,
        )
        .await
        .map_err(|e| self.fail(Stage::UploadFile, e, &[]))?;
        self.run(file, job, total_start).await
    }

    /// Steps 1 to 7. The caller has already announced [`Stage::UploadFile`].
    async fn run(
        &self,
        file: ResumeFile,
        job: JobDetails,
        total_start: Instant,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        let mut stats = AnalysisStats::default();
        let mut orphans: Vec<String> = Vec::new();

        info!(
            "Analyzing '{}' for {} at {}",
            file.name, job.job_title, job.company_name
        );

        // ── Step 1: Upload the PDF ───────────────────────────────────────────
        let stored_pdf = self
            .blobs
            .upload(&file.name, &file.bytes)
            .await
            .map_err(|e| self.fail(Stage::UploadFile, e, &orphans))?;
        orphans.push(stored_pdf.path.clone());

        // ── Step 2: Render pages ─────────────────────────────────────────────
        self.enter(Stage::ConvertImage);
        let render_start = Instant::now();
        let rendered = self
            .renderer
            .render(&file, self.config.analysis_pages)
            .await
            .map_err(|e| self.fail(Stage::ConvertImage, e, &orphans))?;
        let pngs = rendered
            .pages
            .iter()
            .enumerate()
            .map(|(idx, img)| {
                encode_png(img).map_err(|e| ResumindError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("Image encoding failed: {}", e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.fail(Stage::ConvertImage, e, &orphans))?;
        let Some(preview_png) = pngs.first() else {
            return Err(self.fail(
                Stage::ConvertImage,
                ResumindError::NoPages {
                    name: file.name.clone(),
                },
                &orphans,
            ));
        };
        stats.page_count = rendered.page_count;
        stats.pages_analyzed = pngs.len();
        stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
        debug!(
            "Rendered {} of {} pages in {}ms",
            stats.pages_analyzed, stats.page_count, stats.render_duration_ms
        );

        // ── Step 3: Upload the preview ───────────────────────────────────────
        self.enter(Stage::UploadImage);
        let stored_image = self
            .blobs
            .upload(&file.preview_name(), preview_png)
            .await
            .map_err(|e| self.fail(Stage::UploadImage, e, &orphans))?;
        orphans.push(stored_image.path.clone());

        // ── Step 4: Save the record without feedback ─────────────────────────
        self.enter(Stage::PrepareData);
        let mut record = ResumeRecord::new(&stored_pdf.path, &stored_image.path, &job);
        self.save(&record)
            .await
            .map_err(|e| self.fail(Stage::PrepareData, e, &orphans))?;
        orphans.push(record.key());

        // ── Step 5: Ask the model ────────────────────────────────────────────
        self.enter(Stage::Analyze);
        let instructions = prepare_instructions(&job.job_title, &job.job_description);
        let images = pngs.iter().map(|png| png_to_image_data(png)).collect();
        let reply = self
            .model
            .analyze(&instructions, images)
            .await
            .map_err(|e| self.fail(Stage::Analyze, e, &orphans))?;
        stats.input_tokens = reply.input_tokens;
        stats.output_tokens = reply.output_tokens;
        stats.retries = reply.retries;
        stats.llm_duration_ms = reply.duration_ms;

        // ── Step 6: Parse the feedback ───────────────────────────────────────
        self.enter(Stage::ParseFeedback);
        let feedback = parse_feedback(&reply.content)
            .map_err(|e| self.fail(Stage::ParseFeedback, e, &orphans))?;

        // ── Step 7: Save the feedback ────────────────────────────────────────
        self.enter(Stage::SaveFeedback);
        record.feedback = Some(feedback);
        self.save(&record)
            .await
            .map_err(|e| self.fail(Stage::SaveFeedback, e, &orphans))?;

        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        info!(
            "{} ({}, overall score {}, {}ms)",
            COMPLETE_STATUS,
            record.id,
            record.feedback.as_ref().map_or(0, |f| f.overall_score),
            stats.total_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_complete(&record.id);
        }

        Ok(AnalysisOutcome { record, stats })
    }

    async fn save(&self, record: &ResumeRecord) -> Result<(), ResumindError> {
        self.kv.set(&record.key(), &record.to_json()?).await
    }

    fn enter(&self, stage: Stage) {
        if !stage.announces() {
            debug!("{:?}", stage);
            return;
        }
        info!("{}", stage.status_text());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_status(stage, stage.status_text());
        }
    }

    fn fail(&self, stage: Stage, source: ResumindError, orphans: &[String]) -> AnalysisFailure {
        warn!("{}: {}", stage.failure_text(), source);
        for orphan in orphans {
            warn!("Left in store after failed run: {}", orphan);
        }
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_failure(stage, stage.failure_text());
        }
        AnalysisFailure::new(stage, source)
    }
}
