//! Error types for the resumind library.
//!
//! Two error types reflect two distinct failure modes:
//!
//! * [`ResumindError`] — a single operation failed (bad input file, provider
//!   not configured, storage write refused, malformed model reply). Returned
//!   by uploader, converter, storage, model and library calls.
//!
//! * [`AnalysisFailure`] — the upload-and-analyze workflow stopped at a
//!   specific [`Stage`]. It wraps the underlying [`ResumindError`] and knows
//!   the human-readable status line to show the user for that stage.
//!
//! Artifacts stored before the failing stage are not rolled back, so callers
//! that care about orphans can inspect `AnalysisFailure::stage`.

use crate::analyze::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the resumind library.
#[derive(Debug, Error)]
pub enum ResumindError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Only `.pdf` files are accepted.
    #[error("'{name}' is not a PDF file (expected a .pdf extension)")]
    UnsupportedFileType { name: String },

    /// The file carries a `.pdf` name but its content is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// Zero-byte upload.
    #[error("'{name}' is empty")]
    EmptyFile { name: String },

    /// Upload exceeds `max_upload_bytes`.
    #[error("'{name}' is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// The document has no pages to render.
    #[error("PDF '{name}' has no pages")]
    NoPages { name: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH (or --pdfium-lib) to a directory or file containing libpdfium,\n\
or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { message: String, retries: u32 },

    /// The LLM call did not finish within `api_timeout_secs`.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The model reply contained no text.
    #[error("LLM returned an empty reply")]
    EmptyReply,

    // ── Feedback errors ───────────────────────────────────────────────────
    /// The reply is not JSON of the expected feedback shape.
    #[error("Feedback is not valid JSON: {detail}")]
    MalformedFeedback { detail: String },

    /// The reply parsed but violates a feedback invariant.
    #[error("Feedback rejected: {detail}")]
    InvalidFeedback { detail: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// A blob or key-value operation hit the file system and failed.
    #[error("Storage {op} failed for '{target}': {source}")]
    Storage {
        op: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// A blob path escapes the store root or is otherwise unusable.
    #[error("Invalid storage path '{0}'")]
    InvalidStoragePath(String),

    /// No record is stored under the requested id.
    #[error("No resume with id '{id}'")]
    RecordNotFound { id: String },

    /// A stored value could not be decoded.
    #[error("Stored record '{key}' is unreadable: {detail}")]
    CorruptRecord { key: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The workflow stopped at `stage`.
///
/// [`AnalysisFailure::status_text`] gives the line shown to the user, e.g.
/// `"Error: Failed to upload file"`.
#[derive(Debug, Error)]
#[error("{} ({source})", stage.failure_text())]
pub struct AnalysisFailure {
    pub stage: Stage,
    #[source]
    pub source: ResumindError,
}

impl AnalysisFailure {
    pub fn new(stage: Stage, source: ResumindError) -> Self {
        Self { stage, source }
    }

    /// User-facing status line for the failed stage.
    pub fn status_text(&self) -> &'static str {
        self.stage.failure_text()
    }
}
