//! Status callbacks for the upload-and-analyze workflow.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive the
//! same status lines the user sees ("Uploading the file...",
//! "Analyzing...", "Error: Failed to upload image", ...).
//!
//! # Example
//!
//! ```rust
//! use resumind::{AnalysisConfig, AnalysisProgressCallback, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! struct Recorder(Mutex<Vec<String>>);
//!
//! impl AnalysisProgressCallback for Recorder {
//!     fn on_status(&self, _stage: Stage, text: &str) {
//!         self.0.lock().unwrap().push(text.to_string());
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Recorder(Mutex::new(Vec::new()))))
//!     .build()
//!     .unwrap();
//! ```

use crate::analyze::Stage;
use std::sync::Arc;

/// Called by the workflow as it moves from stage to stage.
///
/// All methods default to no-ops so callers only override what they need.
pub trait AnalysisProgressCallback: Send + Sync {
    /// A stage is about to run. `text` is the status line for that stage.
    fn on_status(&self, stage: Stage, text: &str) {
        let _ = (stage, text);
    }

    /// The workflow stopped at `stage`. `text` is the failure status line.
    fn on_failure(&self, stage: Stage, text: &str) {
        let _ = (stage, text);
    }

    /// The record `id` is fully analysed and saved.
    fn on_complete(&self, id: &str) {
        let _ = id;
    }
}

/// A no-op implementation for callers that don't need status events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
