//! Converter stages.
//!
//! ```text
//! PDF bytes ──▶ render ──▶ encode
//!              (pdfium)   (PNG / base64)
//! ```
//!
//! 1. [`render`] — rasterise the leading pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`encode`] — PNG bytes for the stored preview, base64 `ImageData` for
//!    the model request

pub mod encode;
pub mod render;
