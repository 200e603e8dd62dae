//! PDF rasterisation: the first page becomes the preview, the first few pages
//! become the images shown to the model.
//!
//! pdfium wraps a C++ library with thread-local state, so rendering runs in
//! `spawn_blocking`. Images are capped by their longest edge rather than DPI
//! because resumes arrive in every page size.

use crate::error::ResumindError;
use crate::upload::ResumeFile;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pages rendered from one resume.
#[derive(Debug, Clone)]
pub struct RenderedResume {
    /// Rendered pages in order; never empty. The first one is the preview.
    pub pages: Vec<DynamicImage>,
    /// Page count of the whole document.
    pub page_count: usize,
}

/// Turns a PDF into page images.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render up to `max_pages` leading pages (at least the first one).
    async fn render(
        &self,
        file: &ResumeFile,
        max_pages: usize,
    ) -> Result<RenderedResume, ResumindError>;
}

/// [`PageRenderer`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    lib_path: Option<PathBuf>,
    max_pixels: u32,
    password: Option<String>,
}

impl PdfiumRenderer {
    pub fn new(lib_path: Option<PathBuf>, max_pixels: u32, password: Option<String>) -> Self {
        Self {
            lib_path,
            max_pixels,
            password,
        }
    }
}

#[async_trait]
impl PageRenderer for PdfiumRenderer {
    async fn render(
        &self,
        file: &ResumeFile,
        max_pages: usize,
    ) -> Result<RenderedResume, ResumindError> {
        let name = file.name.clone();
        let bytes = file.bytes.clone();
        let this = self.clone();

        tokio::task::spawn_blocking(move || {
            let pdfium = bind_pdfium(this.lib_path.as_deref())?;
            render_blocking(
                &pdfium,
                &name,
                &bytes,
                this.password.as_deref(),
                this.max_pixels,
                max_pages.max(1),
            )
        })
        .await
        .map_err(|e| ResumindError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Bind to libpdfium.
///
/// Lookup order: explicit path, `PDFIUM_LIB_PATH`, the working directory,
/// the system library. A directory is searched for the platform library name.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ResumindError> {
    let configured = lib_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let file = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", file.display());
            Pdfium::bind_to_library(&file)
        }
        None => {
            let local = Pdfium::pdfium_platform_library_name_at_path("./");
            Pdfium::bind_to_library(&local).or_else(|_| Pdfium::bind_to_system_library())
        }
    }
    .map_err(|e| ResumindError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn render_blocking(
    pdfium: &Pdfium,
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
    max_pixels: u32,
    max_pages: usize,
) -> Result<RenderedResume, ResumindError> {
    let document = pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ResumindError::WrongPassword {
                    name: name.to_string(),
                }
            } else {
                ResumindError::PasswordRequired {
                    name: name.to_string(),
                }
            }
        } else {
            ResumindError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    if page_count == 0 {
        return Err(ResumindError::NoPages {
            name: name.to_string(),
        });
    }
    info!("PDF '{}' loaded: {} pages", name, page_count);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let wanted = max_pages.min(page_count);
    let mut rendered = Vec::with_capacity(wanted);

    for idx in 0..wanted {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ResumindError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ResumindError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        rendered.push(image);
    }

    Ok(RenderedResume {
        pages: rendered,
        page_count,
    })
}
