//! PDF page rendering and text extraction via pdfium / PDF渲染与文本提取
//!
//! pdfium is not safe to drive from async worker threads; callers run
//! [`PageRenderer::render`] inside `spawn_blocking`.

use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::IngestConfig;
use crate::error::IndexError;
use crate::models::PageText;

/// Turns one PDF into `<out_dir>/<page>.png` images plus per-page text / 页面渲染接口
pub trait PageRenderer: Send + Sync {
    /// Pages are numbered from 1 in the returned list and in image names.
    fn render(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PageText>, IndexError>;
}

/// pdfium-backed renderer / 基于pdfium的渲染器
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    library_dir: Option<PathBuf>,
    max_pixels: u32,
}

impl PdfiumRenderer {
    pub fn new(library_dir: Option<PathBuf>, max_pixels: u32) -> Self {
        Self { library_dir, max_pixels }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.pdfium_dir.as_ref().map(PathBuf::from), config.max_rendered_pixels)
    }

    /// Bind the configured directory, then the working directory, then the system library.
    fn bind(&self) -> Result<Pdfium, IndexError> {
        let mut candidates = Vec::new();
        if let Some(dir) = &self.library_dir {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(&*dir.to_string_lossy()));
        }
        candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

        for candidate in candidates {
            match Pdfium::bind_to_library(candidate) {
                Ok(bindings) => return Ok(Pdfium::new(bindings)),
                Err(e) => tracing::debug!("pdfium not found at candidate path: {:?}", e),
            }
        }

        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| IndexError::Pdf(format!("Failed to load the pdfium library: {:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PageText>, IndexError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf, None)
            .map_err(|e| IndexError::Pdf(format!("{}: {:?}", pdf.display(), e)))?;

        std::fs::create_dir_all(out_dir)?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let pages = document.pages();
        tracing::info!("Rendering {} pages of {:?}", pages.len(), pdf);

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let number = idx as u32 + 1;

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| IndexError::Render { page: number, detail: format!("{:?}", e) })?;
            bitmap
                .as_image()
                .save_with_format(out_dir.join(format!("{}.png", number)), ImageFormat::Png)
                .map_err(|e| IndexError::Render { page: number, detail: e.to_string() })?;

            let text = match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    tracing::warn!("No text layer on page {} of {:?}: {:?}", number, pdf, e);
                    String::new()
                }
            };
            texts.push(PageText { page_number: number, text });
        }

        Ok(texts)
    }
}
