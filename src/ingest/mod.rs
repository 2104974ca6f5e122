//! Upload ingestion: store the PDF, render its pages, index the text / 文档导入
//!
//! Order of work:
//! 1. sanitize the filename and reject non-PDF uploads
//! 2. reject files already indexed in the category, before touching disk
//! 3. save the original under `<documents_dir>/<Category>/`
//! 4. render pages to `<images_dir>/<Category>/<stem>/<page>.png` and extract text
//! 5. insert all pages in one transaction
//!
//! A failure in 4 or 5 removes the saved file and images again. Steps 2 to 5
//! hold a lock keyed by (category, filename), so a second upload of the same
//! name waits and is then rejected by the check in 2 without touching disk.

pub mod render;

pub use render::{PageRenderer, PdfiumRenderer};

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::AppConfig;
use crate::error::IndexError;
use crate::models::Category;
use crate::search::DocIndex;
use crate::utils::{get_ext, secure_filename, strip_pdf_ext};

/// Result of a successful upload / 导入结果
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub filename: String,
    pub category: Category,
    pub pages: usize,
}

impl IngestOutcome {
    pub fn message(&self) -> String {
        format!(
            "Inserted text from {} in category {} into database.",
            self.filename, self.category
        )
    }
}

type UploadKey = (Category, String);

/// In-flight uploads, one async lock per (category, filename) / 上传互斥锁
#[derive(Clone, Default)]
struct UploadLocks {
    inner: Arc<Mutex<HashMap<UploadKey, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UploadLocks {
    fn get(&self, key: UploadKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries only the map still holds belong to finished uploads
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(key).or_default().clone()
    }
}

/// Ingestion pipeline bound to one index and storage layout / 导入流水线
#[derive(Clone)]
pub struct Ingestor {
    index: DocIndex,
    config: Arc<AppConfig>,
    renderer: Arc<dyn PageRenderer>,
    uploads: UploadLocks,
}

impl Ingestor {
    pub fn new(index: DocIndex, config: Arc<AppConfig>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { index, config, renderer, uploads: UploadLocks::default() }
    }

    /// Ingest one uploaded file / 导入一个上传文件
    pub async fn ingest(
        &self,
        category: Category,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestOutcome, IndexError> {
        let filename = secure_filename(original_name);
        if filename.is_empty() || get_ext(&filename) != "pdf" {
            return Err(IndexError::UnsupportedFile(original_name.to_string()));
        }

        let lock = self.uploads.get((category, filename.clone()));
        let _upload = lock.lock().await;

        if self.index.is_indexed(category, &filename).await? {
            tracing::info!("Rejected upload of {}: already indexed in {}", filename, category);
            return Err(IndexError::AlreadyIndexed { filename, category });
        }

        let folder = self.config.get_category_dir(category);
        tokio::fs::create_dir_all(&folder).await?;
        let pdf_path = folder.join(&filename);
        tokio::fs::write(&pdf_path, &bytes).await?;

        let image_dir = self.config.get_page_image_dir(category, &strip_pdf_ext(&filename));

        let renderer = self.renderer.clone();
        let (pdf, out) = (pdf_path.clone(), image_dir.clone());
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&pdf, &out))
            .await
            .map_err(|e| IndexError::Task(format!("Render task panicked: {}", e)))
            .and_then(|r| r);

        let pages = match rendered {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!("Rendering {} failed: {}", filename, e);
                discard(&pdf_path, &image_dir).await;
                return Err(e);
            }
        };

        match self.index.insert_document(category, &filename, &pages).await {
            Ok(count) => {
                tracing::info!("Upload accepted: {} ({} pages) into {}", filename, count, category);
                Ok(IngestOutcome { filename, category, pages: count })
            }
            // Indexed by another process between the check and the insert; its files are on disk
            Err(e @ IndexError::AlreadyIndexed { .. }) => Err(e),
            Err(e) => {
                discard(&pdf_path, &image_dir).await;
                Err(e)
            }
        }
    }
}

/// Remove the saved original and any rendered pages / 清理已写入的文件
async fn discard(pdf_path: &Path, image_dir: &Path) {
    if let Err(e) = tokio::fs::remove_file(pdf_path).await {
        tracing::warn!("Failed to remove {:?}: {}", pdf_path, e);
    }
    if image_dir.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(image_dir).await {
            tracing::warn!("Failed to remove {:?}: {}", image_dir, e);
        }
    }
}
