//! Error types for both halves of the service / 错误类型

use thiserror::Error;

use crate::models::Category;

/// Errors raised while loading, normalizing or filtering transactions / 审计错误
#[derive(Debug, Error)]
pub enum AuditError {
    /// Column-pair equality needs at least two columns / 列对比较至少需要两列
    #[error("Please select another column to verify authorization parameters (selected {selected})")]
    InsufficientCriteria { selected: usize },

    #[error("No filter criteria selected")]
    EmptySelection,

    #[error("Unsupported workbook type: {0}")]
    UnsupportedWorkbook(String),

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the document index and ingestion / 文档索引错误
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("File {filename} is already present in {category} table.")]
    AlreadyIndexed { filename: String, category: Category },

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Failed to render page {page}: {detail}")]
    Render { page: u32, detail: String },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}
