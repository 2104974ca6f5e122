pub mod audit;
pub mod documents;
pub mod pages;
pub mod search;
pub mod server;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Largest accepted upload (PDFs and workbooks) / 最大上传大小
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            code: 400,
            message: message.to_string(),
            data: None,
        }
    }
}

/// All routes of the service / 构建全部路由
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.storage.static_dir.clone();

    Router::new()
        .route("/", get(search::home))
        .route("/search", get(search::search_page))
        .route("/api/search", post(search::api_search))
        .route("/index_page", get(documents::index_page))
        .route("/upload", post(upload::upload_document))
        .route("/view_image/:category/:filename/:page", get(documents::view_image))
        .route("/download/:category/:filename", get(documents::download))
        .route("/files/:category/:filename", get(documents::stream_file))
        .route("/api/audit/filter", post(audit::filter_transactions))
        .route("/api/audit/export", post(audit::export_transactions))
        .route("/api/audit/summary", post(audit::summarize_transactions))
        .route("/api/health", get(server::health_check))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
