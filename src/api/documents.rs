use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::pages;
use crate::models::Category;
use crate::search::links::{download_link, resolve_category};
use crate::state::AppState;
use crate::utils::{secure_filename, strip_pdf_ext};

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, message).into_response()
}

/// Path segments may carry encoded separators; only plain names are served / 仅接受普通文件名
fn plain_name(filename: &str) -> Option<&str> {
    (!filename.is_empty() && secure_filename(filename) == filename).then_some(filename)
}

/// GET /index_page - 已索引文档列表
pub async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    match state.index.list_documents().await {
        Ok(docs) => Html(pages::index_listing_page(&docs)).into_response(),
        Err(e) => {
            tracing::error!("Failed to list documents: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::message_page("Index Page", "Failed to load the document index.")),
            )
                .into_response()
        }
    }
}

/// GET /view_image/:category/:filename/:page - 页面图片
pub async fn view_image(
    State(state): State<Arc<AppState>>,
    Path((category, filename, page)): Path<(String, String, u32)>,
) -> Response {
    let category: Category = match resolve_category(&category) {
        Ok(c) => c,
        Err(message) => return not_found(message),
    };
    let stem = strip_pdf_ext(&filename);
    let image_path = state.config.get_page_image_path(category, &stem, page);

    let bytes = match plain_name(&stem) {
        Some(_) => tokio::fs::read(&image_path).await.ok(),
        None => None,
    };
    match bytes {
        Some(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        None => not_found(format!("Image not found at path: {}", image_path.display())),
    }
}

/// GET /download/:category/:filename - 内联base64下载链接
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((category, filename)): Path<(String, String)>,
) -> Response {
    let Some(filename) = plain_name(&filename) else {
        return not_found(format!("File not found: {}", filename));
    };
    let config = state.config.clone();
    let name = filename.to_string();
    // Base64 of a large PDF is CPU work
    let link = tokio::task::spawn_blocking(move || download_link(&config, &category, &name)).await;
    match link {
        Ok(link) => Html(pages::download_page(&link.to_html())).into_response(),
        Err(e) => {
            tracing::error!("Download task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /files/:category/:filename - 原文件流式下载
pub async fn stream_file(
    State(state): State<Arc<AppState>>,
    Path((category, filename)): Path<(String, String)>,
) -> Response {
    let category = match resolve_category(&category) {
        Ok(c) => c,
        Err(message) => return not_found(message),
    };
    let path = state.config.get_category_dir(category).join(&filename);
    let file = match plain_name(&filename) {
        Some(_) => tokio::fs::File::open(&path).await.ok(),
        None => None,
    };
    let Some(file) = file else {
        return not_found(format!("File not found: {}", path.display()));
    };

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
    let filename_encoded = urlencoding::encode(&filename);
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", filename, filename_encoded),
        );
    if let Ok(meta) = file.metadata().await {
        response = response.header(header::CONTENT_LENGTH, meta.len());
    }

    let body = Body::from_stream(ReaderStream::new(file));
    response
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
