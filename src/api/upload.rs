use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::pages;
use crate::error::IndexError;
use crate::models::Category;
use crate::state::AppState;

fn reply(status: StatusCode, message: &str) -> Response {
    (status, Html(pages::message_page("Upload", message))).into_response()
}

/// POST /upload - 上传并索引PDF
pub async fn upload_document(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut category_field: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return reply(StatusCode::BAD_REQUEST, &format!("Malformed upload: {}", e)),
        };
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "category" => match field.text().await {
                Ok(text) => category_field = Some(text),
                Err(e) => return reply(StatusCode::BAD_REQUEST, &format!("Malformed upload: {}", e)),
            },
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(data) => file = Some((filename, data.to_vec())),
                    Err(e) => return reply(StatusCode::BAD_REQUEST, &format!("Malformed upload: {}", e)),
                }
            }
            _ => {}
        }
    }

    let Some((original_name, bytes)) = file else {
        return reply(StatusCode::BAD_REQUEST, "No file part");
    };
    if original_name.trim().is_empty() {
        return reply(StatusCode::BAD_REQUEST, "No selected file");
    }

    // Category defaults to Policies when the form leaves it out
    let category = match category_field.as_deref().map(str::trim) {
        None | Some("") => Category::Policies,
        Some(name) => match name.parse::<Category>() {
            Ok(c) => c,
            Err(name) => return reply(StatusCode::BAD_REQUEST, &IndexError::InvalidCategory(name).to_string()),
        },
    };

    match state.ingestor.ingest(category, &original_name, bytes).await {
        Ok(outcome) => reply(StatusCode::OK, &outcome.message()),
        Err(e @ IndexError::AlreadyIndexed { .. }) => reply(StatusCode::CONFLICT, &e.to_string()),
        Err(e @ IndexError::UnsupportedFile(_)) => {
            tracing::info!("Upload rejected: {}", e);
            reply(StatusCode::BAD_REQUEST, "Only PDF files can be indexed.")
        }
        Err(e) => {
            tracing::error!("Upload of {} failed: {}", original_name, e);
            reply(StatusCode::INTERNAL_SERVER_ERROR, &format!("Failed to index {}: {}", original_name, e))
        }
    }
}
