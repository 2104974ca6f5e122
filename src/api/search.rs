use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{pages, ApiResponse};
use crate::error::IndexError;
use crate::models::{CategoryFilter, SearchResultRow};
use crate::search::{annotate, group_results};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keywords: String,
    pub category: Option<String>,
}

/// GET / - 搜索首页
pub async fn home() -> Html<String> {
    Html(pages::home_page())
}

/// GET /search - 搜索结果页
pub async fn search_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let filter = match CategoryFilter::parse(params.category.as_deref()) {
        Ok(f) => f,
        Err(name) => {
            let message = IndexError::InvalidCategory(name).to_string();
            return Html(pages::message_page("Search Results", &message)).into_response();
        }
    };

    let keywords = params.keywords.trim();
    if keywords.is_empty() {
        return Html(pages::message_page("Search Results", "Please enter keywords to search."))
            .into_response();
    }

    match state.index.search(keywords, filter).await {
        Ok(hits) if hits.is_empty() => Html(pages::no_results_page(keywords)).into_response(),
        Ok(hits) => {
            let groups = group_results(annotate(&state.config, hits));
            Html(pages::results_page(&groups)).into_response()
        }
        Err(e) => {
            tracing::error!("Search for {:?} failed: {}", keywords, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::message_page("Search Results", "Search failed, please try again.")),
            )
                .into_response()
        }
    }
}

/// POST /api/search - JSON搜索
pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchParams>,
) -> Json<ApiResponse<Vec<SearchResultRow>>> {
    let filter = match CategoryFilter::parse(req.category.as_deref()) {
        Ok(f) => f,
        Err(name) => return Json(ApiResponse::error(&IndexError::InvalidCategory(name).to_string())),
    };
    let keywords = req.keywords.trim();
    if keywords.is_empty() {
        return Json(ApiResponse::error("keywords is required"));
    }

    match state.index.search(keywords, filter).await {
        Ok(hits) if hits.is_empty() => Json(ApiResponse {
            code: 200,
            message: "No results found".to_string(),
            data: Some(Vec::new()),
        }),
        Ok(hits) => Json(ApiResponse::success(annotate(&state.config, hits))),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}
