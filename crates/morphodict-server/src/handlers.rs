use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use morphodict_types::Disambiguators;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::engine::SearchEngine;
use crate::ranker::SearchResult;

pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub max_page_size: usize,
    pub disable_cache: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    query: String,
    page: usize,
    page_size: usize,
    total: usize,
    has_more: bool,
    results: Vec<ResultView>,
}

#[derive(Serialize)]
struct ResultView {
    matched_text: String,
    matched_by: &'static str,
    is_head: bool,
    lemma: LemmaView,
    breakdown: BreakdownView,
    definitions: Vec<DefinitionView>,
}

#[derive(Serialize)]
struct LemmaView {
    id: u32,
    text: String,
    pos: String,
    lexical_category: String,
}

#[derive(Serialize)]
struct BreakdownView {
    head: Vec<String>,
    tail: Vec<String>,
}

#[derive(Serialize)]
struct DefinitionView {
    text: String,
    sources: Vec<String>,
}

impl From<SearchResult> for ResultView {
    fn from(result: SearchResult) -> Self {
        Self {
            matched_text: result.matched_text,
            matched_by: result.matched_by.as_str(),
            is_head: result.is_head,
            lemma: LemmaView {
                id: result.lemma.id.0,
                text: result.lemma.text,
                pos: result.lemma.pos,
                lexical_category: result.lemma.category,
            },
            breakdown: BreakdownView {
                head: result.breakdown.head,
                tail: result.breakdown.tail,
            },
            definitions: result
                .definitions
                .into_iter()
                .map(|d| DefinitionView {
                    text: d.text,
                    sources: d.sources,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/search", get(search))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn search(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = params.remove("q").unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("q is required"));
    }

    let page = parse_number(params.remove("page"), "page")?.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request("page must be >= 1"));
    }
    let mut page_size = parse_number(params.remove("page_size"), "page_size")?
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err(ApiError::bad_request("page_size must be >= 1"));
    }
    if page_size > state.max_page_size {
        page_size = state.max_page_size;
    }

    let filter =
        Disambiguators::from_pairs(&params).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let results = state.engine.search(&query, &filter).map_err(|e| {
        error!("search for {query:?} failed: {e}");
        ApiError::Internal
    })?;

    let total = results.len();
    let offset = page.saturating_sub(1).saturating_mul(page_size);
    let items: Vec<ResultView> = results
        .into_iter()
        .skip(offset)
        .take(page_size)
        .map(ResultView::from)
        .collect();
    let has_more = offset + items.len() < total;

    let response = SearchResponse {
        query,
        page,
        page_size,
        total,
        has_more,
        results: items,
    };

    if state.disable_cache {
        Ok(Json(response).into_response())
    } else {
        Ok((
            [(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=300"),
            )],
            Json(response),
        )
            .into_response())
    }
}

fn parse_number(raw: Option<String>, name: &str) -> Result<Option<usize>, ApiError> {
    raw.map(|v| {
        v.trim()
            .parse::<usize>()
            .map_err(|_| ApiError::bad_request(format!("{name} must be a positive integer")))
    })
    .transpose()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
