pub mod pipeline;

pub use pipeline::{run_pipeline, Pipeline, PipelineConfig, SearchResult, DEFAULT_TOP_K};

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use sift_core::layout::{CONTENT_FILE, PAGE_FILE};
use sift_core::tokenizer::SegmentMode;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub domains: Vec<String>,
    #[serde(default)]
    pub seeds: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub top_k: usize,
}

pub fn build_app(pipeline: Arc<Pipeline>, top_k: usize) -> Router {
    let app_state = AppState { pipeline, top_k };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub fn build_app_from_config(config: PipelineConfig, top_k: usize) -> Result<Router> {
    Ok(build_app(Arc::new(Pipeline::new(config)?), top_k))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchHit>>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    if req.domains.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "at least one domain is required".into()));
    }
    let results = state
        .pipeline
        .run(&req.seeds, &req.domains, &req.query, state.top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, query = %req.query, "search failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    // Highlight the finer search-mode segments, not just the query as typed.
    let words = state.pipeline.segmenter().segment(&req.query, SegmentMode::Search);
    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|r| SearchHit {
            title: page_title(&r.path.join(PAGE_FILE)).unwrap_or_else(|| r.url.clone()),
            description: snippet_from_file(&r.path.join(CONTENT_FILE), &words).unwrap_or_default(),
            url: r.url,
        })
        .collect();

    tracing::info!(query = %req.query, hits = hits.len(), took_ms = start.elapsed().as_millis() as u64, "search");
    Ok(Json(hits))
}

fn page_title(path: &Path) -> Option<String> {
    let html = std::fs::read_to_string(path).ok()?;
    let doc = Html::parse_document(&html);
    let selector = Selector::parse("title").ok()?;
    let title: String = doc.select(&selector).next()?.text().collect();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn snippet_from_file(path: &Path, terms: &[String]) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    if text.is_empty() { return None; }
    let pattern = terms_pattern(terms);
    let snippet = match pattern.as_ref().and_then(|p| p.find(&text)) {
        Some(m) => {
            let start = floor_boundary(&text, m.start().saturating_sub(100));
            let end = floor_boundary(&text, (m.start() + 200).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    Some(match pattern {
        Some(p) => highlight_terms(&snippet, &p),
        None => snippet,
    })
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Case-insensitive alternation of the terms, longest first.
fn terms_pattern(terms: &[String]) -> Option<regex::Regex> {
    let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() { return None; }
    terms.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    terms.dedup();
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    regex::RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
}

fn highlight_terms(snippet: &str, pattern: &regex::Regex) -> String {
    pattern
        .replace_all(snippet, |caps: &regex::Captures| format!("<span class=\"highlight\">{}</span>", &caps[0]))
        .to_string()
}
