use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::{HeaderMap, HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use fuzzy_core::tokenizer::normalize;
use fuzzy_core::{default_delta, IndexConfig, IndexStats, QGramIndex, DEFAULT_TOP_K};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct ApiParams {
    #[serde(default)]
    pub query: String,
    /// Error budget; defaults to a quarter of the normalized query length.
    pub delta: Option<i64>,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub normalized: String,
    pub delta: i64,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub ped_computations: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: u32,
    pub name: String,
    pub score: u32,
    pub description: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikidata_id: Option<String>,
    pub ped: usize,
    pub matched_synonym: Option<String>,
}

/// Settings the binary collects from flags and the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalogue: PathBuf,
    pub index: IndexConfig,
    pub static_dir: Option<PathBuf>,
    pub admin_token: Option<String>,
    /// Origins allowed by CORS; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Split a comma-separated `CORS_ALLOW_ORIGIN` value into origins.
    pub fn parse_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self.cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
        CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any)
    }
}

#[derive(Clone)]
pub struct AppState {
    // Swapped wholesale on reload; searches hold their own Arc.
    pub index: Arc<RwLock<Arc<QGramIndex>>>,
    pub catalogue: PathBuf,
    pub config: IndexConfig,
    pub admin_token: Option<String>,
}

impl AppState {
    fn current(&self) -> Arc<QGramIndex> {
        self.index.read().clone()
    }
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    let cors = config.cors_layer();
    // Build the index at startup
    let index = QGramIndex::build_from_file(config.index, &config.catalogue)
        .with_context(|| format!("building index from {}", config.catalogue.display()))?;
    let app_state = AppState {
        index: Arc::new(RwLock::new(Arc::new(index))),
        catalogue: config.catalogue,
        config: config.index,
        admin_token: config.admin_token,
    };

    let mut app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api", get(search_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state);
    if let Some(dir) = config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    Ok(app.layer(cors).layer(TraceLayer::new_for_http()))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<ApiParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let normalized = normalize(&params.query);
    let delta = params.delta.unwrap_or_else(|| default_delta(&normalized) as i64);

    let index = state.current();
    let result = index
        .search(&normalized, delta)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let k = params.k.clamp(1, 100);
    let results = result
        .matches
        .iter()
        .take(k)
        .map(|m| SearchHit {
            id: m.entity.id,
            name: m.entity.name.clone(),
            score: m.entity.score,
            description: m.entity.description.clone(),
            wikipedia_url: m.entity.wikipedia_url.clone(),
            wikidata_id: m.entity.wikidata_id.clone(),
            ped: m.ped,
            matched_synonym: m.matched_synonym.map(str::to_string),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.query,
        normalized,
        delta,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: result.matches.len(),
        ped_computations: result.ped_computations,
        results,
    }))
}

// --- Admin endpoints ---
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<IndexStats>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let (config, path) = (state.config, state.catalogue.clone());
    let rebuilt = tokio::task::spawn_blocking(move || QGramIndex::build_from_file(config, path))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let stats = rebuilt.stats();
    *state.index.write() = Arc::new(rebuilt);
    tracing::info!(entities = stats.entities, qgrams = stats.qgrams, "index reloaded");
    Ok(Json(stats))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
