//! HTTP API.
//!
//! Wraps the trainer and router in a small JSON API for the chat front end.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/api/scrape` | `{"url": "..."}` | `{"success": true, "urls": [...]}` |
//! | `POST` | `/api/train-local` | `{"dirPath": "..."}` | `{"success": true, "fileCount": n}` |
//! | `POST` | `/api/ask`, `/ask` | `{"question": "..."}` | `{"success": true, "answer": "..."}` |
//! | `GET`  | `/api/websites` | | `{"success": true, "websites": [...]}` |
//! | `GET`  | `/health` | | `{"status": "ok", "version": "..."}` |
//!
//! # Error Contract
//!
//! ```json
//! { "success": false, "error": "URL is required" }
//! ```
//!
//! Missing or malformed bodies are `400`; failures while training are `500`.
//!
//! # Concurrency
//!
//! Scrape and local-training runs hold `train_lock` for their whole
//! duration, so at most one run mutates the store at a time. Questions do
//! not take the lock and may see a partially trained corpus.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::connector_fs::train_local_files;
use crate::crawler::Crawler;
use crate::fetch::Fetcher;
use crate::router::{QueryRouter, APOLOGY};
use crate::site::SiteMatcher;
use crate::store::DocumentStore;
use crate::trainer::Trainer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<DocumentStore>,
    crawler: Arc<Crawler>,
    trainer: Arc<Trainer>,
    router: QueryRouter,
    train_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Build the store, crawler, trainer, and router from `config`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let config = Arc::new(config.clone());
        let store = Arc::new(DocumentStore::with_sites(SiteMatcher::from_config(
            &config.sites.brands,
        )));
        let fetcher = Fetcher::new(&config.crawler)?;
        let crawler = Crawler::from_config(fetcher.clone(), &config.crawler);
        let trainer = Trainer::new(fetcher, &config.training, &config.fallback);
        let router = QueryRouter::from_config(store.clone(), &config);

        Ok(Self {
            config,
            store,
            crawler: Arc::new(crawler),
            trainer: Arc::new(trainer),
            router,
            train_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Scrape `seed` while holding the training lock.
    pub async fn scrape(&self, seed: &str) -> anyhow::Result<Vec<String>> {
        let _guard = self.train_lock.lock().await;
        self.trainer
            .scrape_website(&self.crawler, &self.store, seed)
            .await
    }
}

/// Build the router with all routes and permissive CORS.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/scrape", post(handle_scrape))
        .route("/api/train-local", post(handle_train_local))
        .route("/api/ask", post(handle_ask))
        .route("/ask", post(handle_ask))
        .route("/api/websites", get(handle_websites))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `[server].bind` and run until the process exits.
///
/// When `training.default_website` is set, a background task scrapes it
/// right away; the server accepts requests while that runs.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config)?;

    if let Some(site) = config.training.default_website.clone() {
        let background = state.clone();
        tokio::spawn(async move {
            info!(site = %site, "training on default website");
            match background.scrape(&site).await {
                Ok(urls) => info!(site = %site, urls = urls.len(), "default website trained"),
                Err(e) => warn!(site = %site, error = %e, "default website training failed"),
            }
        });
    }

    let app = build_app(state);
    let bind_addr = config.server.bind.clone();
    println!("SiteChat server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Error that renders as the `{success: false, error}` envelope.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/scrape ============

#[derive(Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: String,
}

#[derive(Serialize)]
struct ScrapeResponse {
    success: bool,
    urls: Vec<String>,
}

async fn handle_scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let Json(request) = payload?;
    let url = request.url.trim();
    if url.is_empty() {
        return Err(bad_request("URL is required"));
    }

    let urls = state.scrape(url).await.map_err(|e| {
        error!(url = %url, error = %e, "scrape failed");
        internal_error(format!("Failed to scrape website: {}", e))
    })?;

    Ok(Json(ScrapeResponse {
        success: true,
        urls,
    }))
}

// ============ POST /api/train-local ============

#[derive(Deserialize)]
struct TrainLocalRequest {
    #[serde(default, rename = "dirPath")]
    dir_path: String,
}

#[derive(Serialize)]
struct TrainLocalResponse {
    success: bool,
    #[serde(rename = "fileCount")]
    file_count: usize,
}

async fn handle_train_local(
    State(state): State<AppState>,
    payload: Result<Json<TrainLocalRequest>, JsonRejection>,
) -> Result<Json<TrainLocalResponse>, AppError> {
    let Json(request) = payload?;
    if request.dir_path.trim().is_empty() {
        return Err(bad_request("Directory path is required"));
    }

    let root = PathBuf::from(request.dir_path.trim());
    let _guard = state.train_lock.lock().await;

    let store = state.store.clone();
    let config = state.config.clone();
    let report = tokio::task::spawn_blocking(move || train_local_files(&store, &root, &config))
        .await
        .map_err(|e| internal_error(format!("Local training task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "local training failed");
            internal_error(format!("Failed to train on local files: {:#}", e))
        })?;

    Ok(Json(TrainLocalResponse {
        success: true,
        file_count: report.files,
    }))
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    success: bool,
    answer: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(request) = payload?;
    if request.question.trim().is_empty() {
        return Err(bad_request("Question is required"));
    }

    let router = state.router.clone();
    let question = request.question;
    let answer = match tokio::spawn(async move { router.ask(&question).await }).await {
        Ok(answer) => answer,
        Err(e) => {
            error!(error = %e, "answer task failed");
            APOLOGY.to_string()
        }
    };

    Ok(Json(AskResponse {
        success: true,
        answer,
    }))
}

// ============ GET /api/websites ============

#[derive(Serialize)]
struct WebsitesResponse {
    success: bool,
    websites: Vec<String>,
}

async fn handle_websites(State(state): State<AppState>) -> Json<WebsitesResponse> {
    Json(WebsitesResponse {
        success: true,
        websites: state.store.get_websites(),
    })
}
