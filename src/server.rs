use axum::{
    extract::{rejection::FormRejection, Request, State},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::auth_middleware;
use crate::cleanup::sweep_artifacts;
use crate::config::ServerConfig;
use crate::error::{Result, TtsError};
use crate::keystore::{fingerprint, KeyStore};
use crate::logging::{access_log_middleware, request_id_middleware, AccessLogSettings};
use crate::models::{ApiKeyResponse, CleanupResponse, HealthResponse, TtsRequest, VoicesResponse};
use crate::rate_limit::{rate_limit_middleware, PerIpRateLimiter};
use crate::synthesis::EspeakEngine;

const AUDIO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub key_store: KeyStore,
    pub engine: Arc<EspeakEngine>,
    pub config: Arc<ServerConfig>,
    pub key_limiter: Option<PerIpRateLimiter>,
    pub access_log: AccessLogSettings,
}

impl AppState {
    pub fn new(config: ServerConfig, key_store: KeyStore) -> Self {
        let engine = EspeakEngine::from_config(&config);
        let trust_proxy = config.trust_proxy;
        let key_limiter = config
            .key_rate_limit
            .clone()
            .map(|limit| PerIpRateLimiter::new(limit, trust_proxy));

        Self {
            key_store,
            engine: Arc::new(engine),
            config: Arc::new(config),
            key_limiter,
            access_log: AccessLogSettings {
                trust_proxy,
                ..AccessLogSettings::default()
            },
        }
    }

    pub fn with_access_log(mut self, settings: AccessLogSettings) -> Self {
        self.access_log = settings;
        self
    }
}

// HTTP Handlers

/// Serve the landing page
async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let path = state.config.template_dir.join("index.html");

    let page = tokio::fs::read_to_string(&path).await.map_err(|e| {
        TtsError::Template(format!("failed to read {}: {}", path.display(), e))
    })?;

    Ok(Html(page))
}

/// Issue a new API key
async fn generate_key(State(state): State<AppState>) -> Result<Json<ApiKeyResponse>> {
    let api_key = state.key_store.issue_key().await?;

    tracing::info!(key_fingerprint = %fingerprint(&api_key), "Issued API key");

    Ok(Json(ApiKeyResponse { api_key }))
}

/// Generate TTS audio from form fields
async fn generate_tts(
    State(state): State<AppState>,
    form: std::result::Result<Form<TtsRequest>, FormRejection>,
) -> Result<Response> {
    let Form(req) = form.map_err(|rejection| TtsError::InvalidRequest(rejection.body_text()))?;

    // Validation happens before the engine is touched
    let params = req.into_params()?;

    tracing::debug!(
        text_len = params.text.chars().count(),
        lang = %params.lang,
        speed = params.speed,
        pitch = params.pitch,
        volume = params.volume,
        variant = ?params.voice_variant,
        "TTS request"
    );

    let audio = state.engine.synthesize(&params).await?;
    let size = audio.size;
    let body = audio.into_body().await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/wav")),
            (header::CACHE_CONTROL, HeaderValue::from_static(AUDIO_CACHE_CONTROL)),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
        ],
        body,
    )
        .into_response())
}

/// Remove stale artifacts from the scratch directory
async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupResponse>> {
    let report =
        sweep_artifacts(state.engine.scratch_dir(), Some(state.config.cleanup_min_age)).await?;

    Ok(Json(CleanupResponse {
        status: "success".to_string(),
        removed: report.removed,
    }))
}

/// List the voices installed in the engine
async fn list_voices(State(state): State<AppState>) -> Result<Json<VoicesResponse>> {
    let voices = state.engine.list_available_voices().await?;
    Ok(Json(VoicesResponse { voices }))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Bound the time until a response is ready
///
/// Expiry drops the handler future, which kills a running engine child and
/// removes its artifact.
async fn timeout_middleware(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_secs = limit.as_secs(), "Request timed out");
            TtsError::Timeout(limit).into_response()
        }
    }
}

/// Routes shared by the root and the `/api` prefix
fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/tts", post(generate_tts))
        .route("/cleanup", post(cleanup))
        .route_layer(middleware::from_fn_with_state(
            state.key_store.clone(),
            auth_middleware,
        ));

    let mut keys = Router::new()
        .route("/keys", post(generate_key))
        .route("/keys/generate", post(generate_key));

    if let Some(limiter) = state.key_limiter.clone() {
        keys = keys.route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    Router::new()
        .merge(protected)
        .merge(keys)
        .route("/voices", get(list_voices))
        .route("/health", get(health_check))
}

/// Create and configure the HTTP server router
pub fn create_router(state: AppState) -> Router<()> {
    // Configure CORS to allow all origins (adjust as needed for production)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = api_routes(&state);

    Router::new()
        .route("/", get(index))
        .merge(api.clone())
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.config.request_timeout,
            timeout_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.access_log.clone(),
            access_log_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}
