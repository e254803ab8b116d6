//! HTTP server: the translation form plus a small JSON API

use axum::{
    extract::{Form, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::core::errors::TranslationError;
use crate::core::models::{TranslationOutcome, TranslationRequest, MODEL_UNAVAILABLE_MESSAGE};
use crate::core::registry::ModelRegistry;
use crate::core::translator::Translator;
use crate::server::view::{HtmlRenderer, PageRenderer, TranslatePage};

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: Translator,
    renderer: Arc<dyn PageRenderer>,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// State with an injected view
    pub fn new(translator: Translator, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            translator,
            renderer,
            started_at: chrono::Utc::now(),
        }
    }

    /// State with the built-in HTML view
    pub fn with_default_view(registry: Arc<ModelRegistry>) -> Self {
        Self::new(Translator::new(registry), Arc::new(HtmlRenderer::default()))
    }

    fn render(&self, input_text: &str, translated_text: &str, selected: Option<&str>) -> Html<String> {
        let languages = self.translator.languages();
        Html(self.renderer.render(&TranslatePage {
            input_text,
            translated_text,
            languages: &languages,
            selected,
        }))
    }
}

/// Submitted form fields
#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    /// Text to translate
    pub input_text: String,
    /// Language pair key
    pub dest_lang: String,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    languages: usize,
    started_at: chrono::DateTime<chrono::Utc>,
}

/// Language list response
#[derive(Serialize)]
struct LanguagesResponse {
    object: String,
    data: Vec<LanguageInfo>,
}

#[derive(Serialize)]
struct LanguageInfo {
    key: String,
    model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_language: Option<String>,
}

/// JSON translation request
#[derive(Deserialize)]
pub struct TranslateRequest {
    /// Text to translate
    pub text: String,
    /// Language pair key
    pub dest_lang: String,
}

/// JSON translation response
#[derive(Serialize)]
pub struct TranslateResponse {
    /// Text as received
    pub input_text: String,
    /// Language pair key as received
    pub dest_lang: String,
    /// Model output, empty for blank input
    pub translated_text: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorDetail,
}

/// Error body fields
#[derive(Serialize)]
pub struct ErrorDetail {
    /// Human-readable message
    pub message: String,
    /// Machine-readable code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// JSON error with its status code
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, code: &str, kind: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: ErrorDetail {
                    message: message.into(),
                    code: Some(code.to_string()),
                    r#type: Some(kind.to_string()),
                },
            },
        }
    }
}

impl From<TranslationError> for ApiError {
    fn from(err: TranslationError) -> Self {
        match err {
            TranslationError::UnknownLanguagePair { .. } => ApiError::new(
                StatusCode::NOT_FOUND,
                MODEL_UNAVAILABLE_MESSAGE,
                "model_not_available",
                "invalid_request_error",
            ),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                other.to_string(),
                "translation_error",
                "api_error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

/// Generation failure on the form route
struct PageError(TranslationError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Translation failed: {}", self.0),
        )
            .into_response()
    }
}

/// Empty form
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    state.render("", "", None)
}

/// Form submission
async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TranslateForm>,
) -> Result<Html<String>, PageError> {
    let request = TranslationRequest::new(form.input_text, form.dest_lang);

    let outcome = state.translator.resolve(&request).await.map_err(|e| {
        warn!("Translation to {} failed: {}", request.dest_lang, e);
        PageError(e)
    })?;

    let selected = match outcome {
        TranslationOutcome::Unavailable => None,
        _ => Some(request.dest_lang.as_str()),
    };

    Ok(state.render(&request.text, outcome.display_text(), selected))
}

/// Health check handler
async fn health_check(State(state): State<Arc<AppState>>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        languages: state.translator.registry().len(),
        started_at: state.started_at,
    })
}

/// Get languages handler
async fn get_languages(State(state): State<Arc<AppState>>) -> axum::Json<LanguagesResponse> {
    let data = state
        .translator
        .registry()
        .entries()
        .iter()
        .map(|entry| LanguageInfo {
            key: entry.spec.key.clone(),
            model_id: entry.spec.model_id.clone(),
            target_language: entry.spec.target_language.clone(),
        })
        .collect();

    axum::Json(LanguagesResponse {
        object: "list".to_string(),
        data,
    })
}

/// JSON translation handler
async fn translate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslateRequest>,
) -> Result<axum::Json<TranslateResponse>, ApiError> {
    let request = TranslationRequest::new(payload.text, payload.dest_lang);

    let outcome = state.translator.resolve(&request).await.map_err(|e| {
        warn!("Translation to {} failed: {}", request.dest_lang, e);
        ApiError::from(e)
    })?;

    if outcome == TranslationOutcome::Unavailable {
        return Err(ApiError::from(TranslationError::UnknownLanguagePair {
            key: request.dest_lang,
        }));
    }

    Ok(axum::Json(TranslateResponse {
        translated_text: outcome.into_text(),
        input_text: request.text,
        dest_lang: request.dest_lang,
    }))
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health_check))
        .route("/api/languages", get(get_languages))
        .route("/api/translate", post(translate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C
pub async fn run_server(config: &AppConfig, registry: Arc<ModelRegistry>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::with_default_view(registry));
    let app = router(state);

    // Bind address
    let addr: SocketAddr = config.bind_address().parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
