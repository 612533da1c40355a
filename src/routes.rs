use axum::{
    Json, Router,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use base64::Engine;
use include_dir::{include_dir, Dir};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    error::AppError,
    gemini::{LayoutClient, LayoutError},
    models::{
        FieldUpdate, HomeSpecifications, LayoutRequest, LayoutResponse, LayoutSlot, SessionView, SpecField,
        TextUpdate, ThemeUpdate, ValidationReport,
    },
    session::SessionStore,
    validation::ValidationErrors,
};

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub layouts: Arc<LayoutClient>,
}

impl AppState {
    fn api_key_set(&self) -> bool {
        !self.layouts.is_mock()
    }

    fn view(&self, id: Uuid) -> Result<Json<SessionView>, AppError> {
        Ok(Json(self.sessions.get(id)?.view(self.api_key_set())))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/*path", get(static_asset))
        .route("/api/health", get(health))
        .route("/api/validate", post(validate))
        .route("/api/layout", post(generate_layout))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/specifications", put(replace_specifications))
        .route("/api/sessions/:id/specifications/:field", put(update_field))
        .route("/api/sessions/:id/vision", put(set_vision))
        .route("/api/sessions/:id/other-features", put(set_other_features))
        .route("/api/sessions/:id/theme", put(set_theme))
        .route("/api/sessions/:id/generate", post(generate))
        .route("/api/sessions/:id/layout", get(download_layout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn index() -> Response {
    match STATIC_DIR.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(html) => Html(html).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn static_asset(Path(path): Path<String>) -> Response {
    let Some(file) = STATIC_DIR.get_file(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let content_type = match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    };
    ([(header::CONTENT_TYPE, content_type)], file.contents()).into_response()
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "mockMode": state.layouts.is_mock() }))
}

pub async fn validate(Json(specs): Json<HomeSpecifications>) -> Json<ValidationReport> {
    let errors = ValidationErrors::for_specifications(&specs);
    Json(ValidationReport { has_errors: errors.has_errors(), errors })
}

/// One-shot generation without a session.
pub async fn generate_layout(
    State(state): State<AppState>,
    Json(body): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let image = state.layouts.generate_layout(&body).await?;
    Ok(Json(LayoutResponse { image }))
}

pub async fn create_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.sessions.create();
    tracing::info!("🚀 Created session {}", session.id);
    Json(session.view(state.api_key_set()))
}

pub async fn get_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    state.view(id)
}

pub async fn update_field(
    Path((id, field)): Path<(Uuid, String)>,
    State(state): State<AppState>,
    Json(body): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let field: SpecField = field.parse().map_err(AppError::InvalidInput)?;
    state.sessions.update(id, |s| s.update_field(field, body.value))?;
    state.view(id)
}

pub async fn replace_specifications(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<HomeSpecifications>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.update(id, |s| {
        s.replace_specifications(body);
        Ok(())
    })?;
    state.view(id)
}

pub async fn set_vision(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<TextUpdate>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.update(id, |s| {
        s.vision = body.text;
        s.touch();
        Ok(())
    })?;
    state.view(id)
}

pub async fn set_other_features(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<TextUpdate>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.update(id, |s| {
        s.other_features = body.text;
        s.touch();
        Ok(())
    })?;
    state.view(id)
}

pub async fn set_theme(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ThemeUpdate>,
) -> Result<Json<SessionView>, AppError> {
    state.sessions.update(id, |s| {
        s.theme = body.theme;
        s.touch();
        Ok(())
    })?;
    state.view(id)
}

/// Runs one generation for the session. The remote call and the result
/// write happen in a spawned task, so a dropped request still clears the
/// loading flag once the call resolves.
pub async fn generate(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let request = state.sessions.update(id, |s| s.begin_generation())?;
    tracing::info!("🎯 Generating layout for session {}", id);

    let sessions = state.sessions.clone();
    let layouts = state.layouts.clone();
    let task = tokio::spawn(async move {
        let outcome = layouts.generate_layout(&request).await;
        match &outcome {
            Ok(_) => tracing::info!("✅ Layout ready for session {}", id),
            Err(e) => tracing::error!("❌ Layout failed for session {}: {}", id, e),
        }
        sessions.update(id, |s| {
            s.finish_generation(outcome);
            Ok(())
        })
    });

    match task.await {
        Ok(result) => result?,
        Err(e) => {
            tracing::error!("❌ Layout task for session {} aborted: {}", id, e);
            state.sessions.update(id, |s| {
                s.finish_generation(Err(LayoutError::Unknown));
                Ok(())
            })?;
        }
    }
    state.view(id)
}

/// Splits a `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

pub async fn download_layout(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, AppError> {
    let session = state.sessions.get(id)?;
    let LayoutSlot::Image(uri) = &session.result.layout else {
        return Err(AppError::NoLayout(id));
    };
    let (mime, bytes) = decode_data_uri(uri).ok_or(AppError::CorruptLayout(id))?;
    let ext = if mime == "image/jpeg" { "jpg" } else { "png" };
    let disposition = format!("attachment; filename=\"floor_plan_{}.{}\"", id, ext);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    ).into_response())
}
