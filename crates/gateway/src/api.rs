//! Study configuration API.
//!
//! Endpoints:
//!
//! - `GET    /api/studies`                          : Study types with indicators
//! - `GET    /api/models`                           : Selectable models and defaults
//! - `GET    /api/studies/{study}/prompt`           : Current template
//! - `PUT    /api/studies/{study}/prompt`           : Save a template
//! - `POST   /api/studies/{study}/prompt/estimate`  : Token estimate for a draft template
//! - `GET    /api/studies/{study}/document`         : Document status and preview
//! - `PUT    /api/studies/{study}/document`         : Upload `.docx` bytes
//! - `DELETE /api/studies/{study}/document`         : Remove the document
//!
//! `{study}` is the percent-encoded study name ("CT%20Abdomen%2FPelvis").

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use radimpress_config::{MAX_TOKENS_RANGE, ModelOption, TEMPERATURE_RANGE};
use radimpress_impression::{BudgetStatus, ModelSettings, estimate_tokens};

use crate::SharedState;
use crate::error::ApiError;

/// Characters of extracted text shown in the document preview.
pub const PREVIEW_CHARS: usize = 2000;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/studies", get(list_studies_handler))
        .route("/api/models", get(list_models_handler))
        .route(
            "/api/studies/{study}/prompt",
            get(get_prompt_handler).put(save_prompt_handler),
        )
        .route(
            "/api/studies/{study}/prompt/estimate",
            post(estimate_prompt_handler),
        )
        .route(
            "/api/studies/{study}/document",
            get(get_document_handler)
                .put(upload_document_handler)
                .delete(delete_document_handler),
        )
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct StudyListResponse {
    pub studies: Vec<StudyDto>,
}

#[derive(Serialize, Deserialize)]
pub struct StudyDto {
    pub name: String,
    pub custom_prompt: bool,
    pub has_document: bool,
}

#[derive(Serialize)]
struct ModelListResponse {
    models: Vec<ModelOption>,
    defaults: ModelSettings,
    temperature_range: (f32, f32),
    max_tokens_range: (u32, u32),
}

#[derive(Serialize, Deserialize)]
pub struct PromptResponse {
    pub study: String,
    pub template: String,
    pub is_default: bool,
    pub revision: u64,
}

#[derive(Deserialize)]
struct SavePromptRequest {
    template: String,
    /// Revision the editor loaded; omit to overwrite unconditionally.
    #[serde(default)]
    revision: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct SavePromptResponse {
    pub study: String,
    pub revision: u64,
}

#[derive(Deserialize)]
struct EstimateRequest {
    template: String,
}

#[derive(Serialize, Deserialize)]
pub struct EstimateResponse {
    pub estimated_tokens: Option<usize>,
    pub budget_status: Option<BudgetStatus>,
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct DocumentResponse {
    pub study: String,
    pub exists: bool,
    pub chars: usize,
    pub estimated_tokens: usize,
    pub preview: String,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub study: String,
    pub bytes: usize,
    pub chars: usize,
    pub estimated_tokens: usize,
}

/// First [`PREVIEW_CHARS`] characters, marked when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}\n\n... (truncated)", &text[..cut]),
        None => text.to_string(),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_studies_handler(State(state): State<SharedState>) -> Json<StudyListResponse> {
    let overrides = state.prompts.load_all();
    let studies = state
        .catalog
        .studies()
        .iter()
        .map(|study| StudyDto {
            name: study.to_string(),
            custom_prompt: overrides.contains_key(study.as_str()),
            has_document: state.documents.exists(study.as_str()),
        })
        .collect();
    Json(StudyListResponse { studies })
}

async fn list_models_handler(State(state): State<SharedState>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        models: state.config.model.available.clone(),
        defaults: ModelSettings::from(&state.config.model),
        temperature_range: TEMPERATURE_RANGE,
        max_tokens_range: MAX_TOKENS_RANGE,
    })
}

async fn get_prompt_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
) -> Result<Json<PromptResponse>, ApiError> {
    let study = state.study(&study)?.as_str();
    Ok(Json(PromptResponse {
        study: study.to_string(),
        template: state.prompts.get(study),
        is_default: !state.prompts.has_override(study),
        revision: state.prompts.revision(study),
    }))
}

async fn save_prompt_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
    Json(req): Json<SavePromptRequest>,
) -> Result<Json<SavePromptResponse>, ApiError> {
    let study = state.study(&study)?.as_str();
    let revision = match req.revision {
        Some(expected) => state.prompts.save_if_revision(study, &req.template, expected)?,
        None => state.prompts.save(study, &req.template)?,
    };
    info!(study, revision, "Prompt template saved");
    Ok(Json(SavePromptResponse {
        study: study.to_string(),
        revision,
    }))
}

async fn estimate_prompt_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let study = state.study(&study)?.as_str();
    let response = match state.pipeline.estimate_template(study, &req.template).await {
        Some(estimate) => EstimateResponse {
            estimated_tokens: Some(estimate.estimated_tokens),
            budget_status: Some(estimate.budget_status),
            message: Some(estimate.budget_status.describe(estimate.estimated_tokens)),
        },
        None => EstimateResponse {
            estimated_tokens: None,
            budget_status: None,
            message: None,
        },
    };
    Ok(Json(response))
}

async fn get_document_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let study = state.study(&study)?.as_str();
    let response = match state.pipeline.document_text(study).await {
        Some(text) => DocumentResponse {
            study: study.to_string(),
            exists: true,
            chars: text.chars().count(),
            estimated_tokens: estimate_tokens(&text),
            preview: preview(&text),
        },
        None => DocumentResponse {
            study: study.to_string(),
            exists: false,
            chars: 0,
            estimated_tokens: 0,
            preview: String::new(),
        },
    };
    Ok(Json(response))
}

async fn upload_document_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let study = state.study(&study)?.as_str();
    if body.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Uploaded document for '{study}' is empty"
        )));
    }

    let bytes = body.clone();
    let extraction = tokio::task::spawn_blocking(move || radimpress_extract::extract_bytes(&bytes))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Not a readable .docx document: {e}"),
            )
        })?;

    state.documents.save(study, &body)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            study: study.to_string(),
            bytes: body.len(),
            chars: extraction.text.chars().count(),
            estimated_tokens: estimate_tokens(&extraction.text),
        }),
    ))
}

async fn delete_document_handler(
    State(state): State<SharedState>,
    Path(study): Path<String>,
) -> Result<StatusCode, ApiError> {
    let study = state.study(&study)?.as_str();
    state.documents.remove(study)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Tests ─────────────────────────────────────────────────────────────────
