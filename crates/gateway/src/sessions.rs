//! Per-operator sessions: model settings, the last generated impression,
//! and exports.
//!
//! Endpoints:
//!
//! - `POST  /api/sessions`                        : Create a session
//! - `GET   /api/sessions/{id}`                   : Session snapshot, including the last prompt and document used
//! - `PATCH /api/sessions/{id}/settings`          : Update model settings or API key
//! - `POST  /api/sessions/{id}/generate`          : Generate an impression
//! - `PUT   /api/sessions/{id}/impression`        : Replace the impression text after review
//! - `GET   /api/sessions/{id}/export/impression` : Download the impression as `.txt`
//! - `GET   /api/sessions/{id}/export/document`   : Download the document text used
//!
//! Sessions live in memory only and never expose their API key.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};

use radimpress_core::Usage;
use radimpress_impression::{BudgetStatus, ImpressionClient, ModelSettings};

use crate::SharedState;
use crate::error::ApiError;

/// Maximum number of live sessions; the oldest is evicted beyond this.
pub const MAX_SESSIONS: usize = 1_000;

/// State carried between requests of one operator.
#[derive(Clone)]
pub struct SessionState {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub settings: ModelSettings,
    /// Overrides the configured key for this session only
    pub api_key: Option<String>,
    pub last_study: Option<String>,
    pub impression_text: String,
    pub document_used: String,
    pub prompt_used: String,
    pub token_usage: Option<Usage>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn new(settings: ModelSettings) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            settings,
            api_key: None,
            last_study: None,
            impression_text: String::new(),
            document_used: String::new(),
            prompt_used: String::new(),
            token_usage: None,
            generated_at: None,
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("last_study", &self.last_study)
            .field("impression_chars", &self.impression_text.len())
            .field("generated_at", &self.generated_at)
            .finish_non_exhaustive()
    }
}

/// What clients see of a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub settings: ModelSettings,
    pub api_key_override: bool,
    pub last_study: Option<String>,
    pub impression_text: String,
    pub has_document_used: bool,
    /// Reference document text inserted into the last prompt
    pub document_used: String,
    /// System prompt sent with the last generation
    pub prompt_used: String,
    pub token_usage: Option<Usage>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl From<&SessionState> for SessionView {
    fn from(s: &SessionState) -> Self {
        Self {
            id: s.id.clone(),
            created_at: s.created_at,
            settings: s.settings.clone(),
            api_key_override: s.api_key.is_some(),
            last_study: s.last_study.clone(),
            impression_text: s.impression_text.clone(),
            has_document_used: !s.document_used.is_empty(),
            document_used: s.document_used.clone(),
            prompt_used: s.prompt_used.clone(),
            token_usage: s.token_usage,
            generated_at: s.generated_at,
        }
    }
}

/// Bounded in-memory session map.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionState>>,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn create(&self, settings: ModelSettings) -> SessionState {
        let session = SessionState::new(settings);
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.capacity
            && let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.created_at)
                .map(|s| s.id.clone())
        {
            sessions.remove(&oldest);
            info!(session = %oldest, "Evicted oldest session");
        }

        sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get(&self, id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Apply `f` to the session and return the updated copy.
    pub async fn update<F>(&self, id: &str, f: F) -> Option<SessionState>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        f(session);
        Some(session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub fn session_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session_handler))
        .route("/api/sessions/{id}", get(get_session_handler))
        .route("/api/sessions/{id}/settings", patch(update_settings_handler))
        .route("/api/sessions/{id}/generate", post(generate_handler))
        .route("/api/sessions/{id}/impression", put(edit_impression_handler))
        .route(
            "/api/sessions/{id}/export/impression",
            get(export_impression_handler),
        )
        .route(
            "/api/sessions/{id}/export/document",
            get(export_document_handler),
        )
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct SettingsPatch {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    /// Empty string clears the override
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    study: String,
    #[serde(default)]
    history: String,
    #[serde(default)]
    findings: String,
}

#[derive(Serialize, Deserialize)]
pub struct GenerateResponse {
    pub study: String,
    pub impression: String,
    pub model: String,
    pub usage: Usage,
    pub estimated_tokens: usize,
    pub budget_status: BudgetStatus,
    pub budget_message: String,
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
struct EditImpressionRequest {
    text: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────

async fn session_or_404(state: &SharedState, id: &str) -> Result<SessionState, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Session {id} not found")))
}

/// Study name made safe for a quoted `Content-Disposition` filename.
fn file_component(study: &str) -> String {
    study
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `impression_{study}_{YYYYMMDD_HHMM}.txt` with unsafe characters in the study replaced.
pub fn impression_filename(study: &str, at: DateTime<Local>) -> String {
    format!(
        "impression_{}_{}.txt",
        file_component(study),
        at.format("%Y%m%d_%H%M")
    )
}

pub fn document_filename(study: &str) -> String {
    format!("reference_doc_{}.txt", file_component(study))
}

fn text_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn create_session_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state
        .sessions
        .create(ModelSettings::from(&state.config.model))
        .await;
    (StatusCode::CREATED, Json(SessionView::from(&session)))
}

async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = session_or_404(&state, &id).await?;
    Ok(Json(SessionView::from(&session)))
}

async fn update_settings_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let session = session_or_404(&state, &id).await?;

    let mut settings = session.settings.clone();
    if let Some(model) = patch.model {
        if !state.config.model.available.iter().any(|m| m.id == model) {
            return Err(ApiError::bad_request(format!("Unknown model '{model}'")));
        }
        settings.model = model;
    }
    if let Some(temperature) = patch.temperature {
        settings.temperature = temperature;
    }
    if let Some(max_tokens) = patch.max_tokens {
        settings.max_tokens = max_tokens;
    }
    settings.validate()?;

    let api_key = patch.api_key.map(|k| k.trim().to_string());
    let updated = state
        .sessions
        .update(&id, |s| {
            s.settings = settings;
            match api_key {
                Some(k) if k.is_empty() => s.api_key = None,
                Some(k) => s.api_key = Some(k),
                None => {}
            }
        })
        .await
        .ok_or_else(|| ApiError::not_found(format!("Session {id} not found")))?;

    Ok(Json(SessionView::from(&updated)))
}

async fn generate_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let session = session_or_404(&state, &id).await?;
    let study = state.study(&req.study)?.to_string();

    let api_key = session
        .api_key
        .clone()
        .or_else(|| state.config.api_key.clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or(radimpress_core::error::ImpressionError::MissingApiKey)?;

    let client = ImpressionClient::new((state.provider_factory)(&api_key));
    let outcome = state
        .pipeline
        .run(&client, &session.settings, &study, &req.history, &req.findings)
        .await
        .inspect_err(|e| warn!(session = %id, study = %study, error = %e, "Generation failed"))?;

    let impression = outcome.impression;
    let usage = impression.usage;
    info!(
        session = %id,
        study = %study,
        model = %impression.model,
        total_tokens = usage.total_tokens,
        "Impression generated"
    );

    let text = impression.text.clone();
    let document_used = outcome.document_used;
    let prompt_used = outcome.prompt_used;
    let stored_study = study.clone();
    state
        .sessions
        .update(&id, move |s| {
            s.last_study = Some(stored_study);
            s.impression_text = text;
            s.document_used = document_used;
            s.prompt_used = prompt_used;
            s.token_usage = Some(usage);
            s.generated_at = Some(Utc::now());
        })
        .await
        .ok_or_else(|| {
            warn!(session = %id, study = %study, "Session evicted during generation, result discarded");
            ApiError::not_found(format!("Session {id} not found"))
        })?;

    Ok(Json(GenerateResponse {
        study,
        impression: impression.text,
        model: impression.model,
        usage,
        estimated_tokens: outcome.estimated_tokens,
        budget_status: outcome.budget_status,
        budget_message: outcome.budget_status.describe(outcome.estimated_tokens),
        warnings: outcome.warnings,
    }))
}

async fn edit_impression_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<EditImpressionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let updated = state
        .sessions
        .update(&id, |s| s.impression_text = req.text)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Session {id} not found")))?;
    Ok(Json(SessionView::from(&updated)))
}

async fn export_impression_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session_or_404(&state, &id).await?;
    if session.impression_text.trim().is_empty() {
        return Err(ApiError::not_found("No impression to export"));
    }
    let study = session.last_study.as_deref().unwrap_or("study");
    let filename = impression_filename(study, Local::now());
    Ok(text_attachment(&filename, session.impression_text))
}

async fn export_document_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session_or_404(&state, &id).await?;
    let study = match session.last_study.as_deref() {
        Some(study) if !session.document_used.is_empty() => study,
        _ => return Err(ApiError::not_found("No reference document was used")),
    };
    let filename = document_filename(study);
    Ok(text_attachment(&filename, session.document_used))
}
