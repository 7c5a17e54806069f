//! HTTP API gateway for RadImpress.
//!
//! Serves the embedded single-page frontend and the JSON API behind it:
//! study configuration (prompt templates and reference documents),
//! per-session model settings, impression generation and exports.
//!
//! Built on Axum.

pub mod api;
pub mod error;
pub mod frontend;
pub mod sessions;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use radimpress_config::{AppConfig, StudyCatalog};
use radimpress_core::{Provider, StudyType};
use radimpress_impression::{ImpressionPipeline, TokenBudget};
use radimpress_store::{DocumentStore, PromptStore};

use crate::error::ApiError;
use crate::sessions::SessionRegistry;

/// Request body limit; reference documents are uploaded as raw bytes.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Builds a provider for an API key. Sessions may carry their own key.
pub type ProviderFactory = Arc<dyn Fn(&str) -> Arc<dyn Provider> + Send + Sync>;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub catalog: StudyCatalog,
    pub prompts: Arc<PromptStore>,
    pub documents: Arc<DocumentStore>,
    pub pipeline: ImpressionPipeline,
    pub sessions: SessionRegistry,
    pub provider_factory: ProviderFactory,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// State over the stores under `config`'s data directory.
    pub fn new(config: AppConfig, catalog: StudyCatalog, provider_factory: ProviderFactory) -> Self {
        let prompts = Arc::new(PromptStore::new(config.prompts_path()));
        let documents = Arc::new(DocumentStore::new(config.documents_dir()));
        let pipeline = ImpressionPipeline::new(
            prompts.clone(),
            documents.clone(),
            TokenBudget::from(&config.budget),
        );
        Self {
            config,
            catalog,
            prompts,
            documents,
            pipeline,
            sessions: SessionRegistry::default(),
            provider_factory,
        }
    }

    /// Production state: catalog from the studies file, OpenAI-compatible
    /// provider at the configured URL.
    pub fn from_config(config: AppConfig) -> Self {
        let catalog = StudyCatalog::load(&config.studies_path());
        let provider_config = config.clone();
        let factory: ProviderFactory = Arc::new(move |key: &str| -> Arc<dyn Provider> {
            Arc::new(radimpress_providers::from_config(&provider_config, key))
        });
        Self::new(config, catalog, factory)
    }

    /// Look up a study by its exact name.
    pub fn study(&self, name: &str) -> Result<&StudyType, ApiError> {
        self.catalog
            .get(name)
            .ok_or_else(|| ApiError::not_found(format!("Unknown study type '{name}'")))
    }
}

/// Build the full router: JSON API, health check and embedded frontend.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router(state.clone()))
        .merge(sessions::session_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::from_config(config));

    info!(
        studies = state.catalog.len(),
        data_dir = %state.config.data_dir().display(),
        "Study configuration loaded"
    );

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler tests.

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use http_body_util::BodyExt;
    use radimpress_core::error::ProviderError;
    use radimpress_core::message::Message;
    use radimpress_core::provider::{ProviderRequest, ProviderResponse, Usage};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Lightweight mock provider for gateway tests.
    pub struct MockProvider {
        pub result: Result<String, ProviderError>,
        pub requests: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let text = self.result.clone()?;
            Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: Some(Usage {
                    prompt_tokens: 1200,
                    completion_tokens: 60,
                    total_tokens: 1260,
                }),
                model: "mock-model".into(),
            })
        }
    }

    pub struct TestApp {
        pub _dir: tempfile::TempDir,
        pub state: SharedState,
        pub provider: Arc<MockProvider>,
        pub keys: Arc<Mutex<Vec<String>>>,
    }

    impl TestApp {
        pub fn new() -> Self {
            Self::with(Ok("• Impression line one\n• Line two".into()), Some("sk-config"))
        }

        pub fn with(result: Result<String, ProviderError>, api_key: Option<&str>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = AppConfig::default();
            config.api_key = api_key.map(String::from);
            config.storage.data_dir = Some(dir.path().to_string_lossy().into_owned());

            let provider = Arc::new(MockProvider {
                result,
                requests: Mutex::new(Vec::new()),
            });
            let keys = Arc::new(Mutex::new(Vec::new()));

            let factory_provider = provider.clone();
            let factory_keys = keys.clone();
            let factory: ProviderFactory = Arc::new(move |key: &str| -> Arc<dyn Provider> {
                factory_keys.lock().unwrap().push(key.to_string());
                factory_provider.clone()
            });

            let catalog = StudyCatalog::builtin();
            let state = Arc::new(GatewayState::new(config, catalog, factory));
            Self {
                _dir: dir,
                state,
                provider,
                keys,
            }
        }

        pub async fn send(&self, req: Request<Body>) -> Response<Body> {
            build_router(self.state.clone()).oneshot(req).await.unwrap()
        }

        pub async fn json(
            &self,
            method: &str,
            uri: &str,
            body: Option<serde_json::Value>,
        ) -> (axum::http::StatusCode, serde_json::Value) {
            let builder = Request::builder().method(method).uri(uri);
            let req = match body {
                Some(b) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.send(req).await;
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
            };
            (status, value)
        }
    }

    /// Percent-encode a study name for use as a path segment.
    pub fn encode(study: &str) -> String {
        study
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }
}
