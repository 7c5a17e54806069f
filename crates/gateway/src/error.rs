//! Mapping from domain errors to HTTP responses.
//!
//! Every failure is answered with a JSON body:
//!
//! ```json
//! { "error": "Failed to generate: ...", "remediation": ["..."] }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use radimpress_core::error::{DocumentError, ImpressionError, PromptError};
use serde::Serialize;
use tracing::warn;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub remediation: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    remediation: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            remediation: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "Request failed");
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                remediation: self.remediation,
            }),
        )
            .into_response()
    }
}

impl From<PromptError> for ApiError {
    fn from(err: PromptError) -> Self {
        let status = match &err {
            PromptError::MissingPlaceholder { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PromptError::Conflict { .. } => StatusCode::CONFLICT,
            PromptError::WriteFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        let status = match &err {
            DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
            DocumentError::EmptyUpload(_) => StatusCode::BAD_REQUEST,
            DocumentError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ImpressionError> for ApiError {
    fn from(err: ImpressionError) -> Self {
        let status = match &err {
            ImpressionError::MissingFindings
            | ImpressionError::MissingApiKey
            | ImpressionError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
            ImpressionError::TokenBudgetExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ImpressionError::Api { .. } => StatusCode::BAD_GATEWAY,
        };
        let remediation = err.remediation().to_vec();
        Self {
            status,
            message: err.to_string(),
            remediation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radimpress_core::error::ProviderError;

    #[test]
    fn prompt_errors_map_to_client_statuses() {
        let missing: ApiError = PromptError::MissingPlaceholder {
            study: "CT Chest".into(),
        }
        .into();
        assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);

        let conflict: ApiError = PromptError::Conflict {
            study: "CT Chest".into(),
            expected: 0,
            actual: 1,
        }
        .into();
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[test]
    fn provider_failure_is_bad_gateway_with_remediation() {
        let err: ApiError = ImpressionError::from_provider(ProviderError::ApiError {
            status_code: 400,
            message: "context_length_exceeded".into(),
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.remediation.len(), 3);
    }

    #[test]
    fn budget_block_is_payload_too_large() {
        let err: ApiError = ImpressionError::TokenBudgetExceeded {
            estimated: 130_000,
            ceiling: 120_000,
        }
        .into();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.message.contains("130000"));
    }

    #[test]
    fn input_errors_are_bad_request_without_remediation() {
        for err in [
            ImpressionError::MissingFindings,
            ImpressionError::MissingApiKey,
            ImpressionError::InvalidSettings("temperature".into()),
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status, StatusCode::BAD_REQUEST);
            assert!(api.remediation.is_empty());
        }
    }

    #[test]
    fn document_errors_keep_their_own_statuses() {
        let missing: ApiError = DocumentError::NotFound("CT Chest".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        let empty: ApiError = DocumentError::EmptyUpload("CT Chest".into()).into();
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }
}
