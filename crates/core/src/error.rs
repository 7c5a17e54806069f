//! Error types for the RadImpress domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt for '{study}' does not contain the {{document_content}} placeholder")]
    MissingPlaceholder { study: String },

    #[error("Prompt for '{study}' was changed by someone else (expected revision {expected}, found {actual})")]
    Conflict {
        study: String,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to write prompt file at {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("No reference document for '{0}'")]
    NotFound(String),

    #[error("Uploaded document for '{0}' is empty")]
    EmptyUpload(String),

    #[error("Document I/O failed at {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a valid DOCX archive: {0}")]
    Archive(String),

    #[error("DOCX archive has no {0}")]
    MissingPart(String),

    #[error("Malformed document XML: {0}")]
    Xml(String),
}

/// Suggestions shown when the prompt does not fit the model's context window.
pub const CONTEXT_LENGTH_REMEDIATION: [&str; 3] = [
    "Use a smaller reference document",
    "Switch to a larger-context model such as gpt-4o",
    "Summarize the document first",
];

#[derive(Debug, Error)]
pub enum ImpressionError {
    #[error("Key findings are required")]
    MissingFindings,

    #[error("No API key configured — set OPENAI_API_KEY or provide one for this session")]
    MissingApiKey,

    #[error("Invalid model settings: {0}")]
    InvalidSettings(String),

    #[error(
        "Document too large (~{estimated} tokens, limit {ceiling}). Consider using a smaller document or a model with a larger context window."
    )]
    TokenBudgetExceeded { estimated: usize, ceiling: usize },

    #[error("Failed to generate: {message}{}", render_remediation(.remediation))]
    Api {
        message: String,
        remediation: Vec<String>,
    },
}

impl ImpressionError {
    /// Wrap a provider failure, attaching remediation when the prompt
    /// overflowed the model's context window.
    pub fn from_provider(err: ProviderError) -> Self {
        let message = err.to_string();
        let remediation = if message.contains("context_length_exceeded") {
            CONTEXT_LENGTH_REMEDIATION
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            Vec::new()
        };
        ImpressionError::Api {
            message,
            remediation,
        }
    }

    /// Remediation suggestions, empty unless the error is actionable.
    pub fn remediation(&self) -> &[String] {
        match self {
            ImpressionError::Api { remediation, .. } => remediation,
            _ => &[],
        }
    }
}

fn render_remediation(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let numbered: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {s}", i + 1))
        .collect();
    format!(". Try: {}", numbered.join(", "))
}
