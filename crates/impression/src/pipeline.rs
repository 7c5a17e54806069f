//! One impression submission, end to end.
//!
//! template lookup → document extraction → assemble → estimate → budget
//! check → user prompt → provider call.
//!
//! Steps run sequentially. Extraction is CPU and file bound, so it runs on
//! the blocking pool.

use radimpress_core::error::ImpressionError;
use radimpress_core::template::{NO_DOCUMENT_TEXT, has_placeholder};
use radimpress_store::{DocumentStore, PromptStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assembler::{assemble, build_user_prompt};
use crate::client::{Impression, ImpressionClient, ModelSettings};
use crate::token::{BudgetStatus, TokenBudget, estimate_tokens};

/// The system prompt for a study, ready to send.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub system_prompt: String,
    /// Extracted document text; empty when the study has no document
    pub document_used: String,
    pub estimated_tokens: usize,
    pub budget_status: BudgetStatus,
    pub warnings: Vec<String>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub impression: Impression,
    pub document_used: String,
    pub prompt_used: String,
    pub estimated_tokens: usize,
    pub budget_status: BudgetStatus,
    pub warnings: Vec<String>,
}

/// Token estimate for a template filled with a study's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateEstimate {
    pub estimated_tokens: usize,
    pub budget_status: BudgetStatus,
}

pub struct ImpressionPipeline {
    prompts: Arc<PromptStore>,
    documents: Arc<DocumentStore>,
    budget: TokenBudget,
}

impl ImpressionPipeline {
    pub fn new(prompts: Arc<PromptStore>, documents: Arc<DocumentStore>, budget: TokenBudget) -> Self {
        Self {
            prompts,
            documents,
            budget,
        }
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    /// Extracted text of `study`'s document, `None` when it has none.
    pub async fn document_text(&self, study: &str) -> Option<String> {
        if !self.documents.exists(study) {
            return None;
        }
        let path = self.documents.path_for(study);
        let text = match tokio::task::spawn_blocking(move || radimpress_extract::extract(&path)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(study, error = %e, "Extraction task failed");
                String::new()
            }
        };
        Some(text)
    }

    /// Assemble and budget-check the system prompt for `study`.
    pub async fn prepare(&self, study: &str) -> Result<PreparedPrompt, ImpressionError> {
        let template = self.prompts.get(study);
        let mut warnings = Vec::new();

        let document = self.document_text(study).await;
        match document.as_deref() {
            None => warnings.push(format!("No reference document for {study}. Using prompt only.")),
            Some("") => warnings.push(format!(
                "Reference document for {study} could not be read. No document text was included."
            )),
            Some(_) => {}
        }

        let system_prompt = assemble(&template, document.as_deref().unwrap_or(NO_DOCUMENT_TEXT));
        let document_used = document.unwrap_or_default();
        let estimated_tokens = estimate_tokens(&system_prompt);

        if self.budget.is_blocked(estimated_tokens) {
            warn!(study, estimated_tokens, ceiling = self.budget.ceiling, "Prompt over token ceiling");
            return Err(ImpressionError::TokenBudgetExceeded {
                estimated: estimated_tokens,
                ceiling: self.budget.ceiling,
            });
        }

        let budget_status = self.budget.validate(estimated_tokens);
        if budget_status != BudgetStatus::Ok {
            warnings.push(budget_status.describe(estimated_tokens));
        }

        Ok(PreparedPrompt {
            system_prompt,
            document_used,
            estimated_tokens,
            budget_status,
            warnings,
        })
    }

    /// Generate an impression for one submission.
    pub async fn run(
        &self,
        client: &ImpressionClient,
        settings: &ModelSettings,
        study: &str,
        history: &str,
        findings: &str,
    ) -> Result<GenerationOutcome, ImpressionError> {
        let user_prompt = build_user_prompt(study, history, findings)?;
        settings.validate()?;

        let prepared = self.prepare(study).await?;
        info!(
            study,
            estimated_tokens = prepared.estimated_tokens,
            has_document = !prepared.document_used.is_empty(),
            "Submitting impression request"
        );

        let impression = client
            .generate(&prepared.system_prompt, &user_prompt, settings)
            .await?;

        Ok(GenerationOutcome {
            impression,
            document_used: prepared.document_used,
            prompt_used: prepared.system_prompt,
            estimated_tokens: prepared.estimated_tokens,
            budget_status: prepared.budget_status,
            warnings: prepared.warnings,
        })
    }

    /// Estimate `template` filled with `study`'s document.
    ///
    /// `None` when the template has no placeholder or the study has no
    /// document.
    pub async fn estimate_template(&self, study: &str, template: &str) -> Option<TemplateEstimate> {
        if !has_placeholder(template) {
            return None;
        }
        let document = self.document_text(study).await?;
        let estimated_tokens = estimate_tokens(&assemble(template, &document));
        Some(TemplateEstimate {
            estimated_tokens,
            budget_status: self.budget.validate(estimated_tokens),
        })
    }
}
