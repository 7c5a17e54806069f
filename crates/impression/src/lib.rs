//! # RadImpress Impression
//!
//! Everything between a submitted form and a generated impression:
//!
//! - [`token`]: word-based token estimate and the warn/error/ceiling budget
//! - [`assembler`]: system prompt assembly and the user prompt
//! - [`client`]: model settings and the provider call
//! - [`pipeline`]: one submission, from stored template to [`GenerationOutcome`]

pub mod assembler;
pub mod client;
pub mod pipeline;
pub mod token;

#[cfg(test)]
mod testing;

pub use assembler::{assemble, build_user_prompt};
pub use client::{Impression, ImpressionClient, ModelSettings};
pub use pipeline::{GenerationOutcome, ImpressionPipeline, PreparedPrompt, TemplateEstimate};
pub use token::{BudgetStatus, TokenBudget, estimate_tokens};
