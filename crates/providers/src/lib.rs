//! LLM provider implementations for RadImpress.
//!
//! All providers implement the `radimpress_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use radimpress_config::AppConfig;

/// Build the provider described by `config`, using `api_key` for auth.
///
/// The key is passed separately because a session may override the
/// configured one.
pub fn from_config(config: &AppConfig, api_key: &str) -> OpenAiCompatProvider {
    OpenAiCompatProvider::new("openai", &config.api_url, api_key)
}
