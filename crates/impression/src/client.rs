//! Impression generation against a chat completion provider.

use radimpress_config::{MAX_TOKENS_RANGE, ModelConfig, TEMPERATURE_RANGE};
use radimpress_core::error::ImpressionError;
use radimpress_core::message::Message;
use radimpress_core::provider::{Provider, ProviderRequest, Usage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Nucleus sampling cutoff sent with every request.
pub const TOP_P: f32 = 0.9;

/// Sampling settings for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_top_p() -> f32 {
    TOP_P
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from(&ModelConfig::default())
    }
}

impl From<&ModelConfig> for ModelSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: TOP_P,
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<(), ImpressionError> {
        if self.model.trim().is_empty() {
            return Err(ImpressionError::InvalidSettings("model must not be empty".into()));
        }
        let (t_min, t_max) = TEMPERATURE_RANGE;
        if !(t_min..=t_max).contains(&self.temperature) {
            return Err(ImpressionError::InvalidSettings(format!(
                "temperature {} outside [{t_min}, {t_max}]",
                self.temperature
            )));
        }
        let (m_min, m_max) = MAX_TOKENS_RANGE;
        if !(m_min..=m_max).contains(&self.max_tokens) {
            return Err(ImpressionError::InvalidSettings(format!(
                "max_tokens {} outside [{m_min}, {m_max}]",
                self.max_tokens
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ImpressionError::InvalidSettings(format!(
                "top_p {} outside [0, 1]",
                self.top_p
            )));
        }
        Ok(())
    }
}

/// A generated impression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Impression {
    /// Model output, trimmed
    pub text: String,
    pub usage: Usage,
    /// Model that actually answered
    pub model: String,
}

/// Sends assembled prompts to a provider.
#[derive(Clone)]
pub struct ImpressionClient {
    provider: Arc<dyn Provider>,
}

impl ImpressionClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One chat completion: `[system, user]` with `settings`. Never retried.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: &ModelSettings,
    ) -> Result<Impression, ImpressionError> {
        settings.validate()?;

        let request = ProviderRequest {
            model: settings.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
            temperature: settings.temperature,
            max_tokens: Some(settings.max_tokens),
            top_p: Some(settings.top_p),
        };

        debug!(
            provider = self.provider.name(),
            model = %settings.model,
            system_chars = system_prompt.len(),
            "Requesting impression"
        );

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(ImpressionError::from_provider)?;

        let usage = response.usage.unwrap_or_default();
        info!(
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "Impression generated"
        );

        Ok(Impression {
            text: response.message.content.trim().to_string(),
            usage,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use radimpress_core::error::ProviderError;
    use radimpress_core::message::Role;

    #[test]
    fn defaults_match_config() {
        let settings = ModelSettings::default();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert!((settings.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.max_tokens, 800);
        assert!((settings.top_p - 0.9).abs() < f32::EPSILON);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn range_edges_are_valid() {
        for (temperature, max_tokens) in [(0.0, 500), (1.0, 2000)] {
            let settings = ModelSettings {
                temperature,
                max_tokens,
                ..Default::default()
            };
            assert!(settings.validate().is_ok());
        }
    }

    #[test]
    fn out_of_range_rejected() {
        let hot = ModelSettings {
            temperature: 1.5,
            ..Default::default()
        };
        let short = ModelSettings {
            max_tokens: 100,
            ..Default::default()
        };
        let long = ModelSettings {
            max_tokens: 4000,
            ..Default::default()
        };
        for settings in [hot, short, long] {
            assert!(matches!(
                settings.validate(),
                Err(ImpressionError::InvalidSettings(_))
            ));
        }
    }

    #[tokio::test]
    async fn sends_system_then_user_with_settings() {
        let provider = Arc::new(MockProvider::replying("  • Stable nodule.\n"));
        let client = ImpressionClient::new(provider.clone());

        let impression = client
            .generate("SYSTEM", "USER", &ModelSettings::default())
            .await
            .unwrap();

        assert_eq!(impression.text, "• Stable nodule.");
        assert_eq!(impression.usage.total_tokens, 15);

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "SYSTEM");
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.max_tokens, Some(800));
        assert_eq!(request.top_p, Some(0.9));
    }

    #[tokio::test]
    async fn invalid_settings_never_reach_provider() {
        let provider = Arc::new(MockProvider::replying("x"));
        let client = ImpressionClient::new(provider.clone());
        let settings = ModelSettings {
            temperature: -0.5,
            ..Default::default()
        };
        assert!(client.generate("s", "u", &settings).await.is_err());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn context_length_failure_carries_remediation() {
        let provider = Arc::new(MockProvider::failing(ProviderError::ApiError {
            status_code: 400,
            message: "This model's maximum context length is 128000 tokens (context_length_exceeded)".into(),
        }));
        let client = ImpressionClient::new(provider.clone());

        let err = client
            .generate("s", "u", &ModelSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.remediation().len(), 3);
        assert!(err.to_string().starts_with("Failed to generate:"));
        // No retry.
        assert_eq!(provider.calls(), 1);
    }
}
