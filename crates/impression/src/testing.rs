//! Mock provider for tests.

use radimpress_core::error::ProviderError;
use radimpress_core::message::Message;
use radimpress_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// Answers every request with the same scripted result and records requests.
pub(crate) struct MockProvider {
    result: Result<ProviderResponse, ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            result: Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.result.clone()
    }
}
