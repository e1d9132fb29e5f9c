//! Mock provider implementations for testing.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

/// How the mock should answer.
enum Behavior {
    Reply(String),
    Fail,
}

/// Mock text provider for testing.
pub struct MockTextProvider {
    behavior: Behavior,
}

impl MockTextProvider {
    /// Always answer with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Reply(reply.into()),
        }
    }

    /// Always fail with an API error.
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        _system: &str,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        match &self.behavior {
            Behavior::Reply(reply) => Ok(ProviderResponse {
                text: Some(reply.clone()),
                input_tokens: prompt.len() as i32 / 4,
                output_tokens: reply.len() as i32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            Behavior::Fail => Err(ProviderError::ApiError(
                "Mock provider configured to fail".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.behavior {
            Behavior::Reply(_) => Ok(()),
            Behavior::Fail => Err(ProviderError::ApiError(
                "Mock provider configured to fail".to_string(),
            )),
        }
    }
}
