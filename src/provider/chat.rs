use async_trait::async_trait;

use crate::schema::ChatCompletionMessage;

use super::provider_secret::IntegrationSecret;
use super::types::ProviderResult;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletionResponse {
    /// Content of the first choice.
    pub content: Option<String>,
    pub total_tokens: Option<u32>,
}

/// Chat completion provider port.
///
/// Credentials are passed per call since each block may use a different
/// account. Implementations must be safe to share between concurrent turns.
///
/// # Errors
///
/// Any failure is reported as a [`ProviderError`](super::ProviderError). The
/// caller turns it into a reply log; it never aborts the turn.
#[mockall::automock]
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn create_chat_completion(
        &self,
        secret: &IntegrationSecret,
        request: &ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletionResponse>;
}
