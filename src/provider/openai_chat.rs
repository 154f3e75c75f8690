use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::ChatCompletionConfig;
use crate::schema::{ChatCompletionMessage, ChatRole};

use super::chat::{ChatCompletionClient, ChatCompletionRequest, ChatCompletionResponse};
use super::provider_secret::IntegrationSecret;
use super::types::{ProviderError, ProviderResult};

/// [`ChatCompletionClient`] backed by the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAIChatClient {
    config: ChatCompletionConfig,
}

impl OpenAIChatClient {
    pub fn new(config: ChatCompletionConfig) -> Self {
        Self { config }
    }

    fn client(&self, secret: &IntegrationSecret) -> Client<OpenAIConfig> {
        let mut openai_config = OpenAIConfig::new()
            .with_api_key(secret.api_key.expose_secret())
            .with_api_base(&self.config.api_base);

        if let Some(org_id) = secret.additional_auth.get("organization_id") {
            openai_config = openai_config.with_org_id(org_id.expose_secret());
        }

        let http_client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .unwrap_or_default();

        Client::with_config(openai_config).with_http_client(http_client)
    }
}

fn to_request_message(
    message: &ChatCompletionMessage,
) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

fn map_error(error: OpenAIError) -> ProviderError {
    match error {
        OpenAIError::ApiError(api_error) => ProviderError::ApiError(api_error.message),
        OpenAIError::InvalidArgument(message) => ProviderError::InvalidRequest(message),
        OpenAIError::Reqwest(e) => ProviderError::Transport(e.to_string()),
        OpenAIError::JSONDeserialize(e) => ProviderError::InvalidResponse(e.to_string()),
        other => ProviderError::ApiError(other.to_string()),
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAIChatClient {
    #[tracing::instrument(skip(self, secret, request), fields(model = %request.model))]
    async fn create_chat_completion(
        &self,
        secret: &IntegrationSecret,
        request: &ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletionResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_error)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(request.model.clone()).messages(messages);
        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        let openai_request = builder.build().map_err(map_error)?;

        debug!("messages: {}", request.messages.len());
        let response = self
            .client(secret)
            .chat()
            .create(openai_request)
            .await
            .map_err(map_error)?;

        Ok(ChatCompletionResponse {
            content: response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone()),
            total_tokens: response.usage.map(|usage| usage.total_tokens),
        })
    }
}
