//! Chat completion provider port and its OpenAI implementation.

pub mod chat;
pub mod openai_chat;
pub mod provider_secret;
pub mod types;

pub use chat::{
    ChatCompletionClient, ChatCompletionRequest, ChatCompletionResponse, MockChatCompletionClient,
};
pub use openai_chat::OpenAIChatClient;
pub use provider_secret::IntegrationSecret;
pub use types::{ProviderError, ProviderResult};
