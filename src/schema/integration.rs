use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Integration blocks. Zapier, Make.com and Pabbly are webhooks with a
/// different label and share the webhook executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntegrationBlock {
    #[serde(rename = "Webhook")]
    Webhook(WebhookBlock),
    #[serde(rename = "Zapier")]
    Zapier(WebhookBlock),
    #[serde(rename = "Make.com")]
    Make(WebhookBlock),
    #[serde(rename = "Pabbly")]
    Pabbly(WebhookBlock),
    #[serde(rename = "OpenAI")]
    OpenAI(OpenAIBlock),
    #[serde(rename = "Google Analytics")]
    GoogleAnalytics(GoogleAnalyticsBlock),
}

impl IntegrationBlock {
    pub fn as_webhook(&self) -> Option<&WebhookBlock> {
        match self {
            IntegrationBlock::Webhook(block)
            | IntegrationBlock::Zapier(block)
            | IntegrationBlock::Make(block)
            | IntegrationBlock::Pabbly(block) => Some(block),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(default)]
    pub options: WebhookBlockOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBlockOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_advanced_config: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom_body: Option<bool>,
    #[serde(default)]
    pub is_executed_on_client: bool,
    #[serde(default)]
    pub response_variable_mapping: Vec<ResponseVariableMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseVariableMapping {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAIBlock {
    #[serde(default)]
    pub options: OpenAIOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAIOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatCompletionMessageOption>,
    #[serde(default)]
    pub response_mapping: Vec<ChatCompletionResponseMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_settings: Option<AdvancedSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    /// Either a number or a `{{variable}}` reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum ChatCompletionMessageOption {
    #[serde(rename = "system")]
    System(TemplatedMessage),
    #[serde(rename = "user")]
    User(TemplatedMessage),
    #[serde(rename = "assistant")]
    Assistant(TemplatedMessage),
    #[serde(rename = "Messages sequence ✨")]
    MessagesSequence(MessagesSequence),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesSequence {
    #[serde(default)]
    pub content: MessagesSequenceContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSequenceContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_messages_variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_messages_variable_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionResponseMapping {
    pub id: String,
    #[serde(default)]
    pub value_to_extract: ValueToExtract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueToExtract {
    #[default]
    #[serde(rename = "Message content")]
    MessageContent,
    #[serde(rename = "Total tokens")]
    TotalTokens,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleAnalyticsBlock {
    #[serde(default)]
    pub options: JsonValue,
}
