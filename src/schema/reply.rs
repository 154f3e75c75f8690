use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::blocks::ChoiceItem;
use super::webhook::ExecutableWebhook;

/// Reply envelope of one turn. Every list keeps the order in which blocks
/// were visited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RenderedInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_side_actions: Vec<ClientSideAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<ReplyLog>,
}

/// A rendered bubble block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: JsonValue,
}

/// Pending input descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedInput {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: JsonValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ChoiceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefilled_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyLog {
    pub status: LogStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<LogDetails>,
}

impl ReplyLog {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Success,
            description: description.into(),
            details: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Error,
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: LogDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == LogStatus::Error
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A side effect deferred to the client, correlated with the bubble that was
/// on screen when it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSideAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_bubble_block_id: Option<String>,
    #[serde(flatten)]
    pub kind: ClientSideActionKind,
}

impl ClientSideAction {
    pub fn new(kind: ClientSideActionKind) -> Self {
        Self {
            last_bubble_block_id: None,
            kind,
        }
    }

    pub fn requires_client_round_trip(&self) -> bool {
        self.kind.requires_client_round_trip()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientSideActionKind {
    SetVariable(SetVariableAction),
    WebhookToExecute(ExecutableWebhook),
    StreamChatCompletion(StreamChatCompletionAction),
    GoogleAnalytics(JsonValue),
    Redirect(RedirectAction),
    ScriptToExecute(ScriptToExecute),
}

impl ClientSideActionKind {
    /// Actions whose outcome the engine needs before it can go on.
    pub fn requires_client_round_trip(&self) -> bool {
        matches!(
            self,
            ClientSideActionKind::SetVariable(_)
                | ClientSideActionKind::WebhookToExecute(_)
                | ClientSideActionKind::StreamChatCompletion(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableAction {
    pub script_to_execute: ScriptToExecute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptToExecute {
    pub content: String,
    #[serde(default)]
    pub args: Vec<ScriptArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptArg {
    pub id: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChatCompletionAction {
    pub messages: Vec<ChatCompletionMessage>,
    pub display_stream: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatCompletionMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectAction {
    pub url: String,
    #[serde(default)]
    pub is_new_tab: bool,
}
