//! Block definitions.
//!
//! Blocks are closed variants per category. The wire format is the flat
//! typebot shape (`{"id", "type", "outgoingEdgeId", "content" | "options" | "items"}`);
//! the category is recovered from the `type` tag during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::integration::IntegrationBlock;
use super::logic::LogicBlock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_edge_id: Option<String>,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockKind {
    Start(StartBlock),
    Bubble(BubbleBlock),
    Input(InputBlock),
    Logic(LogicBlock),
    Integration(IntegrationBlock),
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            outgoing_edge_id: None,
            kind,
        }
    }

    pub fn with_outgoing_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.outgoing_edge_id = Some(edge_id.into());
        self
    }

    pub fn as_bubble(&self) -> Option<&BubbleBlock> {
        match &self.kind {
            BlockKind::Bubble(bubble) => Some(bubble),
            _ => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputBlock> {
        match &self.kind {
            BlockKind::Input(input) => Some(input),
            _ => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, BlockKind::Input(_))
    }
}

/// Entry point of a typebot; its outgoing edge leads to the first real group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartBlock {
    #[serde(rename = "type")]
    pub kind: StartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartType {
    #[default]
    #[serde(rename = "start")]
    Start,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleBlock {
    #[serde(rename = "type")]
    pub kind: BubbleType,
    #[serde(default)]
    pub content: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum BubbleType {
    #[serde(rename = "text")]
    #[strum(serialize = "text")]
    Text,
    #[serde(rename = "image")]
    #[strum(serialize = "image")]
    Image,
    #[serde(rename = "video")]
    #[strum(serialize = "video")]
    Video,
    #[serde(rename = "embed")]
    #[strum(serialize = "embed")]
    Embed,
    #[serde(rename = "audio")]
    #[strum(serialize = "audio")]
    Audio,
}

impl BubbleBlock {
    pub fn text(plain_text: impl Into<String>) -> Self {
        let plain_text = plain_text.into();
        Self {
            kind: BubbleType::Text,
            content: serde_json::json!({
                "richText": [{"type": "p", "children": [{"text": plain_text}]}],
                "plainText": plain_text,
            }),
        }
    }

    /// Text of the first rich text leaf, falling back to the plain text.
    pub fn first_text(&self) -> Option<&str> {
        if self.kind != BubbleType::Text {
            return None;
        }
        self.content
            .pointer("/richText/0/children/0/text")
            .and_then(JsonValue::as_str)
            .or_else(|| self.content.get("plainText").and_then(JsonValue::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBlock {
    #[serde(rename = "type")]
    pub kind: InputType,
    #[serde(default)]
    pub options: InputOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ChoiceItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum InputType {
    #[serde(rename = "text input")]
    #[strum(serialize = "text input")]
    Text,
    #[serde(rename = "number input")]
    #[strum(serialize = "number input")]
    Number,
    #[serde(rename = "email input")]
    #[strum(serialize = "email input")]
    Email,
    #[serde(rename = "url input")]
    #[strum(serialize = "url input")]
    Url,
    #[serde(rename = "date input")]
    #[strum(serialize = "date input")]
    Date,
    #[serde(rename = "phone number input")]
    #[strum(serialize = "phone number input")]
    Phone,
    #[serde(rename = "choice input")]
    #[strum(serialize = "choice input")]
    Choice,
    #[serde(rename = "picture choice input")]
    #[strum(serialize = "picture choice input")]
    PictureChoice,
    #[serde(rename = "payment input")]
    #[strum(serialize = "payment input")]
    Payment,
    #[serde(rename = "rating input")]
    #[strum(serialize = "rating input")]
    Rating,
    #[serde(rename = "file input")]
    #[strum(serialize = "file input")]
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_message_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multiple_choice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_variable_id: Option<String>,
    /// Kind specific options (labels, min/max/step, ...) kept as authored.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_edge_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl ChoiceItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            outgoing_edge_id: None,
            extra: serde_json::Map::new(),
        }
    }
}

pub const DEFAULT_RETRY_MESSAGE: &str = "Invalid message. Please, try again.";

impl InputBlock {
    pub fn new(kind: InputType) -> Self {
        Self {
            kind,
            options: InputOptions::default(),
            items: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable_id: impl Into<String>) -> Self {
        self.options.variable_id = Some(variable_id.into());
        self
    }

    pub fn retry_message(&self) -> &str {
        self.options
            .retry_message_content
            .as_deref()
            .unwrap_or(DEFAULT_RETRY_MESSAGE)
    }
}
