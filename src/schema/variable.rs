use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A named slot in the session. Referenced by id internally and by name in
/// user-authored content (`{{name}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VariableValue>,
}

impl Variable {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<VariableValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Variable values are scalars (stored as text) or lists of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum VariableValue {
    Text(String),
    List(Vec<String>),
}

pub const LIST_SEPARATOR: &str = ", ";

impl VariableValue {
    /// Converts an arbitrary JSON value the way stored variables expect it:
    /// strings stay as they are, numbers and booleans are stringified, objects
    /// become their JSON text and arrays become lists. `null` means "no value".
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Array(items) => Some(VariableValue::List(
                items.iter().filter_map(stringify_json).collect(),
            )),
            other => stringify_json(other).map(VariableValue::Text),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VariableValue::Text(text) => Some(text),
            VariableValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            VariableValue::List(items) => Some(items),
            VariableValue::Text(_) => None,
        }
    }

    /// Character count for text, element count for lists.
    pub fn len(&self) -> usize {
        match self {
            VariableValue::Text(text) => text.chars().count(),
            VariableValue::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last element of a list, or the text itself.
    pub fn latest(&self) -> Option<&str> {
        match self {
            VariableValue::Text(text) => Some(text),
            VariableValue::List(items) => items.last().map(String::as_str),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            VariableValue::Text(text) => JsonValue::String(text.clone()),
            VariableValue::List(items) => {
                JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
            }
        }
    }
}

impl std::fmt::Display for VariableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableValue::Text(text) => write!(f, "{}", text),
            VariableValue::List(items) => write!(f, "{}", items.join(LIST_SEPARATOR)),
        }
    }
}

impl From<JsonValue> for VariableValue {
    fn from(value: JsonValue) -> Self {
        VariableValue::from_json(&value).unwrap_or_else(|| VariableValue::Text(String::new()))
    }
}

impl From<VariableValue> for JsonValue {
    fn from(value: VariableValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Text(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Text(value)
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(value: Vec<String>) -> Self {
        VariableValue::List(value)
    }
}

impl From<Vec<&str>> for VariableValue {
    fn from(value: Vec<&str>) -> Self {
        VariableValue::List(value.into_iter().map(str::to_string).collect())
    }
}

fn stringify_json(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
