use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::graph::Typebot;
use super::variable::{Variable, VariableValue};

/// Execution context of one conversation.
///
/// A turn receives the state by value and hands back a new one; nothing is
/// shared between concurrent turns. The caller persists the returned state and
/// serializes turns of the same session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub typebot: Typebot,
    /// `None` in preview sessions where nothing is recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultInSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_block: Option<CurrentBlock>,
    #[serde(default)]
    pub is_stream_enabled: bool,
}

/// Resumption anchor persisted when a turn stops at a blocking block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBlock {
    pub group_id: String,
    pub block_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInSession {
    pub id: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub has_started_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub block_id: String,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    pub content: String,
}

/// A new value for the variable with the given id. `None` clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableUpdate {
    pub id: String,
    pub value: Option<VariableValue>,
}

impl VariableUpdate {
    pub fn new(id: impl Into<String>, value: Option<VariableValue>) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

impl SessionState {
    pub fn new(typebot: Typebot) -> Self {
        Self {
            typebot,
            result: None,
            current_block: None,
            is_stream_enabled: false,
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.typebot.variables
    }

    /// Returns a copy with the given variables updated in the typebot and
    /// upserted into the result. Unknown ids are ignored.
    pub fn with_updated_variables(&self, updates: &[VariableUpdate]) -> Self {
        let mut next = self.clone();
        for update in updates {
            let Some(variable) = next
                .typebot
                .variables
                .iter_mut()
                .find(|variable| variable.id == update.id)
            else {
                continue;
            };
            variable.value = update.value.clone();
            let updated = variable.clone();

            if let Some(result) = next.result.as_mut() {
                match result
                    .variables
                    .iter_mut()
                    .find(|existing| existing.id == updated.id)
                {
                    Some(existing) => *existing = updated,
                    None => result.variables.push(updated),
                }
            }
        }
        next
    }

    pub fn with_current_block(mut self, current_block: Option<CurrentBlock>) -> Self {
        self.current_block = current_block;
        self
    }

    pub fn with_answer(mut self, answer: Answer) -> Self {
        if let Some(result) = self.result.as_mut() {
            result.has_started_input = true;
            result.answers.push(answer);
        }
        self
    }

    /// Result snapshot sent as the `{{state}}` webhook body: answers keyed by
    /// group title first, then variables keyed by name.
    pub fn result_snapshot(&self) -> Option<JsonValue> {
        let result = self.result.as_ref()?;
        let mut snapshot = serde_json::Map::new();
        for answer in &result.answers {
            let key = self
                .typebot
                .find_group(&answer.group_id)
                .map(|group| group.title.clone())
                .unwrap_or_else(|| answer.block_id.clone());
            snapshot.insert(key, JsonValue::String(answer.content.clone()));
        }
        for variable in &result.variables {
            if let Some(value) = &variable.value {
                snapshot.insert(variable.name.clone(), value.to_json());
            }
        }
        Some(JsonValue::Object(snapshot))
    }

    /// Placeholder snapshot used when no result is recorded (preview): every
    /// group title and variable name mapped to a sample string.
    pub fn sample_snapshot(&self) -> JsonValue {
        let mut snapshot = serde_json::Map::new();
        for group in &self.typebot.groups {
            if group.blocks.iter().any(|block| block.is_input()) {
                snapshot.insert(group.title.clone(), JsonValue::String("content".into()));
            }
        }
        for variable in &self.typebot.variables {
            snapshot.insert(variable.name.clone(), JsonValue::String("content".into()));
        }
        JsonValue::Object(snapshot)
    }
}
