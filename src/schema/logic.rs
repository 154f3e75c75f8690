use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogicBlock {
    #[serde(rename = "Condition")]
    Condition(ConditionBlock),
    #[serde(rename = "Set variable")]
    SetVariable(SetVariableBlock),
    #[serde(rename = "Redirect")]
    Redirect(RedirectBlock),
    #[serde(rename = "Code")]
    Script(ScriptBlock),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionBlock {
    #[serde(default)]
    pub items: Vec<ConditionItem>,
}

/// One branch of a condition block. The first item whose condition passes
/// routes the conversation through its own edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionItem {
    pub id: String,
    #[serde(default)]
    pub content: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_edge_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<ComparisonOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Comparison {
    pub fn new(
        variable_id: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            variable_id: Some(variable_id.into()),
            comparison_operator: Some(operator),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ComparisonOperator {
    #[serde(rename = "Equal to")]
    #[strum(serialize = "Equal to")]
    Equal,
    #[serde(rename = "Not equal")]
    #[strum(serialize = "Not equal")]
    NotEqual,
    #[serde(rename = "Contains")]
    #[strum(serialize = "Contains")]
    Contains,
    #[serde(rename = "Does not contain")]
    #[strum(serialize = "Does not contain")]
    NotContains,
    #[serde(rename = "Greater than")]
    #[strum(serialize = "Greater than")]
    Greater,
    #[serde(rename = "Less than")]
    #[strum(serialize = "Less than")]
    Less,
    #[serde(rename = "Is set")]
    #[strum(serialize = "Is set")]
    IsSet,
    #[serde(rename = "Is empty")]
    #[strum(serialize = "Is empty")]
    IsEmpty,
    #[serde(rename = "Starts with")]
    #[strum(serialize = "Starts with")]
    StartsWith,
    #[serde(rename = "Ends with")]
    #[strum(serialize = "Ends with")]
    EndsWith,
    /// Operators this engine does not know. Always evaluates to false.
    #[serde(other)]
    #[strum(serialize = "Unknown")]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetVariableBlock {
    #[serde(default)]
    pub options: SetVariableOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_to_evaluate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_code: Option<bool>,
    #[serde(default, rename = "type")]
    pub kind: SetVariableType,
    #[serde(default)]
    pub is_executed_on_client: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetVariableType {
    #[default]
    Custom,
    Empty,
    Now,
    Today,
    #[serde(rename = "Random ID")]
    RandomId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectBlock {
    #[serde(default)]
    pub options: RedirectOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub is_new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptBlock {
    #[serde(default)]
    pub options: ScriptOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub should_execute_in_parent_context: bool,
}
