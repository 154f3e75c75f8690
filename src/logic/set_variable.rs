use chrono::{SecondsFormat, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::engine::BlockOutcome;
use crate::schema::{
    ClientSideAction, ClientSideActionKind, SessionState, SetVariableAction, SetVariableOptions,
    SetVariableType, VariableUpdate, VariableValue,
};
use crate::variables::{
    ParseOptions, find_unique_variable_value, find_variable_by_id, parse_variables,
};

use super::script::script_to_execute;

#[tracing::instrument(skip(state, options), level = "debug")]
pub fn execute_set_variable(state: &SessionState, options: &SetVariableOptions) -> BlockOutcome {
    let Some(variable_id) = options.variable_id.as_deref() else {
        return BlockOutcome::new();
    };
    let variables = state.variables();
    if find_variable_by_id(variables, variable_id).is_none() {
        debug!("Unknown variable {}", variable_id);
        return BlockOutcome::new();
    }

    if options.is_executed_on_client && options.kind == SetVariableType::Custom {
        if let Some(expression) = options.expression_to_evaluate.as_deref() {
            let mut script = script_to_execute(variables, expression);
            if !script.content.contains("return ") {
                script.content = format!("return {}", script.content);
            }
            return BlockOutcome::new().with_action(ClientSideAction::new(
                ClientSideActionKind::SetVariable(SetVariableAction {
                    script_to_execute: script,
                }),
            ));
        }
    }

    let value = match options.kind {
        SetVariableType::Custom => {
            let Some(expression) = options.expression_to_evaluate.as_deref() else {
                return BlockOutcome::new();
            };
            Some(evaluate_expression(state, expression))
        }
        SetVariableType::Empty => None,
        SetVariableType::Now => Some(VariableValue::Text(
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        SetVariableType::Today => Some(VariableValue::Text(
            Utc::now().format("%Y-%m-%d").to_string(),
        )),
        SetVariableType::RandomId => Some(VariableValue::Text(Uuid::new_v4().to_string())),
    };

    BlockOutcome::new()
        .with_state(state.with_updated_variables(&[VariableUpdate::new(variable_id, value)]))
}

/// Expressions are templates: a lone `{{name}}` copies the value as is (lists
/// included), anything else is interpolated as text.
fn evaluate_expression(state: &SessionState, expression: &str) -> VariableValue {
    let variables = state.variables();
    find_unique_variable_value(variables, expression).unwrap_or_else(|| {
        VariableValue::Text(parse_variables(
            variables,
            expression,
            &ParseOptions::default(),
        ))
    })
}

/// Stores the value a client computed for a set-variable block. A JSON array
/// reply is stored as a list.
pub fn resume_set_variable(
    state: &SessionState,
    options: &SetVariableOptions,
    reply: &str,
) -> SessionState {
    let Some(variable_id) = options.variable_id.as_deref() else {
        return state.clone();
    };
    let value = match serde_json::from_str::<serde_json::Value>(reply) {
        Ok(json @ serde_json::Value::Array(_)) => VariableValue::from_json(&json),
        _ if reply.is_empty() => None,
        _ => Some(VariableValue::Text(reply.to_string())),
    };
    state.with_updated_variables(&[VariableUpdate::new(variable_id, value)])
}
