use serde_json::Value as JsonValue;

use crate::engine::BlockOutcome;
use crate::schema::{
    ClientSideAction, ClientSideActionKind, ScriptArg, ScriptOptions, ScriptToExecute,
    SessionState, Variable, VariableValue,
};
use crate::variables::{
    FieldToParse, ParseOptions, extract_variables_from_text, parse_guessed_value_type,
    parse_variables,
};

/// Emits the block's code for the client to run. Non-blocking.
pub fn execute_script(state: &SessionState, options: &ScriptOptions) -> BlockOutcome {
    let Some(content) = options.content.as_deref().filter(|content| !content.trim().is_empty())
    else {
        return BlockOutcome::new();
    };
    BlockOutcome::new().with_action(ClientSideAction::new(ClientSideActionKind::ScriptToExecute(
        script_to_execute(state.variables(), content),
    )))
}

/// Rewrites `{{name}}` references into variable ids and lists the values the
/// client must bind to those ids.
pub fn script_to_execute(variables: &[Variable], content: &str) -> ScriptToExecute {
    let args = extract_variables_from_text(variables, content)
        .into_iter()
        .map(|variable| ScriptArg {
            id: variable.id.clone(),
            value: variable
                .value
                .as_ref()
                .map(script_value)
                .unwrap_or(JsonValue::Null),
        })
        .collect();
    let content = parse_variables(
        variables,
        content,
        &ParseOptions {
            field_to_parse: FieldToParse::Id,
            ..Default::default()
        },
    );
    ScriptToExecute { content, args }
}

fn script_value(value: &VariableValue) -> JsonValue {
    match value {
        VariableValue::Text(text) => parse_guessed_value_type(text),
        VariableValue::List(items) => {
            JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
        }
    }
}
