use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

use crate::schema::Variable;

use super::store::{find_variable_by_name, resolve_variable, single_variable_name};

lazy_static! {
    pub(crate) static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(.*?)\}\}").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldToParse {
    /// Substitute the variable's value.
    #[default]
    Value,
    /// Substitute the variable's id. Used for scripts run by the client,
    /// which receive the values as named arguments.
    Id,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub field_to_parse: FieldToParse,
    pub escape_for_json: bool,
    pub escape_for_url: bool,
    pub take_latest_if_list: bool,
}

impl ParseOptions {
    pub fn json() -> Self {
        Self {
            escape_for_json: true,
            ..Default::default()
        }
    }

    pub fn latest() -> Self {
        Self {
            take_latest_if_list: true,
            ..Default::default()
        }
    }
}

/// Replaces every `{{expr}}` in `text`.
///
/// Unresolved expressions are left verbatim. Lists are joined with `", "`
/// unless `take_latest_if_list` asks for their last element.
pub fn parse_variables(variables: &[Variable], text: &str, options: &ParseOptions) -> String {
    if !text.contains("{{") {
        return text.to_string();
    }
    PLACEHOLDER
        .replace_all(text, |captures: &Captures| {
            let placeholder = &captures[0];
            let expression = captures[1].trim();
            match options.field_to_parse {
                FieldToParse::Id => find_variable_by_name(variables, expression)
                    .map(|variable| variable.id.clone())
                    .unwrap_or_else(|| placeholder.to_string()),
                FieldToParse::Value => match resolve_variable(variables, expression) {
                    None => placeholder.to_string(),
                    Some(value) => {
                        let rendered = if options.take_latest_if_list {
                            value.latest().unwrap_or_default().to_string()
                        } else {
                            value.to_string()
                        };
                        escape(rendered, options)
                    }
                },
            }
        })
        .into_owned()
}

fn escape(value: String, options: &ParseOptions) -> String {
    if options.escape_for_url {
        return url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    }
    if options.escape_for_json {
        return escape_json_string(&value);
    }
    value
}

/// Escapes `value` so it can sit between the quotes of a JSON string.
fn escape_json_string(value: &str) -> String {
    match serde_json::to_string(value) {
        Ok(quoted) if quoted.len() >= 2 => quoted[1..quoted.len() - 1].to_string(),
        _ => value.to_string(),
    }
}

/// True when `text` is exactly one `{{...}}` expression.
pub fn is_single_variable(text: &str) -> bool {
    single_variable_name(text).is_some()
}

/// Interpolates a URL, form-encoding the values substituted in its query.
pub fn parse_variables_in_url(variables: &[Variable], url: &str) -> String {
    match url.split_once('?') {
        None => parse_variables(variables, url, &ParseOptions::default()),
        Some((base, query)) => {
            let base = parse_variables(variables, base, &ParseOptions::default());
            let query = parse_variables(
                variables,
                query,
                &ParseOptions {
                    escape_for_url: true,
                    ..Default::default()
                },
            );
            format!("{}?{}", base, query)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeepParseOptions {
    /// Turn resolved strings that look like numbers, booleans or null into
    /// those JSON types.
    pub guess_correct_types: bool,
    /// Drop object keys whose resolved value is an empty string.
    pub remove_empty_strings: bool,
    pub take_latest_if_list: bool,
}

/// Interpolates every string inside `value`, recursively.
pub fn deep_parse_variables(
    variables: &[Variable],
    value: &JsonValue,
    options: &DeepParseOptions,
) -> JsonValue {
    let parse_options = ParseOptions {
        take_latest_if_list: options.take_latest_if_list,
        ..Default::default()
    };
    match value {
        JsonValue::String(text) => {
            let parsed = parse_variables(variables, text, &parse_options);
            if options.guess_correct_types {
                parse_guessed_value_type(&parsed)
            } else {
                JsonValue::String(parsed)
            }
        }
        JsonValue::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| deep_parse_variables(variables, item, options))
                .collect(),
        ),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), deep_parse_variables(variables, item, options)))
                .filter(|(_, item)| {
                    !(options.remove_empty_strings && item.as_str() == Some(""))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Best guess of the JSON type a resolved string stands for.
pub fn parse_guessed_value_type(value: &str) -> JsonValue {
    match value {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        "null" | "undefined" => JsonValue::Null,
        _ => guess_number(value).unwrap_or_else(|| JsonValue::String(value.to_string())),
    }
}

fn guess_number(value: &str) -> Option<JsonValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(JsonValue::from(integer));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
}
