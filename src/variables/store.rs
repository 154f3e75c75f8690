use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::schema::{Variable, VariableValue};

use super::parse::{PLACEHOLDER, ParseOptions, parse_variables};

lazy_static! {
    static ref SINGLE_VARIABLE: Regex = Regex::new(r"^\{\{([^{}]+)\}\}$").unwrap();
    static ref INDEXED_NAME: Regex = Regex::new(r"^(.+)\[(\d+)\]$").unwrap();
}

pub fn find_variable_by_id<'a>(variables: &'a [Variable], id: &str) -> Option<&'a Variable> {
    variables.iter().find(|variable| variable.id == id)
}

/// First variable with this exact name, whether or not it holds a value.
pub fn find_variable_by_name<'a>(variables: &'a [Variable], name: &str) -> Option<&'a Variable> {
    variables.iter().find(|variable| variable.name == name)
}

/// Resolves a name to a value.
///
/// The first variable with that exact name *and* a value wins. When nothing
/// matches and the name looks like `list[N]`, element `N` of the list
/// variable `list` is returned instead.
pub fn resolve_variable(variables: &[Variable], name: &str) -> Option<VariableValue> {
    if let Some(value) = variables
        .iter()
        .find(|variable| variable.name == name && variable.value.is_some())
        .and_then(|variable| variable.value.clone())
    {
        return Some(value);
    }
    resolve_indexed(variables, name)
}

fn resolve_indexed(variables: &[Variable], name: &str) -> Option<VariableValue> {
    let captures = INDEXED_NAME.captures(name)?;
    let list_name = captures.get(1)?.as_str();
    let index: usize = captures.get(2)?.as_str().parse().ok()?;
    let list = variables
        .iter()
        .find(|variable| variable.name == list_name && variable.value.is_some())?;
    match list.value.as_ref()? {
        VariableValue::List(items) => items.get(index).cloned().map(VariableValue::Text),
        VariableValue::Text(_) => None,
    }
}

/// Name of the variable referenced when `text` is exactly one `{{name}}`.
pub fn single_variable_name(text: &str) -> Option<&str> {
    SINGLE_VARIABLE
        .captures(text.trim())
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().trim())
}

/// Value of the variable when `text` is exactly `{{name}}`, keeping lists as
/// lists instead of joining them.
pub fn find_unique_variable_value(variables: &[Variable], text: &str) -> Option<VariableValue> {
    single_variable_name(text).and_then(|name| resolve_variable(variables, name))
}

/// Variables referenced by name anywhere in `text`, in order of first use.
pub fn extract_variables_from_text<'a>(variables: &'a [Variable], text: &str) -> Vec<&'a Variable> {
    let mut found: Vec<&Variable> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(text) {
        let Some(name) = captures.get(1).map(|name| name.as_str().trim()) else {
            continue;
        };
        if let Some(variable) = find_variable_by_name(variables, name) {
            if !found.iter().any(|existing| existing.id == variable.id) {
                found.push(variable);
            }
        }
    }
    found
}

/// Reads a number that is either a JSON number or a (possibly templated)
/// string.
pub fn parse_variable_number(variables: &[Variable], value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => parse_variables(variables, text, &ParseOptions::default())
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite()),
        _ => None,
    }
}
