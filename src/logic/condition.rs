use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::schema::{
    Comparison, ComparisonOperator, Condition, ConditionBlock, LogicalOperator, Variable,
    VariableValue,
};
use crate::variables::{
    ParseOptions, find_unique_variable_value, find_variable_by_id, parse_variables,
};

/// Evaluates a condition against the current variables.
///
/// `AND` requires every comparison to pass and `OR` at least one. Malformed
/// comparisons evaluate to false.
pub fn execute_condition(variables: &[Variable], condition: &Condition) -> bool {
    match condition.logical_operator {
        LogicalOperator::And => condition
            .comparisons
            .iter()
            .all(|comparison| execute_comparison(variables, comparison)),
        LogicalOperator::Or => condition
            .comparisons
            .iter()
            .any(|comparison| execute_comparison(variables, comparison)),
    }
}

/// Edge of the first item whose condition passes.
pub fn find_passing_item_edge(variables: &[Variable], block: &ConditionBlock) -> Option<String> {
    block
        .items
        .iter()
        .find(|item| execute_condition(variables, &item.content))
        .and_then(|item| item.outgoing_edge_id.clone())
}

pub fn execute_comparison(variables: &[Variable], comparison: &Comparison) -> bool {
    let Some(variable_id) = comparison.variable_id.as_deref() else {
        return false;
    };
    let Some(operator) = comparison.comparison_operator else {
        return false;
    };
    let input = find_variable_by_id(variables, variable_id).and_then(|variable| variable.value.clone());
    let comparand = resolve_comparand(variables, comparison.value.as_deref());
    compare_values(operator, input.as_ref(), comparand.as_ref())
}

/// A literal, the value of the variable it references, or the literal after
/// interpolation. `"undefined"` and `"null"` mean no value.
fn resolve_comparand(variables: &[Variable], value: Option<&str>) -> Option<VariableValue> {
    let value = value?;
    if value == "undefined" || value == "null" {
        return None;
    }
    find_unique_variable_value(variables, value).or_else(|| {
        Some(VariableValue::Text(parse_variables(
            variables,
            value,
            &ParseOptions::default(),
        )))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    Every,
    Some,
}

pub fn compare_values(
    operator: ComparisonOperator,
    input: Option<&VariableValue>,
    comparand: Option<&VariableValue>,
) -> bool {
    use ComparisonOperator::*;
    match operator {
        Contains => compare(contains, input, comparand, Quantifier::Some),
        NotContains => {
            if is_blank(input) || is_blank(comparand) {
                return true;
            }
            compare(
                |a, b| match (a, b) {
                    (Some(a), Some(b)) if !b.is_empty() => !normalize(a).contains(&normalize(b)),
                    _ => true,
                },
                input,
                comparand,
                Quantifier::Some,
            )
        }
        Equal => compare(|a, b| a == b, input, comparand, Quantifier::Every),
        NotEqual => compare(|a, b| a != b, input, comparand, Quantifier::Every),
        Greater => order(input, comparand).is_some_and(|(a, b)| a > b),
        Less => order(input, comparand).is_some_and(|(a, b)| a < b),
        IsSet => input.is_some_and(|value| !value.is_empty()),
        IsEmpty => input.is_none_or(VariableValue::is_empty),
        StartsWith => compare(
            |a, b| match (a, b) {
                (Some(a), Some(b)) if !b.is_empty() => normalize(a).starts_with(&normalize(b)),
                _ => false,
            },
            input,
            comparand,
            Quantifier::Every,
        ),
        EndsWith => compare(
            |a, b| match (a, b) {
                (Some(a), Some(b)) if !b.is_empty() => normalize(a).ends_with(&normalize(b)),
                _ => false,
            },
            input,
            comparand,
            Quantifier::Every,
        ),
        Unknown => false,
    }
}

fn contains(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !b.is_empty() && !a.is_empty() => {
            normalize(a).contains(&normalize(b))
        }
        _ => false,
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Applies a scalar predicate across list shapes. A list on either side is
/// iterated with the given quantifier; two lists compare pairwise.
fn compare<F>(
    predicate: F,
    a: Option<&VariableValue>,
    b: Option<&VariableValue>,
    quantifier: Quantifier,
) -> bool
where
    F: Fn(Option<&str>, Option<&str>) -> bool,
{
    match (a, b) {
        (Some(VariableValue::List(a)), Some(VariableValue::List(b))) => quantify(
            quantifier,
            a.iter().map(|a| {
                quantify(
                    quantifier,
                    b.iter().map(|b| predicate(Some(a), Some(b))),
                )
            }),
        ),
        (Some(VariableValue::List(a)), b) => {
            let b = b.and_then(VariableValue::as_text);
            quantify(quantifier, a.iter().map(|a| predicate(Some(a), b)))
        }
        (a, Some(VariableValue::List(b))) => {
            let a = a.and_then(VariableValue::as_text);
            quantify(quantifier, b.iter().map(|b| predicate(a, Some(b))))
        }
        (a, b) => predicate(
            a.and_then(VariableValue::as_text),
            b.and_then(VariableValue::as_text),
        ),
    }
}

fn quantify<I: Iterator<Item = bool>>(quantifier: Quantifier, mut items: I) -> bool {
    match quantifier {
        Quantifier::Every => items.all(|passed| passed),
        Quantifier::Some => items.any(|passed| passed),
    }
}

/// Missing, empty text or an empty list.
fn is_blank(value: Option<&VariableValue>) -> bool {
    value.is_none_or(VariableValue::is_empty)
}

/// Numeric operands of an ordering comparison. Text against text compares
/// numbers or dates; anything involving a list compares its length.
fn order(a: Option<&VariableValue>, b: Option<&VariableValue>) -> Option<(f64, f64)> {
    let (a, b) = (a?, b?);
    match (a, b) {
        (VariableValue::Text(a), VariableValue::Text(b)) => {
            Some((parse_date_or_number(a)?, parse_date_or_number(b)?))
        }
        (VariableValue::Text(a), VariableValue::List(b)) => {
            Some((parse_number(a)?, b.len() as f64))
        }
        (VariableValue::List(a), VariableValue::Text(b)) => {
            Some((a.len() as f64, parse_number(b)?))
        }
        (VariableValue::List(a), VariableValue::List(b)) => Some((a.len() as f64, b.len() as f64)),
    }
}

/// Empty text counts as zero.
fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|number| !number.is_nan())
}

/// Number, or a date as milliseconds since the epoch.
pub fn parse_date_or_number(value: &str) -> Option<f64> {
    parse_number(value).or_else(|| parse_timestamp_millis(value.trim()).map(|millis| millis as f64))
}

fn parse_timestamp_millis(value: &str) -> Option<i64> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date_time.and_utc().timestamp_millis());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|date_time| date_time.and_utc().timestamp_millis());
        }
    }
    None
}
