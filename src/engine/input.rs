//! Input rendering and answer validation.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::schema::{ChoiceItem, InputBlock, InputType, RenderedInput, SessionState, VariableValue};
use crate::variables::{
    DeepParseOptions, ParseOptions, deep_parse_variables, find_variable_by_id, parse_variables,
};

lazy_static! {
    static ref EMAIL: Regex = Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#
    )
    .unwrap();
    static ref URL: Regex =
        Regex::new(r"^(https?://)?([\da-zA-Z.-]+)\.([a-zA-Z.]{2,6})([/\w .?=&%#:@+~-]*)*/?$")
            .unwrap();
    static ref PHONE: Regex = Regex::new(r"^\+?[0-9]{6,15}$").unwrap();
    static ref PHONE_SEPARATORS: Regex = Regex::new(r"[\s().-]").unwrap();
    static ref MULTIPLE_CHOICE_SEPARATOR: Regex = Regex::new(r",\s?").unwrap();
}

const NUMERIC_OPTIONS: [&str; 3] = ["min", "max", "step"];

/// Renders a pending input for the client.
///
/// Options and item labels are interpolated. A choice input bound to a
/// dynamic list variable gets one item per element.
pub fn render_input(state: &SessionState, block_id: &str, input: &InputBlock) -> RenderedInput {
    let variables = state.variables();

    let raw_options = serde_json::to_value(&input.options).unwrap_or_default();
    let mut options = deep_parse_variables(variables, &raw_options, &DeepParseOptions::default());
    if input.kind == InputType::Number {
        coerce_numeric_options(&mut options);
    }

    let prefilled_value = input
        .options
        .variable_id
        .as_deref()
        .and_then(|id| find_variable_by_id(variables, id))
        .and_then(|variable| variable.value.as_ref())
        .and_then(VariableValue::as_text)
        .map(str::to_string);

    RenderedInput {
        id: block_id.to_string(),
        kind: input.kind.to_string(),
        options,
        items: render_items(state, input),
        prefilled_value,
    }
}

fn render_items(state: &SessionState, input: &InputBlock) -> Vec<ChoiceItem> {
    let variables = state.variables();
    let dynamic = input
        .options
        .dynamic_variable_id
        .as_deref()
        .and_then(|id| find_variable_by_id(variables, id))
        .and_then(|variable| variable.value.as_ref())
        .and_then(VariableValue::as_list);

    if let Some(values) = dynamic {
        return values
            .iter()
            .enumerate()
            .map(|(index, value)| ChoiceItem::new(format!("choice{}", index), value.as_str()))
            .collect();
    }

    input
        .items
        .iter()
        .map(|item| ChoiceItem {
            content: item
                .content
                .as_deref()
                .map(|content| parse_variables(variables, content, &ParseOptions::default())),
            ..item.clone()
        })
        .collect()
}

/// Number options may be authored as strings or templates. Blank ones are
/// dropped.
fn coerce_numeric_options(options: &mut JsonValue) {
    let Some(map) = options.as_object_mut() else {
        return;
    };
    for key in NUMERIC_OPTIONS {
        let coerced = match map.get(key) {
            Some(JsonValue::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number),
            Some(other) => Some(other.clone()),
            None => continue,
        };
        match coerced {
            Some(value) => map.insert(key.to_string(), value),
            None => map.remove(key),
        };
    }
}

/// A reply that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnswer {
    /// Stored form of the answer. Choice replies are normalized to the
    /// item labels.
    pub content: String,
    /// Edge of the chosen item, for single choice inputs.
    pub item_edge_id: Option<String>,
}

/// Validates `reply` against the input kind. `items` are the rendered items.
pub fn validate_answer(
    input: &InputBlock,
    items: &[ChoiceItem],
    reply: &str,
) -> Option<ValidatedAnswer> {
    let accepted = |content: &str| ValidatedAnswer {
        content: content.to_string(),
        item_edge_id: None,
    };
    let trimmed = reply.trim();
    match input.kind {
        InputType::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|_| accepted(trimmed)),
        InputType::Email => EMAIL.is_match(trimmed).then(|| accepted(trimmed)),
        InputType::Url => URL.is_match(trimmed).then(|| accepted(trimmed)),
        InputType::Phone => {
            let digits = PHONE_SEPARATORS.replace_all(trimmed, "");
            PHONE.is_match(&digits).then(|| accepted(trimmed))
        }
        InputType::Choice | InputType::PictureChoice => validate_choice(input, items, trimmed),
        InputType::Text
        | InputType::Date
        | InputType::Payment
        | InputType::Rating
        | InputType::File => Some(accepted(reply)),
    }
}

fn validate_choice(
    input: &InputBlock,
    items: &[ChoiceItem],
    reply: &str,
) -> Option<ValidatedAnswer> {
    if reply.is_empty() {
        return None;
    }
    if input.options.is_multiple_choice == Some(true) {
        let contents = MULTIPLE_CHOICE_SEPARATOR
            .split(reply)
            .map(|part| matching_item(items, part.trim()).and_then(|item| item.content.clone()))
            .collect::<Option<Vec<_>>>()?;
        return Some(ValidatedAnswer {
            content: contents.join(", "),
            item_edge_id: None,
        });
    }
    let item = matching_item(items, reply)?;
    Some(ValidatedAnswer {
        content: item.content.clone().unwrap_or_else(|| reply.to_string()),
        item_edge_id: item.outgoing_edge_id.clone(),
    })
}

/// Items match on their label, ignoring case, or on their id.
fn matching_item<'a>(items: &'a [ChoiceItem], reply: &str) -> Option<&'a ChoiceItem> {
    items.iter().find(|item| {
        item.id == reply
            || item
                .content
                .as_deref()
                .is_some_and(|content| content.trim().eq_ignore_ascii_case(reply))
    })
}
