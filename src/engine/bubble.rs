use serde_json::Value as JsonValue;

use crate::schema::{BubbleBlock, BubbleType, ChatMessage, Variable};
use crate::variables::{DeepParseOptions, deep_parse_variables};

/// Renders a bubble block into a reply message.
///
/// Text bubbles show the latest element of list variables. Embed heights
/// authored as strings are sent as numbers.
pub fn render_bubble(variables: &[Variable], block_id: &str, bubble: &BubbleBlock) -> ChatMessage {
    let options = DeepParseOptions {
        take_latest_if_list: bubble.kind == BubbleType::Text,
        ..Default::default()
    };
    let mut content = deep_parse_variables(variables, &bubble.content, &options);

    if bubble.kind == BubbleType::Embed {
        if let Some(height) = content.get_mut("height") {
            if let Some(parsed) = height.as_str().and_then(parse_leading_float) {
                *height = parsed;
            }
        }
    }

    ChatMessage {
        id: block_id.to_string(),
        kind: bubble.kind.to_string(),
        content,
    }
}

/// `"400px"` is read as 400, like a lenient float parser would.
fn parse_leading_float(text: &str) -> Option<JsonValue> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|&(index, c)| !(c.is_ascii_digit() || c == '.' || (index == 0 && c == '-')))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    trimmed
        .get(..end)?
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
}
