//! OpenAI chat completion block.

use tracing::{debug, warn};

use crate::engine::BlockOutcome;
use crate::provider::ChatCompletionRequest;
use crate::schema::{
    ChatCompletionMessage, ChatCompletionMessageOption, ChatRole, ClientSideAction,
    ClientSideActionKind, LogDetails, OpenAIOptions, ReplyLog, SessionState,
    StreamChatCompletionAction, Typebot, ValueToExtract, Variable, VariableUpdate, VariableValue,
};
use crate::variables::{
    ParseOptions, find_unique_variable_value, find_variable_by_id, parse_variable_number,
    parse_variables,
};

use super::IntegrationContext;

const NO_CREDENTIALS: &str = "Make sure to select an OpenAI account";

#[tracing::instrument(skip(ctx, state, options), level = "debug")]
pub async fn create_chat_completion(
    ctx: &IntegrationContext<'_>,
    state: &SessionState,
    block_id: &str,
    options: &OpenAIOptions,
) -> BlockOutcome {
    let Some(credentials_id) = options.credentials_id.as_deref() else {
        return BlockOutcome::new().with_log(ReplyLog::error(NO_CREDENTIALS));
    };
    let secret = match ctx.secrets.decrypt(credentials_id).await {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            warn!("Credentials {} not found", credentials_id);
            return BlockOutcome::new().with_log(ReplyLog::error(NO_CREDENTIALS));
        }
        Err(e) => {
            warn!("Failed to decrypt credentials {}: {}", credentials_id, e);
            return BlockOutcome::new().with_log(ReplyLog::error(NO_CREDENTIALS));
        }
    };

    let (transformed, messages) =
        parse_chat_completion_messages(state.variables(), &options.messages);
    let state = if transformed.is_empty() {
        state.clone()
    } else {
        state.with_updated_variables(&transformed)
    };

    let temperature = options
        .advanced_settings
        .as_ref()
        .and_then(|settings| settings.temperature.as_ref())
        .and_then(|temperature| parse_variable_number(state.variables(), temperature))
        .map(|temperature| temperature as f32);

    if state.is_stream_enabled && ctx.config.chat_completion.streaming_supported {
        let display_stream = assistant_variable_name(state.variables(), options)
            .is_some_and(|name| is_next_bubble_placeholder(&state.typebot, block_id, name));
        debug!("Streaming chat completion, display_stream={}", display_stream);
        return BlockOutcome::new()
            .with_action(ClientSideAction::new(
                ClientSideActionKind::StreamChatCompletion(StreamChatCompletionAction {
                    messages,
                    display_stream,
                }),
            ))
            .with_state(state);
    }

    let request = ChatCompletionRequest {
        model: options
            .model
            .clone()
            .unwrap_or_else(|| ctx.config.chat_completion.default_model.clone()),
        messages,
        temperature,
    };
    let response = match ctx
        .chat_client
        .create_chat_completion(&secret, &request)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("Chat completion failed: {}", e);
            return BlockOutcome::new().with_log(
                ReplyLog::error("OpenAI block returned error").with_details(LogDetails {
                    message: Some(e.to_string()),
                    ..Default::default()
                }),
            );
        }
    };

    match response.content.filter(|content| !content.is_empty()) {
        Some(content) => resume_chat_completion(&state, options, &content, response.total_tokens),
        None => {
            warn!("Chat completion returned an empty message");
            BlockOutcome::new().with_state(state)
        }
    }
}

/// Renders the message templates.
///
/// A message whose content is exactly a list variable becomes one message per
/// element. A messages sequence interleaves the user and assistant lists, the
/// longer one leading. Scalar variables used by a sequence are converted to
/// lists; those conversions are returned alongside the messages.
pub fn parse_chat_completion_messages(
    variables: &[Variable],
    options: &[ChatCompletionMessageOption],
) -> (Vec<VariableUpdate>, Vec<ChatCompletionMessage>) {
    let mut transformed = Vec::new();
    let mut messages = Vec::new();

    for option in options {
        let (role, content) = match option {
            ChatCompletionMessageOption::System(message) => (ChatRole::System, &message.content),
            ChatCompletionMessageOption::User(message) => (ChatRole::User, &message.content),
            ChatCompletionMessageOption::Assistant(message) => {
                (ChatRole::Assistant, &message.content)
            }
            ChatCompletionMessageOption::MessagesSequence(sequence) => {
                let user = sequence_list(
                    variables,
                    sequence.content.user_messages_variable_id.as_deref(),
                    &mut transformed,
                );
                let assistant = sequence_list(
                    variables,
                    sequence.content.assistant_messages_variable_id.as_deref(),
                    &mut transformed,
                );
                messages.extend(interleave(&user, &assistant));
                continue;
            }
        };
        let Some(content) = content.as_deref() else {
            continue;
        };
        match find_unique_variable_value(variables, content) {
            Some(VariableValue::List(items)) => messages.extend(
                items
                    .into_iter()
                    .map(|item| ChatCompletionMessage::new(role, item)),
            ),
            _ => messages.push(ChatCompletionMessage::new(
                role,
                parse_variables(variables, content, &ParseOptions::default()),
            )),
        }
    }

    messages.retain(|message| !message.content.is_empty());
    (transformed, messages)
}

fn sequence_list(
    variables: &[Variable],
    variable_id: Option<&str>,
    transformed: &mut Vec<VariableUpdate>,
) -> Vec<String> {
    let Some(variable) = variable_id.and_then(|id| find_variable_by_id(variables, id)) else {
        return Vec::new();
    };
    match &variable.value {
        Some(VariableValue::List(items)) => items.clone(),
        Some(VariableValue::Text(text)) => {
            let list = vec![text.clone()];
            transformed.push(VariableUpdate::new(
                variable.id.clone(),
                Some(VariableValue::List(list.clone())),
            ));
            list
        }
        None => Vec::new(),
    }
}

fn interleave(user: &[String], assistant: &[String]) -> Vec<ChatCompletionMessage> {
    let (leading, leading_role, following, following_role) = if user.len() > assistant.len() {
        (user, ChatRole::User, assistant, ChatRole::Assistant)
    } else {
        (assistant, ChatRole::Assistant, user, ChatRole::User)
    };
    leading
        .iter()
        .enumerate()
        .flat_map(|(index, content)| {
            let mut pair = vec![ChatCompletionMessage::new(leading_role, content.clone())];
            if let Some(reply) = following.get(index) {
                pair.push(ChatCompletionMessage::new(following_role, reply.clone()));
            }
            pair
        })
        .collect()
}

fn assistant_variable_name<'a>(
    variables: &'a [Variable],
    options: &OpenAIOptions,
) -> Option<&'a str> {
    options
        .response_mapping
        .iter()
        .find(|mapping| mapping.value_to_extract == ValueToExtract::MessageContent)
        .and_then(|mapping| mapping.variable_id.as_deref())
        .and_then(|id| find_variable_by_id(variables, id))
        .map(|variable| variable.name.as_str())
}

/// True when the block after `block_id` is a text bubble showing only the
/// streamed assistant message.
fn is_next_bubble_placeholder(typebot: &Typebot, block_id: &str, variable_name: &str) -> bool {
    let placeholder = format!("{{{{{}}}}}", variable_name);
    typebot
        .next_block(block_id)
        .and_then(|block| block.as_bubble())
        .and_then(|bubble| bubble.first_text())
        .is_some_and(|text| text == placeholder)
}

/// Writes a completion into the mapped variables. Message content is appended
/// when the target already holds a list.
pub fn resume_chat_completion(
    state: &SessionState,
    options: &OpenAIOptions,
    content: &str,
    total_tokens: Option<u32>,
) -> BlockOutcome {
    let variables = state.variables();
    let updates: Vec<VariableUpdate> = options
        .response_mapping
        .iter()
        .filter_map(|mapping| {
            let variable = find_variable_by_id(variables, mapping.variable_id.as_deref()?)?;
            let value = match mapping.value_to_extract {
                ValueToExtract::MessageContent => match &variable.value {
                    Some(VariableValue::List(items)) => {
                        let mut items = items.clone();
                        items.push(content.to_string());
                        VariableValue::List(items)
                    }
                    _ => VariableValue::Text(content.to_string()),
                },
                ValueToExtract::TotalTokens => VariableValue::Text(total_tokens?.to_string()),
            };
            Some(VariableUpdate::new(variable.id.clone(), Some(value)))
        })
        .collect();

    BlockOutcome::new().with_state(state.with_updated_variables(&updates))
}
