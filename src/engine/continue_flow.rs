//! Resumption from a persisted `currentBlock` anchor.

use serde_json::json;
use tracing::{debug, warn};

use crate::integrations::{resume_chat_completion, resume_webhook_execution};
use crate::logic::resume_set_variable;
use crate::schema::{
    Answer, Block, BlockKind, ChatMessage, ChatReply, InputBlock, IntegrationBlock, LogicBlock,
    ReplyLog, SessionState, VariableUpdate, VariableValue, WebhookResponse,
};
use crate::variables::find_variable_by_id;

use super::input::{render_input, validate_answer};
use super::walker::Cursor;
use super::{TurnResult, TurnStatus};

/// What to do once the anchored block has consumed the reply.
#[derive(Debug)]
pub enum Resumption {
    /// The answer was rejected; the turn is already complete.
    Retry(TurnResult),
    /// Walk on with this state and these logs.
    Proceed {
        state: SessionState,
        logs: Vec<ReplyLog>,
        item_edge_id: Option<String>,
    },
}

/// Applies the reply to the anchored block.
pub fn resume_block(
    state: SessionState,
    group_id: &str,
    block: &Block,
    reply: &str,
) -> Resumption {
    match &block.kind {
        BlockKind::Input(input) => resume_input(state, group_id, block, input, reply),
        BlockKind::Integration(IntegrationBlock::OpenAI(openai)) => {
            let outcome = resume_chat_completion(&state, &openai.options, reply, None);
            proceed(state, outcome.new_session_state, outcome.logs)
        }
        BlockKind::Integration(integration) => match integration.as_webhook() {
            Some(webhook) => {
                let response = parse_client_response(reply);
                let outcome =
                    resume_webhook_execution(&state, &webhook.options, &response, Vec::new());
                proceed(state, outcome.new_session_state, outcome.logs)
            }
            None => proceed(state, None, Vec::new()),
        },
        BlockKind::Logic(LogicBlock::SetVariable(set_variable)) => {
            let state = resume_set_variable(&state, &set_variable.options, reply);
            proceed(state, None, Vec::new())
        }
        _ => {
            debug!("Block {} does not consume replies", block.id);
            proceed(state, None, Vec::new())
        }
    }
}

fn proceed(
    state: SessionState,
    new_state: Option<SessionState>,
    logs: Vec<ReplyLog>,
) -> Resumption {
    Resumption::Proceed {
        state: new_state.unwrap_or(state),
        logs,
        item_edge_id: None,
    }
}

/// Clients report webhook results as `{statusCode, data}`.
fn parse_client_response(reply: &str) -> WebhookResponse {
    serde_json::from_str(reply).unwrap_or_else(|e| {
        warn!("Unreadable webhook response from client: {}", e);
        WebhookResponse {
            status_code: 500,
            data: json!({"message": reply}),
        }
    })
}

fn resume_input(
    state: SessionState,
    group_id: &str,
    block: &Block,
    input: &InputBlock,
    reply: &str,
) -> Resumption {
    let rendered = render_input(&state, &block.id, input);
    let Some(answer) = validate_answer(input, &rendered.items, reply) else {
        debug!("Invalid answer for {}", block.id);
        let retry = ChatMessage {
            id: block.id.clone(),
            kind: "text".to_string(),
            content: json!({
                "richText": [{"type": "p", "children": [{"text": input.retry_message()}]}],
                "plainText": input.retry_message(),
            }),
        };
        return Resumption::Retry(TurnResult {
            reply: ChatReply {
                messages: vec![retry],
                input: Some(rendered),
                ..Default::default()
            },
            new_session_state: state,
            status: TurnStatus::AwaitingInput,
        });
    };

    let state = save_answer(state, group_id, block, input, &answer.content);
    Resumption::Proceed {
        state,
        logs: Vec::new(),
        item_edge_id: answer.item_edge_id,
    }
}

/// Stores the answer in the bound variable, appending when it holds a list,
/// and records it in the result.
fn save_answer(
    state: SessionState,
    group_id: &str,
    block: &Block,
    input: &InputBlock,
    content: &str,
) -> SessionState {
    let variable_id = input.options.variable_id.clone();
    let update = variable_id
        .as_deref()
        .and_then(|id| find_variable_by_id(state.variables(), id))
        .map(|variable| {
            let value = match &variable.value {
                Some(VariableValue::List(items)) => {
                    let mut items = items.clone();
                    items.push(content.to_string());
                    VariableValue::List(items)
                }
                _ => VariableValue::Text(content.to_string()),
            };
            VariableUpdate::new(variable.id.clone(), Some(value))
        });

    let state = match update {
        Some(update) => state.with_updated_variables(&[update]),
        None => state,
    };
    state.with_answer(Answer {
        block_id: block.id.clone(),
        group_id: group_id.to_string(),
        variable_id,
        content: content.to_string(),
    })
}

/// Where the walk continues after the anchored block at `block_index`.
pub fn next_cursor(
    state: &SessionState,
    group_id: &str,
    block_index: usize,
    edge_id: Option<&str>,
) -> Option<Cursor> {
    if let Some(edge_id) = edge_id {
        return super::walker::resolve_edge(&state.typebot, edge_id);
    }
    let group = state.typebot.find_group(group_id)?;
    (block_index + 1 < group.blocks.len()).then(|| Cursor::new(group_id, block_index + 1))
}
