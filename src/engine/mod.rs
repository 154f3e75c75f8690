//! Conversation turns.
//!
//! [`FlowEngine`] owns the collaborators (stores, chat completion client,
//! HTTP client) and runs turns against a [`SessionState`] passed by value.
//! It never persists anything itself: the returned [`TurnResult`] carries the
//! state the caller must store before the next turn of the same session.
//!
//! # Usage Example
//!
//! ```no_run
//! use chatflow::config::EngineConfig;
//! use chatflow::store::InMemoryStore;
//! use chatflow::{FlowEngine, StartParams, TurnStatus};
//!
//! # async fn example(store: InMemoryStore) -> chatflow::InternalResult<()> {
//! let engine = FlowEngine::in_memory(EngineConfig::default(), store);
//! let mut turn = engine.start_session("my-typebot", StartParams::default()).await?;
//! while turn.status == TurnStatus::AwaitingInput {
//!     turn = engine.continue_session(turn.new_session_state, "Hello").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod bubble;
pub mod continue_flow;
pub mod input;
pub mod outcome;
pub mod walker;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::InternalResult;
use crate::integrations::{IntegrationContext, subscribe_webhook};
use crate::provider::{ChatCompletionClient, OpenAIChatClient};
use crate::schema::{
    ChatReply, ResultInSession, SessionState, Typebot, VariableUpdate, VariableValue, Webhook,
};
use crate::store::{InMemoryStore, SecretStore, TypebotStore, WebhookStore};
use crate::variables::find_variable_by_name;

pub use outcome::BlockOutcome;
pub use walker::{Cursor, ReplyAccumulator, Walker};

use continue_flow::{Resumption, next_cursor, resume_block};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Typebot not found: {0}")]
    TypebotNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Session has no current block to resume from")]
    MissingCurrentBlock,

    #[error("Block {0} is not a webhook block")]
    NotAWebhookBlock(String),
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TurnStatus {
    /// No outgoing edge left. The session is over.
    Terminated,
    /// An input block waits for the user's answer.
    AwaitingInput,
    /// A client-side action must be reported back before going on.
    AwaitingClientAction,
}

#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: ChatReply,
    /// State to persist. Carries the `currentBlock` anchor unless the turn
    /// terminated.
    pub new_session_state: SessionState,
    pub status: TurnStatus,
}

#[derive(Debug, Clone, Default)]
pub struct StartParams {
    /// Initial values keyed by variable name. Unknown names are ignored.
    pub prefilled_variables: HashMap<String, String>,
    /// Group to start from instead of the start event's target.
    pub start_group_id: Option<String>,
    /// Preview sessions record no result.
    pub is_preview: bool,
    pub is_stream_enabled: bool,
}

pub struct FlowEngine {
    config: EngineConfig,
    typebots: Arc<dyn TypebotStore>,
    webhooks: Arc<dyn WebhookStore>,
    secrets: Arc<dyn SecretStore>,
    chat_client: Arc<dyn ChatCompletionClient>,
    http: reqwest::Client,
}

impl FlowEngine {
    pub fn new(
        config: EngineConfig,
        typebots: Arc<dyn TypebotStore>,
        webhooks: Arc<dyn WebhookStore>,
        secrets: Arc<dyn SecretStore>,
        chat_client: Arc<dyn ChatCompletionClient>,
    ) -> Self {
        Self {
            config,
            typebots,
            webhooks,
            secrets,
            chat_client,
            http: reqwest::Client::new(),
        }
    }

    /// Engine backed by a single in-memory store and the OpenAI client.
    pub fn in_memory(config: EngineConfig, store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        let chat_client = Arc::new(OpenAIChatClient::new(config.chat_completion.clone()));
        Self::new(config, store.clone(), store.clone(), store, chat_client)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn walker(&self) -> Walker<'_> {
        Walker::new(IntegrationContext {
            config: &self.config,
            http: &self.http,
            webhooks: self.webhooks.as_ref(),
            secrets: self.secrets.as_ref(),
            chat_client: self.chat_client.as_ref(),
        })
    }

    /// Loads a typebot and runs the first turn of a new session.
    #[tracing::instrument(skip(self, params), level = "debug")]
    pub async fn start_session(
        &self,
        typebot_id: &str,
        params: StartParams,
    ) -> InternalResult<TurnResult> {
        let typebot = self
            .typebots
            .find_typebot(typebot_id)
            .await?
            .ok_or_else(|| EngineError::TypebotNotFound(typebot_id.to_string()))?;
        self.start_from_typebot(typebot, params).await
    }

    /// Runs the first turn of a new session on a caller supplied graph.
    #[tracing::instrument(skip(self, typebot, params), fields(typebot_id = %typebot.id), level = "debug")]
    pub async fn start_from_typebot(
        &self,
        typebot: Typebot,
        params: StartParams,
    ) -> InternalResult<TurnResult> {
        let cursor = start_cursor(&typebot, params.start_group_id.as_deref())?;

        let mut state = SessionState::new(typebot);
        state.is_stream_enabled = params.is_stream_enabled;
        let updates = prefilled_updates(&state, &params.prefilled_variables);
        if !updates.is_empty() {
            state = state.with_updated_variables(&updates);
        }
        if !params.is_preview {
            // Results start with every variable that already holds a value.
            state.result = Some(ResultInSession {
                id: Uuid::new_v4().to_string(),
                variables: state
                    .variables()
                    .iter()
                    .filter(|variable| variable.value.is_some())
                    .cloned()
                    .collect(),
                ..Default::default()
            });
        }

        info!("Starting session on typebot {}", state.typebot.id);
        Ok(self
            .walker()
            .walk(state, cursor, ReplyAccumulator::new())
            .await)
    }

    /// Resumes a session at its `currentBlock` anchor with the user's answer
    /// or the outcome of a client-side action.
    #[tracing::instrument(skip(self, state, reply), level = "debug")]
    pub async fn continue_session(
        &self,
        state: SessionState,
        reply: &str,
    ) -> InternalResult<TurnResult> {
        let anchor = state
            .current_block
            .clone()
            .ok_or(EngineError::MissingCurrentBlock)?;
        let (group_id, block_index, block) = state
            .typebot
            .find_block(&anchor.block_id)
            .map(|(group, index, block)| (group.id.clone(), index, block.clone()))
            .ok_or_else(|| EngineError::BlockNotFound(anchor.block_id.clone()))?;
        debug!("Resuming at block {} of group {}", block.id, group_id);

        let (state, logs, item_edge_id) = match resume_block(state, &group_id, &block, reply) {
            Resumption::Retry(turn) => return Ok(turn),
            Resumption::Proceed {
                state,
                logs,
                item_edge_id,
            } => (state, logs, item_edge_id),
        };

        let edge_id = item_edge_id.or_else(|| block.outgoing_edge_id.clone());
        let cursor = next_cursor(&state, &group_id, block_index, edge_id.as_deref());
        Ok(self
            .walker()
            .walk(
                state.with_current_block(None),
                cursor,
                ReplyAccumulator::with_logs(logs),
            )
            .await)
    }

    /// Points the webhook record of a webhook-like block at `url`.
    pub async fn subscribe_webhook(
        &self,
        typebot_id: &str,
        block_id: &str,
        url: &str,
    ) -> InternalResult<Webhook> {
        let typebot = self
            .typebots
            .find_typebot(typebot_id)
            .await?
            .ok_or_else(|| EngineError::TypebotNotFound(typebot_id.to_string()))?;
        subscribe_webhook(self.webhooks.as_ref(), &typebot, block_id, url).await
    }
}

/// The explicit group, else the group holding the start event, else the
/// first group.
fn start_cursor(typebot: &Typebot, start_group_id: Option<&str>) -> InternalResult<Option<Cursor>> {
    if let Some(group_id) = start_group_id {
        return match typebot.find_group(group_id) {
            Some(group) => Ok(Some(Cursor::new(group.id.clone(), 0))),
            None => Err(EngineError::GroupNotFound(group_id.to_string()).into()),
        };
    }
    let start_group = typebot
        .start_block()
        .and_then(|block| typebot.find_block(&block.id))
        .map(|(group, _, _)| group)
        .or_else(|| typebot.groups.first());
    Ok(start_group.map(|group| Cursor::new(group.id.clone(), 0)))
}

fn prefilled_updates(
    state: &SessionState,
    prefilled: &HashMap<String, String>,
) -> Vec<VariableUpdate> {
    prefilled
        .iter()
        .filter_map(|(name, value)| {
            let variable = find_variable_by_name(state.variables(), name)?;
            Some(VariableUpdate::new(
                variable.id.clone(),
                Some(VariableValue::Text(value.clone())),
            ))
        })
        .collect()
}
