//! Integration blocks: outbound webhooks, chat completions and analytics.
//!
//! Executors never fail a turn. Transport errors, missing records and missing
//! credentials are reported as error logs in the block outcome and the walk
//! continues on the block's outgoing edge.

pub mod analytics;
pub mod openai;
pub mod webhook;

use crate::config::EngineConfig;
use crate::engine::BlockOutcome;
use crate::provider::ChatCompletionClient;
use crate::schema::{IntegrationBlock, SessionState};
use crate::store::{SecretStore, WebhookStore};

pub use openai::resume_chat_completion;
pub use webhook::{resume_webhook_execution, subscribe_webhook};

/// Collaborators borrowed by integration executors for the duration of a
/// block.
pub struct IntegrationContext<'a> {
    pub config: &'a EngineConfig,
    pub http: &'a reqwest::Client,
    pub webhooks: &'a dyn WebhookStore,
    pub secrets: &'a dyn SecretStore,
    pub chat_client: &'a dyn ChatCompletionClient,
}

pub async fn execute_integration_block(
    ctx: &IntegrationContext<'_>,
    state: &SessionState,
    block_id: &str,
    block: &IntegrationBlock,
) -> BlockOutcome {
    match block {
        IntegrationBlock::Webhook(webhook)
        | IntegrationBlock::Zapier(webhook)
        | IntegrationBlock::Make(webhook)
        | IntegrationBlock::Pabbly(webhook) => {
            webhook::execute_webhook_block(ctx, state, webhook).await
        }
        IntegrationBlock::OpenAI(block) => {
            openai::create_chat_completion(ctx, state, block_id, &block.options).await
        }
        IntegrationBlock::GoogleAnalytics(block) => {
            analytics::execute_google_analytics(state, &block.options)
        }
    }
}
