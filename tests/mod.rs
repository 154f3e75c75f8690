
use std::sync::Arc;

use chatflow::{
    Block, BlockKind, BubbleBlock, ChatReply, FlowEngine, Typebot,
    config::{self, EngineConfig},
    provider::MockChatCompletionClient,
    store::InMemoryStore,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

const FIXTURES_DIR: &str = "tests/fixtures";

pub fn load_typebot(name: &str) -> Typebot {
    config::from_file(format!("{}/{}.json", FIXTURES_DIR, name)).unwrap()
}

/// Engine whose chat completion client fails the test if it is called.
pub fn engine(store: InMemoryStore) -> FlowEngine {
    engine_with(EngineConfig::default(), store, MockChatCompletionClient::new())
}

pub fn engine_with(
    config: EngineConfig,
    store: InMemoryStore,
    chat_client: MockChatCompletionClient,
) -> FlowEngine {
    let store = Arc::new(store);
    FlowEngine::new(
        config,
        store.clone(),
        store.clone(),
        store,
        Arc::new(chat_client),
    )
}

pub fn text_block(id: &str, text: &str) -> Block {
    Block::new(id, BlockKind::Bubble(BubbleBlock::text(text)))
}

/// Plain text of every message in the reply.
pub fn texts(reply: &ChatReply) -> Vec<String> {
    reply
        .messages
        .iter()
        .filter_map(|message| message.content.get("plainText"))
        .filter_map(|text| text.as_str())
        .map(str::to_string)
        .collect()
}
