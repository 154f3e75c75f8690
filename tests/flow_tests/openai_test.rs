use std::sync::Arc;

use chatflow::{
    ChatCompletionMessage, ChatRole, ClientSideActionKind, FlowEngine, StartParams, TurnStatus,
    Typebot, VariableValue,
    config::EngineConfig,
    provider::{ChatCompletionResponse, IntegrationSecret, MockChatCompletionClient, ProviderError},
    store::{InMemoryStore, MockSecretStore, StoreError},
};
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use serde_json::json;

use crate::{engine_with, texts};

/// An OpenAI block followed by a bubble showing what it produced.
fn assistant_flow(credentials_id: &str, answer_template: &str) -> Typebot {
    serde_json::from_value(json!({
        "id": "assistant",
        "variables": [
            {"id": "v-name", "name": "Name", "value": "Ada"},
            {"id": "v-user", "name": "UserMessages", "value": ["Hi", "What's the weather?"]},
            {"id": "v-assistant", "name": "Assistant", "value": "Hello Ada!"},
            {"id": "v-tokens", "name": "Tokens"},
            {"id": "v-temp", "name": "Temp", "value": "0.5"}
        ],
        "groups": [{
            "id": "g1",
            "title": "Chat",
            "blocks": [
                {
                    "id": "b-ai",
                    "type": "OpenAI",
                    "options": {
                        "credentialsId": credentials_id,
                        "model": "gpt-4",
                        "messages": [
                            {"role": "system", "content": "You are helping {{Name}}"},
                            {
                                "role": "Messages sequence ✨",
                                "content": {
                                    "userMessagesVariableId": "v-user",
                                    "assistantMessagesVariableId": "v-assistant"
                                }
                            }
                        ],
                        "responseMapping": [
                            {"id": "m1", "valueToExtract": "Message content", "variableId": "v-assistant"},
                            {"id": "m2", "valueToExtract": "Total tokens", "variableId": "v-tokens"}
                        ],
                        "advancedSettings": {"temperature": "{{Temp}}"}
                    }
                },
                {
                    "id": "b-answer",
                    "type": "text",
                    "content": {"plainText": answer_template}
                }
            ]
        }],
        "edges": []
    }))
    .unwrap()
}

fn store_with_credentials() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_secret("cred-1", IntegrationSecret::new("sk-test"));
    store
}

fn variable<'a>(turn: &'a chatflow::TurnResult, id: &str) -> Option<&'a VariableValue> {
    turn.new_session_state
        .typebot
        .variables
        .iter()
        .find(|variable| variable.id == id)
        .and_then(|variable| variable.value.as_ref())
}

#[tokio::test]
async fn test_completion_maps_content_and_tokens() {
    let expected = vec![
        ChatCompletionMessage::new(ChatRole::System, "You are helping Ada"),
        ChatCompletionMessage::new(ChatRole::User, "Hi"),
        ChatCompletionMessage::new(ChatRole::Assistant, "Hello Ada!"),
        ChatCompletionMessage::new(ChatRole::User, "What's the weather?"),
    ];
    let mut client = MockChatCompletionClient::new();
    client
        .expect_create_chat_completion()
        .withf(move |secret, request| {
            secret.api_key.expose_secret() == "sk-test"
                && request.model == "gpt-4"
                && request.temperature == Some(0.5)
                && request.messages == expected
        })
        .times(1)
        .returning(|_, _| {
            Ok(ChatCompletionResponse {
                content: Some("Sunny".into()),
                total_tokens: Some(30),
            })
        });

    let engine = engine_with(EngineConfig::default(), store_with_credentials(), client);
    let turn = engine
        .start_from_typebot(
            assistant_flow("cred-1", "{{Assistant}} ({{Tokens}} tokens)"),
            StartParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert!(turn.reply.logs.is_empty());
    assert_eq!(texts(&turn.reply), vec!["Sunny (30 tokens)"]);
    assert_eq!(
        variable(&turn, "v-assistant"),
        Some(&VariableValue::List(vec![
            "Hello Ada!".to_string(),
            "Sunny".to_string()
        ]))
    );
    assert_eq!(variable(&turn, "v-tokens"), Some(&VariableValue::from("30")));
}

#[tokio::test]
async fn test_missing_credentials_are_logged() {
    let mut client = MockChatCompletionClient::new();
    client.expect_create_chat_completion().times(0);

    let engine = engine_with(EngineConfig::default(), store_with_credentials(), client);
    let turn = engine
        .start_from_typebot(
            assistant_flow("cred-unknown", "{{Tokens}}"),
            StartParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(turn.reply.logs.len(), 1);
    assert!(turn.reply.logs[0].is_error());
    assert_eq!(
        turn.reply.logs[0].description,
        "Make sure to select an OpenAI account"
    );
    assert_eq!(texts(&turn.reply), vec!["{{Tokens}}"]);
}

#[tokio::test]
async fn test_decryption_failure_is_logged() {
    let mut secrets = MockSecretStore::new();
    secrets
        .expect_decrypt()
        .times(1)
        .returning(|_| Err(StoreError::Decryption("bad key".into())));
    let mut client = MockChatCompletionClient::new();
    client.expect_create_chat_completion().times(0);
    let store = Arc::new(InMemoryStore::new());
    let engine = FlowEngine::new(
        EngineConfig::default(),
        store.clone(),
        store,
        Arc::new(secrets),
        Arc::new(client),
    );

    let turn = engine
        .start_from_typebot(assistant_flow("cred-1", "done"), StartParams::default())
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["done"]);
    assert_eq!(
        turn.reply.logs[0].description,
        "Make sure to select an OpenAI account"
    );
}

#[tokio::test]
async fn test_provider_error_is_logged_and_flow_continues() {
    let mut client = MockChatCompletionClient::new();
    client
        .expect_create_chat_completion()
        .times(1)
        .returning(|_, _| Err(ProviderError::ApiError("Rate limit reached, slow down".into())));

    let engine = engine_with(EngineConfig::default(), store_with_credentials(), client);
    let turn = engine
        .start_from_typebot(assistant_flow("cred-1", "done"), StartParams::default())
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["done"]);
    let log = &turn.reply.logs[0];
    assert!(log.is_error());
    assert_eq!(log.description, "OpenAI block returned error");
    assert!(
        log.details
            .as_ref()
            .and_then(|details| details.message.as_deref())
            .is_some_and(|message| message.contains("slow down"))
    );
}

#[tokio::test]
async fn test_streaming_session_delegates_to_client() {
    let mut client = MockChatCompletionClient::new();
    client.expect_create_chat_completion().times(0);

    let engine = engine_with(EngineConfig::default(), store_with_credentials(), client);
    let turn = engine
        .start_from_typebot(
            assistant_flow("cred-1", "{{Assistant}}"),
            StartParams {
                is_stream_enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::AwaitingClientAction);
    assert!(turn.reply.messages.is_empty());
    let ClientSideActionKind::StreamChatCompletion(stream) =
        &turn.reply.client_side_actions[0].kind
    else {
        panic!("expected a streamOpenAiChatCompletion action");
    };
    assert!(stream.display_stream);
    assert_eq!(stream.messages.len(), 4);

    let turn = engine
        .continue_session(turn.new_session_state, "It is sunny")
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["It is sunny"]);
}

#[tokio::test]
async fn test_streaming_can_be_disabled_by_config() {
    let mut client = MockChatCompletionClient::new();
    client
        .expect_create_chat_completion()
        .times(1)
        .returning(|_, _| {
            Ok(ChatCompletionResponse {
                content: Some("Cloudy".into()),
                total_tokens: None,
            })
        });
    let mut config = EngineConfig::default();
    config.chat_completion.streaming_supported = false;

    let engine = engine_with(config, store_with_credentials(), client);
    let turn = engine
        .start_from_typebot(
            assistant_flow("cred-1", "{{Assistant}}"),
            StartParams {
                is_stream_enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["Cloudy"]);
}
