use chatflow::{
    ClientSideActionKind, HttpMethod, KeyValue, StartParams, TurnStatus, Typebot, Webhook,
    store::{InMemoryStore, WebhookStore},
};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{engine, texts};

/// A webhook block followed by a bubble showing the mapped response.
fn webhook_flow(block_options: Value) -> Typebot {
    serde_json::from_value(json!({
        "id": "hook",
        "variables": [
            {"id": "v-id", "name": "Id", "value": "42"},
            {"id": "v-name", "name": "Name", "value": "Ada"},
            {"id": "v-city", "name": "City"}
        ],
        "groups": [{
            "id": "g1",
            "title": "Lookup",
            "blocks": [
                {
                    "id": "b-hook",
                    "type": "Webhook",
                    "webhookId": "w1",
                    "options": block_options
                },
                {
                    "id": "b-city",
                    "type": "text",
                    "content": {"plainText": "You live in {{City}}"}
                }
            ]
        }],
        "edges": []
    }))
    .unwrap()
}

fn city_mapping() -> Value {
    json!({
        "responseVariableMapping": [
            {"id": "m1", "bodyPath": "data.address.city", "variableId": "v-city"}
        ]
    })
}

fn record(url: String) -> Webhook {
    Webhook {
        url: Some(url),
        method: HttpMethod::Post,
        headers: vec![KeyValue::new("h1", "X-User", "{{Name}}")],
        body: Some(r#"{"name": "{{Name}}"}"#.into()),
        ..Webhook::new("w1")
    }
}

#[tokio::test]
async fn test_server_side_webhook_maps_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/42")
        .match_header("x-user", "Ada")
        .match_body(Matcher::Json(json!({"name": "Ada"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"address": {"city": "Paris"}}).to_string())
        .create_async()
        .await;

    let store = InMemoryStore::new();
    store.insert_webhook(record(format!("{}/users/{{{{Id}}}}", server.url())));
    let turn = engine(store)
        .start_from_typebot(webhook_flow(city_mapping()), StartParams::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["You live in Paris"]);
    assert_eq!(turn.reply.logs.len(), 1);
    let log = &turn.reply.logs[0];
    assert!(!log.is_error());
    assert_eq!(log.description, "Webhook successfuly executed.");
    assert_eq!(log.details.as_ref().unwrap().status_code, Some(200));
}

#[tokio::test]
async fn test_http_error_is_logged_and_flow_continues() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/users/42")
        .with_status(500)
        .with_body("upstream down")
        .create_async()
        .await;

    let store = InMemoryStore::new();
    store.insert_webhook(record(format!("{}/users/{{{{Id}}}}", server.url())));
    let turn = engine(store)
        .start_from_typebot(webhook_flow(city_mapping()), StartParams::default())
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["You live in {{City}}"]);
    let log = &turn.reply.logs[0];
    assert!(log.is_error());
    assert_eq!(log.description, "Webhook returned an error.");
    assert_eq!(
        log.details.as_ref().unwrap().response,
        Some(json!({"statusCode": 500, "data": "upstream down"}))
    );
}

#[tokio::test]
async fn test_form_encoded_body_is_sent_raw() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/form")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::Exact("name=Ada&id=42".into()))
        .with_status(200)
        .create_async()
        .await;

    let store = InMemoryStore::new();
    store.insert_webhook(Webhook {
        headers: vec![KeyValue::new(
            "h1",
            "Content-Type",
            "application/x-www-form-urlencoded",
        )],
        body: Some("name={{Name}}&id={{Id}}".into()),
        ..record(format!("{}/form", server.url()))
    });
    let turn = engine(store)
        .start_from_typebot(webhook_flow(city_mapping()), StartParams::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(turn.reply.logs.len(), 1);
    assert!(!turn.reply.logs[0].is_error());
    assert_eq!(turn.reply.logs[0].description, "Webhook successfuly executed.");
}

#[tokio::test]
async fn test_transport_failure_is_a_handled_500() {
    let store = InMemoryStore::new();
    store.insert_webhook(record("http://127.0.0.1:9/unreachable".to_string()));
    let turn = engine(store)
        .start_from_typebot(webhook_flow(city_mapping()), StartParams::default())
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(turn.reply.messages.len(), 1);
    let log = &turn.reply.logs[0];
    assert_eq!(log.description, "Webhook failed to execute.");
    let response = log.details.as_ref().unwrap().response.clone().unwrap();
    assert_eq!(response["statusCode"], 500);
}

#[tokio::test]
async fn test_client_side_webhook_skips_network_and_resumes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = InMemoryStore::new();
    store.insert_webhook(record(format!("{}/users/{{{{Id}}}}", server.url())));
    let mut options = city_mapping();
    options["isExecutedOnClient"] = json!(true);
    let engine = engine(store);

    let turn = engine
        .start_from_typebot(webhook_flow(options), StartParams::default())
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(turn.status, TurnStatus::AwaitingClientAction);
    assert!(turn.reply.messages.is_empty());
    assert_eq!(turn.reply.client_side_actions.len(), 1);
    let ClientSideActionKind::WebhookToExecute(webhook) = &turn.reply.client_side_actions[0].kind
    else {
        panic!("expected a webhookToExecute action");
    };
    assert_eq!(webhook.url, format!("{}/users/42", server.url()));
    assert_eq!(webhook.body, Some(json!({"name": "Ada"})));
    assert!(webhook.is_json);

    let reply = json!({"statusCode": 200, "data": {"address": {"city": "Lyon"}}}).to_string();
    let turn = engine
        .continue_session(turn.new_session_state, &reply)
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["You live in Lyon"]);
    assert_eq!(turn.reply.logs[0].description, "Webhook successfuly executed.");
}

#[tokio::test]
async fn test_default_config_posts_result_snapshot() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(json!({"Id": "42", "Name": "Ada"})))
        .with_status(200)
        .create_async()
        .await;

    let store = InMemoryStore::new();
    store.insert_webhook(Webhook {
        method: HttpMethod::Get,
        body: Some("ignored".into()),
        ..record(format!("{}/hook", server.url()))
    });
    let mut typebot = webhook_flow(json!({"isAdvancedConfig": false}));
    typebot.variables.truncate(2);
    let turn = engine(store)
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(!turn.reply.logs[0].is_error());
}

#[tokio::test]
async fn test_missing_record_is_logged() {
    let turn = engine(InMemoryStore::new())
        .start_from_typebot(webhook_flow(city_mapping()), StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(
        turn.reply.logs[0].description,
        "Couldn't find webhook with id w1"
    );
    assert_eq!(turn.reply.messages.len(), 1);
}

#[tokio::test]
async fn test_subscribe_webhook_points_record_at_url() {
    let store = InMemoryStore::new();
    store.insert_typebot(webhook_flow(city_mapping()));
    store.insert_webhook(record("https://old.example.com".into()));
    let engine = engine(store.clone());

    let webhook = engine
        .subscribe_webhook("hook", "b-hook", "https://hooks.zapier.com/1")
        .await
        .unwrap();
    assert_eq!(webhook.url.as_deref(), Some("https://hooks.zapier.com/1"));

    let stored = store.find_webhook("w1").await.unwrap().unwrap();
    assert_eq!(stored.body.as_deref(), Some("{{state}}"));
    assert_eq!(stored.method, HttpMethod::Post);
    assert_eq!(stored.headers.len(), 1);

    assert!(engine
        .subscribe_webhook("hook", "b-city", "https://x.io")
        .await
        .is_err());
}
