use std::{io::Write, time::Duration};

use chatflow::{
    Error,
    config::{self, EngineConfig, SecretConfig},
    store::{InMemoryStore, SecretStore},
};
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use tempfile::NamedTempFile;

fn write_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_config_from_file() {
    let file = write_json(
        r#"{
            "max_steps_per_turn": 50,
            "webhook": {"timeout": 2500},
            "chat_completion": {"default_model": "gpt-4", "streaming_supported": false}
        }"#,
    );
    let config = EngineConfig::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.max_steps_per_turn, 50);
    assert_eq!(config.webhook.timeout, Duration::from_millis(2500));
    assert!(config.webhook.user_agent.starts_with("chatflow/"));
    assert_eq!(config.chat_completion.default_model, "gpt-4");
    assert!(!config.chat_completion.streaming_supported);
    assert_eq!(
        config.chat_completion.api_base,
        "https://api.openai.com/v1"
    );
    assert_eq!(
        config.chat_completion.request_timeout,
        Duration::from_secs(60)
    );
}

#[test]
fn test_empty_config_uses_defaults() {
    let config: EngineConfig = config::from_str("{}").unwrap();
    assert_eq!(config.max_steps_per_turn, 1000);
    assert_eq!(config.webhook.timeout, Duration::from_secs(10));
    assert!(config.chat_completion.streaming_supported);
}

#[test]
fn test_config_errors() {
    let missing = EngineConfig::from_file("/nonexistent/chatflow.json");
    assert!(matches!(missing, Err(Error::Config(_))));

    let file = write_json("{ not json");
    let invalid = EngineConfig::from_file(file.path().to_str().unwrap());
    assert!(matches!(invalid, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_secret_file_feeds_the_store() {
    let file = write_json(
        r#"{
            "credentials": {
                "cred-1": {"api_key": "sk-from-file", "additional_auth": {"org": "org-1"}}
            }
        }"#,
    );
    let secrets: SecretConfig = config::from_file(file.path()).unwrap();
    let store = InMemoryStore::with_secrets(secrets);

    let secret = store.decrypt("cred-1").await.unwrap().unwrap();
    assert_eq!(secret.api_key.expose_secret(), "sk-from-file");
    assert_eq!(secret.additional_auth["org"].expose_secret(), "org-1");
    assert!(store.decrypt("cred-2").await.unwrap().is_none());
}
