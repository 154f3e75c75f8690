use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, io::BufReader, path::Path, time::Duration};

use crate::{Error, InternalResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on blocks visited in a single turn. Guards against cycles made
    /// only of bubble and logic blocks.
    #[serde(default = "default_max_steps_per_turn")]
    pub max_steps_per_turn: usize,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub chat_completion: ChatCompletionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: default_max_steps_per_turn(),
            webhook: WebhookConfig::default(),
            chat_completion: ChatCompletionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &str) -> InternalResult<Self> {
        from_file(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_timeout", with = "duration_ms")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: default_webhook_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// When false, chat completion blocks are always executed on the server even
    /// if the session asked for streaming.
    #[serde(default = "default_true")]
    pub streaming_supported: bool,
    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            default_model: default_model(),
            streaming_supported: default_true(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Secret settings (secret.json), keyed by credentials id
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub credentials: HashMap<String, IntegrationSecretConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IntegrationSecretConfig {
    pub api_key: String,
    #[serde(default = "HashMap::new")]
    pub additional_auth: HashMap<String, String>,
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::config(format!(
            "Failed to open {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

fn default_max_steps_per_turn() -> usize {
    1000
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("chatflow/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

// Duration as milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
