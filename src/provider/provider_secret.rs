use std::collections::HashMap;

use secrecy::SecretString;

use crate::config::IntegrationSecretConfig;

/// Decrypted credentials of an integration. Only exposed at the call site.
#[derive(Clone, Default, Debug)]
pub struct IntegrationSecret {
    pub api_key: SecretString,
    pub additional_auth: HashMap<String, SecretString>,
}

impl IntegrationSecret {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            additional_auth: HashMap::new(),
        }
    }
}

impl From<IntegrationSecretConfig> for IntegrationSecret {
    fn from(secret: IntegrationSecretConfig) -> Self {
        let additional_auth = secret
            .additional_auth
            .into_iter()
            .map(|(k, v)| (k, SecretString::from(v)))
            .collect();
        Self {
            api_key: SecretString::from(secret.api_key),
            additional_auth,
        }
    }
}
