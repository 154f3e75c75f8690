//! In-memory storage backend.
//!
//! Keeps typebots, webhooks and credentials in `DashMap`s. Cloning the store
//! shares the underlying maps. Data is lost when the process terminates.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::config::SecretConfig;
use crate::provider::IntegrationSecret;
use crate::schema::{Typebot, Webhook};

use super::{SecretStore, StoreResult, TypebotStore, WebhookStore};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    typebots: Arc<DashMap<String, Typebot>>,
    webhooks: Arc<DashMap<String, Webhook>>,
    secrets: Arc<DashMap<String, IntegrationSecret>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose credentials come from a secret file.
    pub fn with_secrets(config: SecretConfig) -> Self {
        let store = Self::new();
        for (credentials_id, secret) in config.credentials {
            store
                .secrets
                .insert(credentials_id, IntegrationSecret::from(secret));
        }
        store
    }

    pub fn insert_typebot(&self, typebot: Typebot) {
        self.typebots.insert(typebot.id.clone(), typebot);
    }

    pub fn insert_webhook(&self, webhook: Webhook) {
        self.webhooks.insert(webhook.id.clone(), webhook);
    }

    pub fn insert_secret(&self, credentials_id: impl Into<String>, secret: IntegrationSecret) {
        self.secrets.insert(credentials_id.into(), secret);
    }
}

#[async_trait]
impl TypebotStore for InMemoryStore {
    async fn find_typebot(&self, typebot_id: &str) -> StoreResult<Option<Typebot>> {
        Ok(self.typebots.get(typebot_id).map(|entry| entry.clone()))
    }
}

#[async_trait]
impl WebhookStore for InMemoryStore {
    async fn find_webhook(&self, webhook_id: &str) -> StoreResult<Option<Webhook>> {
        Ok(self.webhooks.get(webhook_id).map(|entry| entry.clone()))
    }

    async fn upsert_webhook(&self, webhook: Webhook) -> StoreResult<()> {
        self.insert_webhook(webhook);
        Ok(())
    }
}

#[async_trait]
impl SecretStore for InMemoryStore {
    async fn decrypt(&self, credentials_id: &str) -> StoreResult<Option<IntegrationSecret>> {
        Ok(self.secrets.get(credentials_id).map(|entry| entry.clone()))
    }
}
