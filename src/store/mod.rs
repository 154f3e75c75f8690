//! Storage ports used by the engine.
//!
//! Typebot definitions, webhook records and credentials live outside the
//! engine. These traits describe the reads (and the single webhook write) the
//! engine needs, so that any backend can be plugged in.
//!
//! # Usage Example
//!
//! ```no_run
//! use chatflow::store::{InMemoryStore, TypebotStore};
//!
//! # async fn example(store: &InMemoryStore) -> Result<(), Box<dyn std::error::Error>> {
//! if let Some(typebot) = store.find_typebot("my-typebot").await? {
//!     println!("{} groups", typebot.groups.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::provider::IntegrationSecret;
use crate::schema::{Typebot, Webhook};

pub use in_memory::InMemoryStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to decrypt credentials: {0}")]
    Decryption(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to typebot definitions.
///
/// # Thread Safety
///
/// Implementations are shared between concurrent turns and must be
/// `Send + Sync`.
#[mockall::automock]
#[async_trait]
pub trait TypebotStore: Send + Sync {
    /// Loads a typebot with its groups, edges, variables and settings.
    ///
    /// Returns `Ok(None)` when no typebot has this id.
    async fn find_typebot(&self, typebot_id: &str) -> StoreResult<Option<Typebot>>;
}

/// Webhook records referenced by webhook-like blocks.
#[mockall::automock]
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn find_webhook(&self, webhook_id: &str) -> StoreResult<Option<Webhook>>;

    /// Creates the record or replaces the one with the same id.
    async fn upsert_webhook(&self, webhook: Webhook) -> StoreResult<()>;
}

/// Decrypts stored integration credentials.
#[mockall::automock]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns `Ok(None)` when no credentials have this id.
    async fn decrypt(&self, credentials_id: &str) -> StoreResult<Option<IntegrationSecret>>;
}
