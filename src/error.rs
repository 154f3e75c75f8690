use thiserror::Error;

use crate::engine::EngineError;
use crate::provider::ProviderError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }
}
