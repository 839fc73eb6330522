//! Errors surfaced by the command host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Delivery error: {0}")]
    Delivery(#[from] media_ferry_client::FerryError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing URL for `{0}`")]
    MissingUrl(&'static str),

    #[error("Nothing to replay yet")]
    NothingToReplay,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;
