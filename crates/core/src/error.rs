use thiserror::Error;

pub type DockslotResult<T> = Result<T, DockslotError>;

#[derive(Error, Debug)]
pub enum DockslotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Subdomain already registered: {0}")]
    DuplicateSubdomain(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
