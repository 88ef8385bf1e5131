use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("run already in progress: {0}")]
    AlreadyInProgress(String),

    #[error("audit chain broken: {0}")]
    AuditChainBroken(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("time format error: {0}")]
    TimeFormat(#[from] time::error::Format),
}

pub type CoreResult<T> = Result<T, CoreError>;
