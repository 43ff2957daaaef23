use thiserror::Error;

/// Failure to obtain calls or managers from a data source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("source answered with status {0}")]
    Status(u16),

    #[error("source rejected the request: {0}")]
    Rejected(String),
}

/// Failure to relay a call recording.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("invalid call id: {0}")]
    InvalidCallId(String),

    #[error("recording not found")]
    NotFound,

    #[error("upstream answered with status {status}")]
    Upstream { status: u16 },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
