use thiserror::Error;

/// Errors raised by the map tracker and its snapshot store.
#[derive(Debug, Error)]
pub enum MapError {
    /// A direction token did not match any known alias.
    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    /// Wrapper around IO errors (directory creation, snapshot read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around snapshot (de)serialization errors.
    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}
