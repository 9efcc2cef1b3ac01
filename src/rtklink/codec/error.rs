//! Message codec error types

use thiserror::Error;

/// Error type for envelope encoding and decoding
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;
