use std::time::Duration;

use thiserror::Error;

use crate::metrics::schema::SchemaError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("metrics server answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("response body from {url} is not JSON: {reason}")]
    Body { url: String, reason: String },

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed API data: {0}")]
    Schema(#[from] SchemaError),

    #[error("validated snapshot could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PipelineError {
    /// Only transport failures are worth repeating; bad data would recur.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("No node for query: {0}")]
    NoNodeForQuery(String),
}
