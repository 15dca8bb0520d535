use crate::reference::ReferenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("Registry returned OperationOutcome: {0}")]
    OperationOutcome(String),

    #[error("Expected {expected} resource, got {actual}")]
    UnexpectedResource { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, Error>;
