//! HTTP adapter error types

use provisio_core::LroError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Reconciliation error: {0}")]
    Core(#[from] LroError),
}

impl From<HttpError> for LroError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Core(inner) => inner,
            HttpError::Api { status, message } if (400..500).contains(&status) => {
                LroError::Rejected { status, message }
            }
            HttpError::JsonError(inner) => LroError::Json(inner),
            other => LroError::Api(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
