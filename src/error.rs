//! Fault taxonomy for the ingestion pipeline.
//!
//! Each boundary returns its own error type; the driver folds them into
//! [`PipelineError`], whose variant decides the diagnostic prefix. Every class
//! aborts the run with the same exit status.
use reqwest::StatusCode;
use thiserror::Error;

/// Failures crossing the remote catalog API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Built through `From`, which drops the request URL: it carries the key.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("{endpoint} returned {status}: {body}")]
    Http {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("invalid {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid API base URL {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.without_url())
    }
}

impl ApiError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ApiError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Decode { .. } | ApiError::InvalidBaseUrl(_) => false,
        }
    }
}

/// Failures inside the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Terminal fault of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Store(StoreError::Sqlx(err))
    }
}

impl PipelineError {
    /// Single-line, class-prefixed message for the standard error stream.
    pub fn diagnostic(&self) -> String {
        match self {
            PipelineError::Api(err) => format!("An HTTP error occurred: {err}"),
            PipelineError::Store(err) => format!("An SQLite error occurred: {err}"),
            PipelineError::Other(err) => format!("An unexpected error occurred: {err:#}"),
        }
    }

    /// Process exit status; the fault class only shows up in the diagnostic.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
