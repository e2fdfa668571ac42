//! Error types shared by the REST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`HttpStoreError`] failures.
pub type HttpResult<T> = Result<T, HttpStoreError>;

/// Failures that can occur while talking to the backing REST service.
#[derive(Debug, Error)]
pub enum HttpStoreError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The service refused the request.
    #[error("request to `{path}` rejected with status {status}: {body}")]
    Rejected {
        path: String,
        status: StatusCode,
        body: String,
    },
    /// The service failed while handling the request.
    #[error("unexpected response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be decoded.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<HttpStoreError> for StorageError {
    fn from(err: HttpStoreError) -> Self {
        match err {
            HttpStoreError::Rejected { ref body, .. } if !body.is_empty() => {
                StorageError::rejected(body.clone())
            }
            HttpStoreError::Rejected { status, path, .. } => {
                StorageError::rejected(format!("{path} answered {status}"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
