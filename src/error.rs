use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    scoring::{lifecycle::NotRatable, normalizer::ValidationError},
    state::{
        competition::IngestError,
        reconciler::{PredictError, ResolveError},
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend failed or could not be reached.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The backend answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Transport failure outside of the storage layer (task aborted, etc).
    #[error("transport failure: {0}")]
    Transport(String),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Rating refused by the lifecycle rules.
    #[error(transparent)]
    NotRatable(#[from] NotRatable),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected { message } => ServiceError::Rejected(message),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

impl From<IngestError> for ServiceError {
    fn from(err: IngestError) -> Self {
        ServiceError::Transport(format!("malformed backend payload: {err}"))
    }
}

impl From<PredictError> for ServiceError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::UnknownRestaurant(id) => {
                ServiceError::NotFound(format!("restaurant {id}"))
            }
            other => ServiceError::InvalidState(other.to_string()),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(err: ResolveError) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Request understood but not processable in the current lifecycle.
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    /// The backing service failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::BadGateway(source.to_string()),
            ServiceError::Rejected(message) => AppError::Unprocessable(message),
            ServiceError::Transport(message) => AppError::BadGateway(message),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotRatable(reason) => AppError::Unprocessable(reason.to_string()),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{lifecycle::NotRatableReason, normalizer::Criterion};

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn service_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(
                ValidationError::MissingScore {
                    criterion: Criterion::Food
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                NotRatable {
                    reason: NotRatableReason::VisitInFuture
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(ServiceError::Degraded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(StorageError::rejected("duplicate").into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ServiceError::Transport("reset".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
