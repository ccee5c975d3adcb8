//! Error types of the invoicing service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::{calculator::AmountOverflow, reconciler::ReconcileError, status::InvalidStatus};

/// Errors returned by the service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("invoice item {0} not found")]
    ItemNotFound(Uuid),

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("{0}")]
    InvalidInput(String),

    #[error("storage failure: {0}")]
    Storage(#[from] DatabaseError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ReconcileError> for ServiceError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::ItemNotFound(id) => ServiceError::ItemNotFound(id),
            ReconcileError::DuplicateItem(_) | ReconcileError::Amount(_) => {
                ServiceError::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<AmountOverflow> for ServiceError {
    fn from(err: AmountOverflow) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => match err {
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                ServiceError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
                ServiceError::ItemNotFound(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                ServiceError::InvalidStatus(_) | ServiceError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                ServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                ServiceError::AccountDeactivated => (StatusCode::FORBIDDEN, err.to_string()),
                ServiceError::Storage(_) | ServiceError::Token(_) | ServiceError::Internal(_) => {
                    error!("Request failed: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
