//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("operator does not own this event")]
    Forbidden,

    #[error("duplicate on-chain triple")]
    Conflict,

    #[error("audit log persistence failed: {0}")]
    AuditUnavailable(String),

    #[error("store error: {0}")]
    Store(#[from] wene_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] wene_audit::AuditError),

    #[error("receipt error: {0}")]
    Receipt(#[from] wene_receipts::ReceiptError),

    #[error("pop error: {0}")]
    Pop(#[from] wene_pop::PopError),

    #[error("identity error: {0}")]
    Identity(#[from] wene_identity::IdentityError),

    #[error("search error: {0}")]
    Search(#[from] wene_search::SearchError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    detail: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::AuditUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) | ApiError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Receipt(e) => match e {
                wene_receipts::ReceiptError::NotFound => StatusCode::NOT_FOUND,
                wene_receipts::ReceiptError::Malformed(_) | wene_receipts::ReceiptError::WalletRequired => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Pop(e) => match e {
                wene_pop::PopError::EventNotFound => StatusCode::NOT_FOUND,
                wene_pop::PopError::EventNotPublished | wene_pop::PopError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                wene_pop::PopError::InvalidConfig(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Identity(e) => match e {
                wene_identity::IdentityError::Unauthorized | wene_identity::IdentityError::Revoked => StatusCode::UNAUTHORIZED,
                wene_identity::IdentityError::MasterRequired | wene_identity::IdentityError::NotOwner => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Search(e) => match e {
                wene_search::SearchError::MasterRequired => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody { error: &self.message(), detail: None };
        (status, Json(body)).into_response()
    }
}
