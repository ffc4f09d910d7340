//! Mapping of service errors onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

use crate::domain::DomainError;
use crate::eligibility::{Rejection, RejectionClass, ResolveError};
use crate::orders::OrderError;
use crate::store::StoreError;

/// Application error type.
#[derive(Debug)]
pub enum ApiError {
    /// Required parameter absent or malformed
    MissingParams(String),
    InvalidPassenger(DomainError),
    DraftNotFound(String),
    Rejected(Rejection),
    Store(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParams(_) | ApiError::InvalidPassenger(_) => StatusCode::BAD_REQUEST,
            ApiError::DraftNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(r) => match r.class() {
                RejectionClass::InvalidInput => StatusCode::BAD_REQUEST,
                RejectionClass::NotFound => StatusCode::NOT_FOUND,
                RejectionClass::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingParams(_) => "missing_params",
            ApiError::InvalidPassenger(_) => "invalid_passenger",
            ApiError::DraftNotFound(_) => "draft_not_found",
            ApiError::Rejected(r) => r.code(),
            ApiError::Store(_) => "db_error",
        }
    }

    fn message_and_meta(&self) -> (String, Value) {
        match self {
            ApiError::MissingParams(message) => (message.clone(), json!({})),
            ApiError::InvalidPassenger(e) => (e.to_string(), json!({})),
            ApiError::DraftNotFound(id) => ("Draft not found or expired.".to_string(), json!({ "draft": id })),
            ApiError::Rejected(r) => (r.message(), r.meta()),
            ApiError::Store(_) => ("Something went wrong, please try again.".to_string(), json!({})),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(r: Rejection) -> Self {
        ApiError::Rejected(r)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Rejected(r) => ApiError::Rejected(r),
            ResolveError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidPassenger(e) => ApiError::InvalidPassenger(e),
            OrderError::Rejected(r) => ApiError::Rejected(r),
            OrderError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::MissingParams(e.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::MissingParams(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Store(e) = &self {
            error!(%status, error = %e, "store failure");
        }

        let (message, meta) = self.message_and_meta();
        let body = Json(json!({
            "success": false,
            "error": self.code(),
            "message": message,
            "meta": meta,
        }));
        (status, body).into_response()
    }
}
