//! The API error taxonomy and the terminal middleware that renders it.
//!
//! Handlers and middleware return [`ApiError`]; its `IntoResponse` impl only
//! sets the status and stashes the error in the response extensions.
//! [`render_errors`] is the single place that logs failures and writes the
//! JSON error envelope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use shared::ErrorEnvelope;
use thiserror::Error;

use crate::app::AppState;
use crate::identity::VerifyError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Validation Error")]
    InvalidInput(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("{field} already exists")]
    Conflict { field: String },

    #[error("Invalid ID format")]
    MalformedReference(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Internal Server Error")]
    Internal(String),
}

impl ApiError {
    pub fn task_not_found() -> Self {
        ApiError::NotFound("Task not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidInput(_)
            | ApiError::Conflict { .. }
            | ApiError::MalformedReference(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Status { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The response body. Internal causes are only exposed in development.
    pub fn envelope(&self, development: bool) -> ErrorEnvelope {
        let status = self.status().as_u16();
        match self {
            ApiError::InvalidInput(messages) => {
                ErrorEnvelope::new(status, "Validation Error", Some(messages.clone()))
            }
            ApiError::Conflict { field } => ErrorEnvelope::new(
                status,
                "Duplicate Field",
                Some(vec![format!("{field} already exists")]),
            ),
            ApiError::MalformedReference(value) => ErrorEnvelope::new(
                status,
                "Invalid ID format",
                Some(vec![format!("Invalid id: {value}")]),
            ),
            ApiError::Internal(cause) => ErrorEnvelope::new(
                status,
                "Internal Server Error",
                development.then(|| vec![cause.clone()]),
            ),
            other => ErrorEnvelope::new(status, other.to_string(), None),
        }
    }
}

#[derive(Clone)]
struct ErrorReport(Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(ErrorReport(Arc::new(self)));
        response
    }
}

/// Terminal error middleware: logs every failed request and renders the
/// JSON envelope.
pub async fn render_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(ErrorReport(error)) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    let status = error.status();
    let timestamp = Utc::now().to_rfc3339();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), %timestamp, error = ?error, "request failed");
    } else {
        tracing::warn!(%method, %path, status = status.as_u16(), %timestamp, error = %error, "request rejected");
    }

    // Headers set further in (CORS in particular) survive the re-render.
    let envelope = error.envelope(state.config.environment.is_development());
    let (mut parts, _) = response.into_parts();
    let (rendered, body) = (status, Json(envelope)).into_response().into_parts();
    parts.status = status;
    parts.headers.extend(rendered.headers);
    Response::from_parts(parts, body)
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Validation(messages) => ApiError::InvalidInput(messages),
            StoreError::Duplicate { field } => ApiError::Conflict { field },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(error: VerifyError) -> Self {
        let message = match error {
            VerifyError::Expired => "Token expired. Please log in again.",
            VerifyError::Rejected(_) => "Invalid or expired token",
            VerifyError::Unavailable(_) => "Unauthorized",
        };
        ApiError::Unauthenticated(message.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Status {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}
