//! Error handling for the bookshelf HTTP layer

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::{NoContext, Timestamp, Uuid};

use crate::validation::FieldError;

/// JSON body of every error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
    /// Diagnostic chain, only filled in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Create a bad request error carrying field-level failures
    pub fn invalid(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details,
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Diagnostic chain of an internal error, carried in response extensions
/// until [`expose_error_trace`] decides whether to render it.
#[derive(Debug, Clone)]
pub struct ErrorTrace {
    body: ErrorBody,
    trace: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, details, trace) = match self {
            AppError::BadRequest { message, details } => (message, details, None),
            AppError::NotFound { message } | AppError::Conflict { message } => {
                (message, Vec::new(), None)
            }
            AppError::Internal(err) => {
                let error_id = Uuid::new_v7(Timestamp::now(NoContext));
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?err,
                    "request failed"
                );
                (err.to_string(), Vec::new(), Some(format!("{err:?}")))
            }
        };

        if trace.is_none() {
            tracing::debug!(status_code = %status.as_u16(), %message, "request rejected");
        }

        let body = ErrorBody {
            message,
            status: status.as_u16(),
            details,
            stack: None,
        };

        let mut response = (status, Json(body.clone())).into_response();
        if let Some(trace) = trace {
            response
                .extensions_mut()
                .insert(ErrorTrace { body, trace });
        }
        response
    }
}

/// Response middleware that re-renders internal errors with their `stack`
/// when `enabled` is set.
pub async fn expose_error_trace(State(enabled): State<bool>, mut response: Response) -> Response {
    let Some(ErrorTrace { mut body, trace }) = response.extensions_mut().remove::<ErrorTrace>()
    else {
        return response;
    };
    if !enabled {
        return response;
    }

    body.stack = Some(trace);
    let mut rendered = (response.status(), Json(body)).into_response();
    for (name, value) in response.headers() {
        if name != axum::http::header::CONTENT_LENGTH && name != axum::http::header::CONTENT_TYPE
        {
            rendered.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rendered
}
