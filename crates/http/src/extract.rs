//! Request extractors shared by module handlers.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

/// Message returned when a numeric path segment does not parse.
pub const NOT_A_NUMBER: &str = "Input must be a number";

/// Single path parameter that must parse as an integer.
///
/// Rejects with `400 Input must be a number` before any body is read. A
/// segment that does not decode as UTF-8 or does not fit an `i64` is
/// rejected the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerId(pub i64);

impl<S> FromRequestParts<S> for IntegerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "undecodable id segment");
                AppError::bad_request(NOT_A_NUMBER)
            })?;

        raw.parse::<i64>()
            .map(IntegerId)
            .map_err(|_| AppError::bad_request(NOT_A_NUMBER))
    }
}
