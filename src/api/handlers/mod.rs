//! HTTP handlers

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod health;
pub mod user;

use axum::http::StatusCode;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::domain::DomainError;

/// Map a domain error onto the wrapped error response.
///
/// Conflicts map to 400 rather than 409: clients treat every rule
/// violation (duplicate reservation, full lot, occupied spot) as a
/// plain bad request with a human-readable message.
pub fn error_response<T>(err: DomainError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::Conflict(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let (status, _) = error_response::<()>(DomainError::not_found("ParkingLot", "id", 7));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response::<()>(DomainError::Conflict("full".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response::<()>(DomainError::Forbidden("admins only".to_string()));
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
