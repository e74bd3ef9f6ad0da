//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;

use super::jwt::{verify_token, AuthError, Claims, JwtConfig};
use crate::infrastructure::database::entities::user;

/// Authentication state containing JWT config and a database handle
/// for the per-request is_active check.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
    pub db: DatabaseConnection,
}

/// Authenticated user information extracted from a verified JWT
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub is_admin: bool,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Self {
            user_id: claims.user_id()?,
            username: claims.username.clone(),
            is_admin: claims.is_admin(),
        })
    }
}

/// Extract token from Authorization header
fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// JWT authentication middleware - requires a valid token and an active
/// account.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(&auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    let claims = match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => claims,
        Err(_) => return auth_error_response(AuthError::InvalidToken),
    };

    if claims.is_expired() {
        return auth_error_response(AuthError::ExpiredToken);
    }

    let Some(user) = AuthenticatedUser::from_claims(&claims) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    // Deactivated accounts lose access immediately, not at token expiry
    match user::Entity::find_by_id(user.user_id)
        .one(&auth_state.db)
        .await
    {
        Ok(Some(db_user)) if db_user.is_active => {}
        Ok(_) => return auth_error_response(AuthError::InactiveAccount),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Admin gate, layered after `auth_middleware` on admin routes.
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if user.is_admin => next.run(request).await,
        Some(_) => auth_error_response(AuthError::AdminRequired),
        None => auth_error_response(AuthError::MissingToken),
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let status = match error {
        AuthError::AdminRequired => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    };

    (
        status,
        Json(json!({
            "success": false,
            "error": error.message(),
        })),
    )
        .into_response()
}
