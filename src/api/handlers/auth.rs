//! Authentication API handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::dto::{ApiResponse, UserDto};
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::{create_token, hash_password, verify_password, JwtConfig};
use crate::infrastructure::database::entities::user;

/// Auth state for authentication handlers
#[derive(Clone)]
pub struct AuthHandlerState {
    pub db: sea_orm::DatabaseConnection,
    pub jwt_config: JwtConfig,
}

/// Запрос на авторизацию
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "username": "admin",
    "password": "admin123"
}))]
pub struct LoginRequest {
    /// Имя пользователя или email
    pub username: String,
    /// Пароль
    pub password: String,
}

/// Ответ на успешную авторизацию
///
/// Содержит JWT-токен для последующих запросов.
/// Токен передаётся в заголовке `Authorization: Bearer <token>`
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT access-токен
    pub token: String,
    /// Тип токена (всегда `Bearer`)
    pub token_type: String,
    /// Время жизни токена в секундах
    pub expires_in: i64,
    /// Информация о пользователе
    pub user: UserDto,
}

/// Запрос на регистрацию нового пользователя
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "username": "alice",
    "email": "alice@example.com",
    "password": "secure_password",
    "full_name": "Alice Kumar",
    "phone": "9876543210",
    "address": "42 Park Avenue",
    "pin_code": "500001"
}))]
pub struct RegisterRequest {
    /// Имя пользователя (от 3 до 50 символов, уникальное)
    pub username: String,
    /// Email-адрес (уникальный)
    pub email: String,
    /// Пароль (минимум 6 символов)
    pub password: String,
    /// Полное имя
    pub full_name: String,
    /// Телефон
    pub phone: String,
    /// Адрес
    pub address: String,
    /// Почтовый индекс
    pub pin_code: String,
}

fn validate_registration(request: &RegisterRequest) -> Result<(), String> {
    let username = request.username.trim();
    if username.len() < 3 || username.len() > 50 {
        return Err("Username must be 3-50 characters".to_string());
    }
    if !request.email.contains('@') {
        return Err("Invalid email address".to_string());
    }
    if request.password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }
    if request.full_name.trim().is_empty() {
        return Err("Full name is required".to_string());
    }
    Ok(())
}

/// Регистрация нового пользователя
///
/// Создаёт обычный (не администраторский) аккаунт.
/// Имя пользователя и email должны быть уникальными.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Пользователь создан", body = ApiResponse<UserDto>),
        (status = 400, description = "Ошибка валидации или имя/email уже заняты")
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), (StatusCode, Json<ApiResponse<UserDto>>)> {
    if let Err(message) = validate_registration(&request) {
        return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))));
    }

    let existing = user::Entity::find()
        .filter(
            user::Column::Username
                .eq(request.username.trim())
                .or(user::Column::Email.eq(request.email.trim())),
        )
        .one(&state.db)
        .await
        .map_err(internal)?;

    if let Some(existing) = existing {
        let message = if existing.username == request.username.trim() {
            "Username already exists"
        } else {
            "Email already registered"
        };
        return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))));
    }

    let password_hash = hash_password(&request.password).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(e.to_string())),
        )
    })?;

    let new_user = user::ActiveModel {
        id: NotSet,
        username: Set(request.username.trim().to_string()),
        email: Set(request.email.trim().to_string()),
        password_hash: Set(password_hash),
        full_name: Set(request.full_name.trim().to_string()),
        phone: Set(request.phone.trim().to_string()),
        address: Set(request.address.trim().to_string()),
        pin_code: Set(request.pin_code.trim().to_string()),
        is_admin: Set(false),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        last_login_at: Set(None),
    };
    let created = new_user.insert(&state.db).await.map_err(internal)?;

    tracing::info!(user_id = created.id, username = %created.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from_model(created))),
    ))
}

/// Авторизация пользователя
///
/// Возвращает JWT-токен при успешной аутентификации.
/// Можно использовать как имя пользователя, так и email в поле `username`.
/// Если аккаунт деактивирован — вернёт 401.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Успешная авторизация, возвращает JWT-токен", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Неверные учётные данные или аккаунт деактивирован")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, (StatusCode, Json<ApiResponse<LoginResponse>>)> {
    // Find user by username or email
    let found = user::Entity::find()
        .filter(
            user::Column::Username
                .eq(&request.username)
                .or(user::Column::Email.eq(&request.username)),
        )
        .one(&state.db)
        .await
        .map_err(internal)?;

    let Some(found) = found else {
        return Err(unauthorized("Invalid credentials"));
    };

    if !found.is_active {
        return Err(unauthorized("Account is disabled"));
    }

    let valid = verify_password(&request.password, &found.password_hash).unwrap_or(false);
    if !valid {
        return Err(unauthorized("Invalid credentials"));
    }

    let token = create_token(found.id, &found.username, found.is_admin, &state.jwt_config)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            )
        })?;

    let mut active: user::ActiveModel = found.clone().into();
    active.last_login_at = Set(Some(Utc::now()));
    let found = active.update(&state.db).await.map_err(internal)?;

    tracing::info!(user_id = found.id, username = %found.username, "User logged in");

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_config.expiration_hours * 3600,
        user: UserDto::from_model(found),
    })))
}

/// Текущий пользователь
///
/// Возвращает профиль владельца токена.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Профиль пользователя", body = ApiResponse<UserDto>),
        (status = 401, description = "Токен отсутствует или недействителен")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    Extension(current): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserDto>>, (StatusCode, Json<ApiResponse<UserDto>>)> {
    let found = user::Entity::find_by_id(current.user_id)
        .one(&state.db)
        .await
        .map_err(internal)?
        .ok_or_else(|| unauthorized("Account no longer exists"))?;

    Ok(Json(ApiResponse::success(UserDto::from_model(found))))
}

fn internal<T>(e: sea_orm::DbErr) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(e.to_string())),
    )
}

fn unauthorized<T>(message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::UNAUTHORIZED, Json(ApiResponse::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
            full_name: "Alice Kumar".to_string(),
            phone: "9876543210".to_string(),
            address: "42 Park Avenue".to_string(),
            pin_code: "500001".to_string(),
        }
    }

    #[test]
    fn registration_validation() {
        assert!(validate_registration(&request()).is_ok());

        let mut bad = request();
        bad.username = "ab".to_string();
        assert!(validate_registration(&bad).is_err());

        bad = request();
        bad.email = "not-an-email".to_string();
        assert!(validate_registration(&bad).is_err());

        bad = request();
        bad.password = "12345".to_string();
        assert!(validate_registration(&bad).is_err());
    }
}
