//! Health check endpoint

use std::sync::OnceLock;
use std::time::Instant;

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Record the process start time; call once at startup.
pub fn mark_started() {
    let _ = STARTED_AT.set(Instant::now());
}

/// Состояние сервиса
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Статус: `ok` — сервис работает нормально
    pub status: String,
    /// Версия сервиса (из Cargo.toml)
    pub version: String,
    /// Время работы сервиса в секундах с момента запуска
    pub uptime_seconds: u64,
}

/// Проверка состояния сервиса
///
/// Возвращает текущий статус, версию и время работы.
/// Не требует авторизации. Используйте для мониторинга доступности.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Сервис работает нормально", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    let uptime = STARTED_AT
        .get()
        .map(|t| t.elapsed().as_secs())
        .unwrap_or(0);
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}
