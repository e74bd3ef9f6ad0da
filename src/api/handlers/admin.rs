//! Admin API handlers: lot management, user administration and the
//! spot override operations.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error_response;
use super::user::with_locations;
use crate::api::dto::{
    ApiResponse, EmptyData, LotDto, PaginatedResponse, PaginationParams, ReservationDto, SpotDto,
    UserDto,
};
use crate::application::services::analytics::DashboardSummary;
use crate::application::services::{AnalyticsService, LotService, LotUpdate, NewLot, ReservationService};
use crate::domain::DomainError;
use crate::infrastructure::database::entities::{reservation, user};

/// State shared by every /api/v1/admin route
#[derive(Clone)]
pub struct AdminApiState {
    pub db: DatabaseConnection,
    pub reservations: Arc<ReservationService>,
    pub lots: Arc<LotService>,
    pub analytics: Arc<AnalyticsService>,
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Запрос на создание парковки
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Downtown Mall",
    "address": "123 Main Street",
    "pin_code": "500001",
    "total_spots": 20,
    "price_per_hour": 50.0
}))]
pub struct CreateLotRequest {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    /// Количество мест. Генерируются автоматически (A01..Ann)
    /// и не меняются после создания
    pub total_spots: i32,
    pub price_per_hour: f64,
}

/// Запрос на изменение парковки. `total_spots` изменить нельзя
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLotRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub price_per_hour: Option<f64>,
    pub is_active: Option<bool>,
}

/// Парковка со списком мест
#[derive(Debug, Serialize, ToSchema)]
pub struct LotDetail {
    pub lot: LotDto,
    pub spots: Vec<SpotDto>,
}

/// Результат принудительного освобождения места
#[derive(Debug, Serialize, ToSchema)]
pub struct ForceReleaseResponse {
    pub spot: SpotDto,
    /// Завершённое бронирование. null если место было занято без
    /// активного бронирования
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationDto>,
}

/// Параметры списка бронирований
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ReservationListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Фильтр по статусу: `reserved`, `active`, `completed`
    pub status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

/// Сводка для панели администратора
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Сводные показатели", body = ApiResponse<DashboardSummary>),
        (status = 403, description = "Требуются права администратора")
    )
)]
pub async fn admin_dashboard(State(state): State<AdminApiState>) -> HandlerResult<DashboardSummary> {
    let summary = state
        .analytics
        .dashboard_summary()
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Все парковки (включая неактивные)
#[utoipa::path(
    get,
    path = "/api/v1/admin/parking-lots",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список парковок", body = ApiResponse<Vec<LotDto>>)
    )
)]
pub async fn list_lots(State(state): State<AdminApiState>) -> HandlerResult<Vec<LotDto>> {
    let listing = state
        .lots
        .list_with_availability(false)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        listing
            .into_iter()
            .map(|l| LotDto::from_model(l.lot, l.available_spots, l.occupied_spots))
            .collect(),
    )))
}

/// Создать парковку
///
/// Места генерируются автоматически с номерами A01..Ann.
#[utoipa::path(
    post,
    path = "/api/v1/admin/parking-lots",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Парковка создана", body = ApiResponse<LotDto>),
        (status = 400, description = "Ошибка валидации")
    )
)]
pub async fn create_lot(
    State(state): State<AdminApiState>,
    Json(request): Json<CreateLotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotDto>>), (StatusCode, Json<ApiResponse<LotDto>>)> {
    let total_spots = request.total_spots;
    let lot = state
        .lots
        .create(NewLot {
            name: request.name,
            address: request.address,
            pin_code: request.pin_code,
            total_spots: request.total_spots,
            price_per_hour: request.price_per_hour,
        })
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LotDto::from_model(
            lot,
            total_spots as u64,
            0,
        ))),
    ))
}

/// Парковка со списком мест
#[utoipa::path(
    get,
    path = "/api/v1/admin/parking-lots/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID парковки")),
    responses(
        (status = 200, description = "Парковка и её места", body = ApiResponse<LotDetail>),
        (status = 404, description = "Парковка не найдена")
    )
)]
pub async fn get_lot(
    State(state): State<AdminApiState>,
    Path(id): Path<i32>,
) -> HandlerResult<LotDetail> {
    let lot = state.lots.get(id).await.map_err(error_response)?;
    let spots = state.lots.spots(id).await.map_err(error_response)?;

    let occupied = spots.iter().filter(|s| s.is_occupied).count() as u64;
    let available = spots
        .iter()
        .filter(|s| s.is_active && !s.is_occupied)
        .count() as u64;

    Ok(Json(ApiResponse::success(LotDetail {
        lot: LotDto::from_model(lot, available, occupied),
        spots: spots.into_iter().map(SpotDto::from_model).collect(),
    })))
}

/// Изменить парковку
#[utoipa::path(
    put,
    path = "/api/v1/admin/parking-lots/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID парковки")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Парковка обновлена", body = ApiResponse<LotDto>),
        (status = 404, description = "Парковка не найдена")
    )
)]
pub async fn update_lot(
    State(state): State<AdminApiState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLotRequest>,
) -> HandlerResult<LotDto> {
    let lot = state
        .lots
        .update(
            id,
            LotUpdate {
                name: request.name,
                address: request.address,
                pin_code: request.pin_code,
                price_per_hour: request.price_per_hour,
                is_active: request.is_active,
            },
        )
        .await
        .map_err(error_response)?;

    let spots = state.lots.spots(id).await.map_err(error_response)?;
    let occupied = spots.iter().filter(|s| s.is_occupied).count() as u64;
    let available = spots
        .iter()
        .filter(|s| s.is_active && !s.is_occupied)
        .count() as u64;

    Ok(Json(ApiResponse::success(LotDto::from_model(
        lot, available, occupied,
    ))))
}

/// Удалить парковку
///
/// Запрещено, пока на парковке есть занятые места или живые
/// бронирования.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/parking-lots/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID парковки")),
    responses(
        (status = 200, description = "Парковка удалена", body = ApiResponse<EmptyData>),
        (status = 400, description = "Есть занятые места или живые бронирования"),
        (status = 404, description = "Парковка не найдена")
    )
)]
pub async fn delete_lot(
    State(state): State<AdminApiState>,
    Path(id): Path<i32>,
) -> HandlerResult<EmptyData> {
    state.lots.delete(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}

/// Список пользователей
///
/// Только обычные аккаунты, без администраторов.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Пользователи с пагинацией", body = ApiResponse<PaginatedResponse<UserDto>>)
    )
)]
pub async fn list_users(
    State(state): State<AdminApiState>,
    Query(params): Query<PaginationParams>,
) -> HandlerResult<PaginatedResponse<UserDto>> {
    let (page, limit) = params.normalized();

    let query = user::Entity::find()
        .filter(user::Column::IsAdmin.eq(false))
        .order_by_asc(user::Column::Id);

    let total = query
        .clone()
        .count(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;

    let users = query
        .offset((page as u64 - 1) * limit as u64)
        .limit(limit as u64)
        .all(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        users.into_iter().map(UserDto::from_model).collect(),
        total,
        page,
        limit,
    ))))
}

/// Заблокировать / разблокировать пользователя
///
/// Деактивированный пользователь не может войти, его токены перестают
/// приниматься немедленно.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/toggle-status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID пользователя")),
    responses(
        (status = 200, description = "Статус переключён", body = ApiResponse<UserDto>),
        (status = 400, description = "Нельзя блокировать администратора"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn toggle_user_status(
    State(state): State<AdminApiState>,
    Path(id): Path<i32>,
) -> HandlerResult<UserDto> {
    let found = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or_else(|| error_response(DomainError::not_found("User", "id", id)))?;

    if found.is_admin {
        return Err(error_response(DomainError::Conflict(
            "Cannot change status of an admin account".to_string(),
        )));
    }

    let next = !found.is_active;
    let mut active: user::ActiveModel = found.into();
    active.is_active = Set(next);
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;

    tracing::info!(user_id = updated.id, is_active = updated.is_active, "User status toggled");
    Ok(Json(ApiResponse::success(UserDto::from_model(updated))))
}

/// Все бронирования
#[utoipa::path(
    get,
    path = "/api/v1/admin/reservations",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(ReservationListParams),
    responses(
        (status = 200, description = "Бронирования с пагинацией", body = ApiResponse<PaginatedResponse<ReservationDto>>)
    )
)]
pub async fn list_reservations(
    State(state): State<AdminApiState>,
    Query(params): Query<ReservationListParams>,
) -> HandlerResult<PaginatedResponse<ReservationDto>> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let mut query = reservation::Entity::find()
        .order_by_desc(reservation::Column::CreatedAt)
        .order_by_desc(reservation::Column::Id);
    if let Some(status) = &params.status {
        query = query.filter(reservation::Column::Status.eq(status.as_str()));
    }

    let total = query
        .clone()
        .count(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;

    let models = query
        .offset((page as u64 - 1) * limit as u64)
        .limit(limit as u64)
        .all(&state.db)
        .await
        .map_err(|e| error_response(e.into()))?;

    let items = with_locations(&state.db, models)
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Принудительно освободить место
///
/// Закрывает активное бронирование на месте (с расчётом стоимости).
/// Если активного бронирования нет, просто сбрасывает флаги занятости.
#[utoipa::path(
    post,
    path = "/api/v1/admin/spots/{spot_id}/force-release",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("spot_id" = i32, Path, description = "ID места")),
    responses(
        (status = 200, description = "Место освобождено", body = ApiResponse<ForceReleaseResponse>),
        (status = 404, description = "Место не найдено")
    )
)]
pub async fn force_release_spot(
    State(state): State<AdminApiState>,
    axum::Extension(current): axum::Extension<crate::auth::middleware::AuthenticatedUser>,
    Path(spot_id): Path<i32>,
) -> HandlerResult<ForceReleaseResponse> {
    let outcome = state
        .reservations
        .force_release(spot_id, current.user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(ForceReleaseResponse {
        spot: SpotDto::from_model(outcome.spot),
        reservation: outcome.reservation.map(ReservationDto::from_model),
    })))
}

/// Включить / выключить место
///
/// Занятое место выключить нельзя.
#[utoipa::path(
    post,
    path = "/api/v1/admin/spots/{spot_id}/toggle-active",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("spot_id" = i32, Path, description = "ID места")),
    responses(
        (status = 200, description = "Флаг переключён", body = ApiResponse<SpotDto>),
        (status = 400, description = "Место занято"),
        (status = 404, description = "Место не найдено")
    )
)]
pub async fn toggle_spot_active(
    State(state): State<AdminApiState>,
    Path(spot_id): Path<i32>,
) -> HandlerResult<SpotDto> {
    let spot = state
        .lots
        .toggle_spot_active(spot_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(SpotDto::from_model(spot))))
}
