//! User-facing API handlers: lot discovery and the reservation
//! lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error_response;
use crate::api::dto::{ApiResponse, LotDto, PaginatedResponse, ReservationDto};
use crate::application::services::analytics::UserStatistics;
use crate::application::services::reservations::HistoryStats;
use crate::application::services::{AnalyticsService, HistoryFilter, LotService, ReservationService};
use crate::auth::middleware::AuthenticatedUser;
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};

/// State shared by every /api/v1/user route
#[derive(Clone)]
pub struct UserApiState {
    pub db: DatabaseConnection,
    pub reservations: Arc<ReservationService>,
    pub lots: Arc<LotService>,
    pub analytics: Arc<AnalyticsService>,
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Запрос на бронирование места
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "lot_id": 1,
    "vehicle_number": "KA01AB1234"
}))]
pub struct ReserveSpotRequest {
    /// ID парковки
    pub lot_id: i32,
    /// Номер автомобиля
    pub vehicle_number: String,
}

/// Результат завершения парковки
#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseResponse {
    /// Завершённое бронирование с детализацией стоимости
    pub reservation: ReservationDto,
    /// Итоговая стоимость
    pub total_cost: f64,
    /// Фактическая длительность в часах
    pub duration_hours: f64,
}

/// Сводка для личного кабинета пользователя
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDashboard {
    /// Личная статистика
    pub stats: UserStatistics,
    /// Текущее бронирование, если есть
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_reservation: Option<ReservationDto>,
    /// Доступные парковки
    pub parking_lots: Vec<LotDto>,
}

/// История парковок с агрегатами
#[derive(Debug, Serialize, ToSchema)]
pub struct ParkingHistoryResponse {
    pub history: PaginatedResponse<ReservationDto>,
    pub stats: HistoryStats,
}

/// Параметры фильтрации истории
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct HistoryParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Фильтр по статусу: `reserved`, `active`, `completed`
    pub status: Option<String>,
    /// Нижняя граница по времени создания (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Верхняя граница по времени создания (RFC 3339)
    pub to: Option<DateTime<Utc>>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

/// Load spot and lot names for a batch of reservations in two queries.
pub(crate) async fn with_locations(
    db: &DatabaseConnection,
    models: Vec<reservation::Model>,
) -> Result<Vec<ReservationDto>, sea_orm::DbErr> {
    let spots: HashMap<i32, parking_spot::Model> = parking_spot::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let lots: HashMap<i32, parking_lot::Model> = parking_lot::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let spot_id = model.spot_id;
            let dto = ReservationDto::from_model(model);
            match spots.get(&spot_id).and_then(|s| lots.get(&s.lot_id).map(|l| (s, l))) {
                Some((spot, lot)) => dto.with_location(spot, lot),
                None => dto,
            }
        })
        .collect())
}

/// Доступные парковки
///
/// Список активных парковок с количеством свободных мест.
#[utoipa::path(
    get,
    path = "/api/v1/user/parking-lots",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список парковок", body = ApiResponse<Vec<LotDto>>)
    )
)]
pub async fn list_parking_lots(State(state): State<UserApiState>) -> HandlerResult<Vec<LotDto>> {
    let listing = state
        .lots
        .list_with_availability(true)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(
        listing
            .into_iter()
            .map(|l| LotDto::from_model(l.lot, l.available_spots, l.occupied_spots))
            .collect(),
    )))
}

/// Забронировать место
///
/// Автоматически выбирает первое свободное место на парковке.
/// У пользователя может быть только одно живое бронирование.
#[utoipa::path(
    post,
    path = "/api/v1/user/reserve-spot",
    tag = "User",
    security(("bearer_auth" = [])),
    request_body = ReserveSpotRequest,
    responses(
        (status = 201, description = "Место забронировано", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Нет свободных мест или уже есть бронирование"),
        (status = 404, description = "Парковка не найдена или закрыта")
    )
)]
pub async fn reserve_spot(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
    Json(request): Json<ReserveSpotRequest>,
) -> Result<
    (StatusCode, Json<ApiResponse<ReservationDto>>),
    (StatusCode, Json<ApiResponse<ReservationDto>>),
> {
    let outcome = state
        .reservations
        .reserve(current.user_id, request.lot_id, &request.vehicle_number)
        .await
        .map_err(error_response)?;

    let dto =
        ReservationDto::from_model(outcome.reservation).with_location(&outcome.spot, &outcome.lot);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// Начать парковку
///
/// Переводит бронирование в статус `active`, место помечается занятым.
#[utoipa::path(
    post,
    path = "/api/v1/user/reservations/{id}/occupy",
    tag = "User",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID бронирования")),
    responses(
        (status = 200, description = "Парковка началась", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Бронирование не найдено")
    )
)]
pub async fn occupy_spot(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> HandlerResult<ReservationDto> {
    let outcome = state
        .reservations
        .occupy(id, current.user_id, current.is_admin)
        .await
        .map_err(error_response)?;

    let lot = state
        .lots
        .get(outcome.spot.lot_id)
        .await
        .map_err(error_response)?;
    let dto = ReservationDto::from_model(outcome.reservation).with_location(&outcome.spot, &lot);
    Ok(Json(ApiResponse::success(dto)))
}

/// Завершить парковку
///
/// Рассчитывает стоимость (минимум 1 час) и освобождает место.
#[utoipa::path(
    post,
    path = "/api/v1/user/reservations/{id}/release",
    tag = "User",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID бронирования")),
    responses(
        (status = 200, description = "Парковка завершена, стоимость рассчитана", body = ApiResponse<ReleaseResponse>),
        (status = 404, description = "Бронирование не найдено или уже завершено")
    )
)]
pub async fn release_spot(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> HandlerResult<ReleaseResponse> {
    let outcome = state
        .reservations
        .release(id, current.user_id, current.is_admin)
        .await
        .map_err(error_response)?;

    let lot = state
        .lots
        .get(outcome.spot.lot_id)
        .await
        .map_err(error_response)?;
    let dto = ReservationDto::from_model(outcome.reservation).with_location(&outcome.spot, &lot);

    Ok(Json(ApiResponse::success(ReleaseResponse {
        reservation: dto,
        total_cost: outcome.total_cost,
        duration_hours: outcome.duration_hours,
    })))
}

/// Текущее бронирование
///
/// Возвращает живое бронирование пользователя (active или reserved),
/// либо `data: null`, если его нет.
#[utoipa::path(
    get,
    path = "/api/v1/user/active-reservation",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Текущее бронирование или null", body = ApiResponse<Option<ReservationDto>>)
    )
)]
pub async fn active_reservation(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
) -> HandlerResult<Option<ReservationDto>> {
    let found = state
        .reservations
        .active_reservation(current.user_id)
        .await
        .map_err(error_response)?;

    let dto = found.map(|(model, spot, lot)| {
        ReservationDto::from_model(model).with_location(&spot, &lot)
    });
    Ok(Json(ApiResponse::success(dto)))
}

/// История парковок
///
/// Завершённые и текущие бронирования пользователя, новые сверху.
#[utoipa::path(
    get,
    path = "/api/v1/user/parking-history",
    tag = "User",
    security(("bearer_auth" = [])),
    params(HistoryParams),
    responses(
        (status = 200, description = "История с пагинацией", body = ApiResponse<ParkingHistoryResponse>)
    )
)]
pub async fn parking_history(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
    Query(params): Query<HistoryParams>,
) -> HandlerResult<ParkingHistoryResponse> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let filter = HistoryFilter {
        status: params.status,
        from_date: params.from,
        to_date: params.to,
    };

    let history = state
        .reservations
        .history(current.user_id, page, limit, &filter)
        .await
        .map_err(error_response)?;

    let items = with_locations(&state.db, history.reservations)
        .await
        .map_err(|e| error_response(e.into()))?;

    Ok(Json(ApiResponse::success(ParkingHistoryResponse {
        history: PaginatedResponse::new(items, history.total, page, limit),
        stats: history.stats,
    })))
}

/// Личная статистика
#[utoipa::path(
    get,
    path = "/api/v1/user/statistics",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Статистика пользователя", body = ApiResponse<UserStatistics>)
    )
)]
pub async fn user_statistics(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
) -> HandlerResult<UserStatistics> {
    let stats = state
        .analytics
        .user_statistics(current.user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Личный кабинет
///
/// Статистика, текущее бронирование и доступные парковки одним
/// запросом.
#[utoipa::path(
    get,
    path = "/api/v1/user/dashboard",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Сводка личного кабинета", body = ApiResponse<UserDashboard>)
    )
)]
pub async fn user_dashboard(
    State(state): State<UserApiState>,
    Extension(current): Extension<AuthenticatedUser>,
) -> HandlerResult<UserDashboard> {
    let stats = state
        .analytics
        .user_statistics(current.user_id)
        .await
        .map_err(error_response)?;

    let active = state
        .reservations
        .active_reservation(current.user_id)
        .await
        .map_err(error_response)?
        .map(|(model, spot, lot)| ReservationDto::from_model(model).with_location(&spot, &lot));

    let lots = state
        .lots
        .list_with_availability(true)
        .await
        .map_err(error_response)?
        .into_iter()
        .map(|l| LotDto::from_model(l.lot, l.available_spots, l.occupied_spots))
        .collect();

    Ok(Json(ApiResponse::success(UserDashboard {
        stats,
        active_reservation: active,
        parking_lots: lots,
    })))
}
