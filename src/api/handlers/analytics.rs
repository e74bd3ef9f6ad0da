//! Admin analytics handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error_response;
use crate::api::dto::ApiResponse;
use crate::application::services::analytics::{OccupancyReport, RevenueBreakdown, RevenueReport};
use crate::application::services::AnalyticsService;

/// State for /api/v1/admin/analytics routes
#[derive(Clone)]
pub struct AnalyticsApiState {
    pub analytics: Arc<AnalyticsService>,
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Гранулярность отчёта по выручке
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PeriodParams {
    /// `day`, `week` или `month`. По умолчанию: `day`
    pub period: Option<String>,
}

/// Количество позиций в топе
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TopParams {
    /// Размер топа клиентов (по умолчанию 5)
    pub top: Option<u32>,
}

/// Выручка по периодам и парковкам
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics/revenue",
    tag = "Analytics",
    params(PeriodParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Отчёт по выручке", body = ApiResponse<RevenueReport>),
        (status = 403, description = "Требуются права администратора")
    )
)]
pub async fn revenue(
    State(state): State<AnalyticsApiState>,
    Query(params): Query<PeriodParams>,
) -> HandlerResult<RevenueReport> {
    let granularity = params.period.unwrap_or_else(|| "day".to_string());
    let report = state
        .analytics
        .revenue(&granularity)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(report)))
}

/// Детализация выручки
///
/// Разрезы по дню недели, длительности сессии и часу начала, плюс
/// топ клиентов по расходам.
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics/revenue-breakdown",
    tag = "Analytics",
    params(TopParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Детализация выручки", body = ApiResponse<RevenueBreakdown>)
    )
)]
pub async fn revenue_breakdown(
    State(state): State<AnalyticsApiState>,
    Query(params): Query<TopParams>,
) -> HandlerResult<RevenueBreakdown> {
    let breakdown = state
        .analytics
        .revenue_breakdown(params.top.unwrap_or(5))
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(breakdown)))
}

/// Текущая занятость парковок
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics/occupancy",
    tag = "Analytics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Занятость по парковкам", body = ApiResponse<OccupancyReport>)
    )
)]
pub async fn occupancy(State(state): State<AnalyticsApiState>) -> HandlerResult<OccupancyReport> {
    let report = state.analytics.occupancy().await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(report)))
}
