//! Entity DTOs shared by the user and admin handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CostBreakdown, ReservationStatus};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation, user};

/// Публичная информация о пользователе (без пароля)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    /// Уникальный ID пользователя (автоинкремент)
    pub id: i32,
    /// Имя пользователя (уникальное)
    pub username: String,
    /// Email (уникальный)
    pub email: String,
    /// Полное имя
    pub full_name: String,
    /// Телефон
    pub phone: String,
    /// Адрес
    pub address: String,
    /// Почтовый индекс
    pub pin_code: String,
    /// `true` для администратора
    pub is_admin: bool,
    /// `false` если аккаунт заблокирован администратором
    pub is_active: bool,
    /// Дата регистрации (UTC)
    pub created_at: DateTime<Utc>,
    /// Время последнего входа. null если пользователь ещё не входил
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserDto {
    pub fn from_model(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
            address: model.address,
            pin_code: model.pin_code,
            is_admin: model.is_admin,
            is_active: model.is_active,
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}

/// Парковка (лот) с текущей доступностью
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Downtown Mall",
    "address": "123 Main Street",
    "pin_code": "500001",
    "total_spots": 20,
    "price_per_hour": 50.0,
    "is_active": true,
    "available_spots": 17,
    "occupied_spots": 3
}))]
pub struct LotDto {
    /// Уникальный ID парковки
    pub id: i32,
    /// Название
    pub name: String,
    /// Адрес
    pub address: String,
    /// Почтовый индекс
    pub pin_code: String,
    /// Общее количество мест (фиксируется при создании)
    pub total_spots: i32,
    /// Цена за час
    pub price_per_hour: f64,
    /// `false` — парковка закрыта для новых бронирований
    pub is_active: bool,
    /// Свободные активные места
    pub available_spots: u64,
    /// Занятые места
    pub occupied_spots: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LotDto {
    pub fn from_model(model: parking_lot::Model, available: u64, occupied: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            pin_code: model.pin_code,
            total_spots: model.total_spots,
            price_per_hour: model.price_per_hour,
            is_active: model.is_active,
            available_spots: available,
            occupied_spots: occupied,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Парковочное место
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotDto {
    /// Уникальный ID места
    pub id: i32,
    /// ID парковки
    pub lot_id: i32,
    /// Номер места внутри парковки (A01, A02, ...)
    pub spot_number: String,
    /// `true` пока на месте стоит автомобиль
    pub is_occupied: bool,
    /// `false` — место выведено из оборота (ремонт и т.п.)
    pub is_active: bool,
    /// Номер автомобиля. null если место свободно
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
}

impl SpotDto {
    pub fn from_model(model: parking_spot::Model) -> Self {
        Self {
            id: model.id,
            lot_id: model.lot_id,
            spot_number: model.spot_number,
            is_occupied: model.is_occupied,
            is_active: model.is_active,
            vehicle_number: model.vehicle_number,
        }
    }
}

/// Бронирование парковочного места
///
/// Жизненный цикл: `reserved` → `active` (парковка началась) →
/// `completed` (оплата рассчитана, место освобождено).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    /// Уникальный ID бронирования
    pub id: i32,
    /// ID владельца
    pub user_id: i32,
    /// ID места
    pub spot_id: i32,
    /// Номер места. null если место уже удалено
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_number: Option<String>,
    /// ID парковки
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<i32>,
    /// Название парковки
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_name: Option<String>,
    /// Номер автомобиля
    pub vehicle_number: String,
    /// Статус: `reserved`, `active`, `completed`
    pub status: String,
    /// Время создания бронирования (UTC)
    pub reservation_time: DateTime<Utc>,
    /// Начало парковки. null пока статус `reserved`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_start_time: Option<DateTime<Utc>>,
    /// Конец парковки. null до завершения
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_end_time: Option<DateTime<Utc>>,
    /// Тариф, зафиксированный при бронировании
    pub hourly_rate: f64,
    /// Итоговая стоимость. 0 до завершения
    pub total_cost: f64,
    /// Детализация стоимости. Для завершённых сессий рассчитана по
    /// факту, для активных заполнена нулями
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_breakdown: Option<CostBreakdown>,
}

impl ReservationDto {
    pub fn from_model(model: reservation::Model) -> Self {
        let status = ReservationStatus::from_str(&model.status);
        let cost_breakdown = match (status, model.parking_start_time, model.parking_end_time) {
            (ReservationStatus::Completed, Some(start), Some(end)) => {
                Some(CostBreakdown::for_session(start, end, model.hourly_rate))
            }
            (ReservationStatus::Active, _, _) => Some(CostBreakdown::incomplete(model.hourly_rate)),
            _ => None,
        };
        Self {
            id: model.id,
            user_id: model.user_id,
            spot_id: model.spot_id,
            spot_number: None,
            lot_id: None,
            lot_name: None,
            vehicle_number: model.vehicle_number,
            status: model.status,
            reservation_time: model.reservation_time,
            parking_start_time: model.parking_start_time,
            parking_end_time: model.parking_end_time,
            hourly_rate: model.hourly_rate,
            total_cost: model.total_cost,
            cost_breakdown,
        }
    }

    pub fn with_location(mut self, spot: &parking_spot::Model, lot: &parking_lot::Model) -> Self {
        self.spot_number = Some(spot.spot_number.clone());
        self.lot_id = Some(lot.id);
        self.lot_name = Some(lot.name.clone());
        self
    }
}
