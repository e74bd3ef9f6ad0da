//! Reservation entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub spot_id: i32,
    pub vehicle_number: String,

    /// Reservation status: reserved, active, completed
    pub status: String,

    pub reservation_time: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub parking_start_time: Option<DateTime<Utc>>,

    #[sea_orm(nullable)]
    pub parking_end_time: Option<DateTime<Utc>>,

    /// Lot price snapshotted at reservation time; never re-read from the lot
    pub hourly_rate: f64,

    /// 0.0 until the session completes, immutable afterwards
    pub total_cost: f64,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::parking_spot::Entity",
        from = "Column::SpotId",
        to = "super::parking_spot::Column::Id"
    )]
    ParkingSpot,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::parking_spot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSpot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
