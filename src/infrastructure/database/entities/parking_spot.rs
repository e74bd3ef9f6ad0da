//! Parking spot entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub lot_id: i32,

    /// Unique within the lot ("A01", "A02", ...)
    pub spot_number: String,

    pub is_occupied: bool,
    pub is_active: bool,

    /// Set only while occupied
    #[sea_orm(nullable)]
    pub vehicle_number: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_lot::Entity",
        from = "Column::LotId",
        to = "super::parking_lot::Column::Id"
    )]
    ParkingLot,

    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservations,
}

impl Related<super::parking_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingLot.def()
    }
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
